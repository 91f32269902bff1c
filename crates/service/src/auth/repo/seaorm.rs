use models::errors::ModelError;
use models::{tenant, user, user_credentials};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::warn;
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, NewAccount};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::tenancy::domain::{NewTenant, TenantSummary};

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

fn model_err(e: ModelError) -> AuthError {
    match e {
        ModelError::Validation(m) => AuthError::Validation(m),
        ModelError::Conflict(detail) => conflict_err(&detail),
        other => AuthError::Repository(other.to_string()),
    }
}

/// A concurrent registration can pass the service-level checks and still hit a
/// unique constraint; name the duplicated field from the constraint.
fn conflict_err(detail: &str) -> AuthError {
    warn!(%detail, "unique constraint hit during registration");
    if detail.contains("user_username_key") {
        AuthError::DuplicateUsername
    } else if detail.contains("user_email_key") {
        AuthError::DuplicateEmail
    } else {
        AuthError::Conflict("organization already exists".into())
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_id(&self.db, id).await.map_err(model_err)?.map(AuthUser::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_username(&self.db, username).await.map_err(model_err)?.map(AuthUser::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(user::find_by_email(&self.db, email).await.map_err(model_err)?.map(AuthUser::from))
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = user_credentials::find_by_user(&self.db, user_id).await.map_err(model_err)?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn register_account(&self, account: NewAccount, new_tenant: NewTenant) -> Result<(AuthUser, TenantSummary), AuthError> {
        let txn = self.db.begin().await.map_err(|e| AuthError::Repository(e.to_string()))?;
        let created = user::create(&txn, &user::NewUser {
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        })
        .await
        .map_err(model_err)?;
        user_credentials::upsert_password(&txn, created.id, account.password_hash, &account.password_algorithm)
            .await
            .map_err(model_err)?;
        let (t, _) = tenant::create_with_domain(&txn, &new_tenant.name, &new_tenant.key, &new_tenant.hostname, created.id)
            .await
            .map_err(model_err)?;
        // Dropping `txn` on any error above rolls everything back, schema included.
        txn.commit().await.map_err(|e| AuthError::Repository(e.to_string()))?;

        let tenant = TenantSummary::try_from(t).map_err(model_err)?;
        let mut user = AuthUser::from(created);
        user.tenant_id = Some(tenant.id);
        Ok((user, tenant))
    }
}
