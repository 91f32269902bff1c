use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewAccount};
use super::errors::AuthError;
use crate::tenancy::domain::{NewTenant, TenantSummary};

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;

    /// Create user, credentials, tenant partition, tenant, primary domain and
    /// the user-tenant link as one unit. Nothing persists on failure.
    async fn register_account(&self, account: NewAccount, tenant: NewTenant) -> Result<(AuthUser, TenantSummary), AuthError>;
}
