use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{RegisterInput, LoginInput, AuthSession, NewAccount};
use super::errors::AuthError;
use super::repository::AuthRepository;
use crate::tenancy::{RedirectResolver, TenantRegistry, repository::TenancyRepository};

/// Argon2 hash of a throwaway password, checked when the user or its
/// credentials are missing so that every failed login costs one verification.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"taskhub-unused-password", &salt)
        .ok()
        .map(|h| h.to_string())
});

fn verify_against_dummy(password: &str) {
    if let Some(parsed) = DUMMY_HASH.as_deref().and_then(|h| PasswordHash::new(h).ok()) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub password_algorithm: String,
}

impl Default for AuthConfig {
    fn default() -> Self { Self { password_algorithm: "argon2".into() } }
}

/// Auth business service independent of web framework
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    tenants: Arc<dyn TenancyRepository>,
    registry: Arc<TenantRegistry>,
    redirects: Arc<RedirectResolver>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(
        repo: Arc<dyn AuthRepository>,
        tenants: Arc<dyn TenancyRepository>,
        registry: Arc<TenantRegistry>,
        redirects: Arc<RedirectResolver>,
        cfg: AuthConfig,
    ) -> Self {
        Self { repo, tenants, registry, redirects, cfg }
    }

    /// Register a user together with a new tenant for their organization.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::auth::{service::{AuthService, AuthConfig}, domain::RegisterInput};
    /// use service::mock::MemoryStore;
    /// use service::tenancy::{RedirectResolver, TenantRegistry};
    /// let store = Arc::new(MemoryStore::default());
    /// let svc = AuthService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     Arc::new(TenantRegistry::new(store.clone(), "localhost")),
    ///     Arc::new(RedirectResolver::new(store.clone(), "http", 8000, "/auth/login/")),
    ///     AuthConfig::default(),
    /// );
    /// let input = RegisterInput {
    ///     username: "alice".into(), email: "alice@example.com".into(),
    ///     password: "Secret123".into(), password_confirm: "Secret123".into(),
    ///     organization: "Test Organization".into(), first_name: String::new(), last_name: String::new(),
    /// };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.tenant.unwrap().schema_name.as_str(), "testorganization");
    /// assert_eq!(session.redirect_url.as_deref(), Some("http://testorganization.localhost:8000/"));
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username, organization = %input.organization))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        if input.password != input.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        models::user::validate_username(&input.username).map_err(|e| AuthError::Validation(e.to_string()))?;
        models::user::validate_email(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if self.repo.find_user_by_username(&input.username).await?.is_some() {
            debug!("username taken");
            return Err(AuthError::DuplicateUsername);
        }
        if self.repo.find_user_by_email(&input.email).await?.is_some() {
            debug!("email taken");
            return Err(AuthError::DuplicateEmail);
        }

        let plan = self.registry.plan(&input.organization)?;
        self.registry.ensure_available(&plan).await?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        let account = NewAccount {
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            password_hash: hash,
            password_algorithm: self.cfg.password_algorithm.clone(),
        };
        let (user, tenant) = self.repo.register_account(account, plan).await?;
        let redirect_url = self.redirects.redirect_url(Some(tenant.id), true).await?;
        info!(user_id = %user.id, tenant_id = %tenant.id, partition = %tenant.schema_name, "user_registered");
        Ok(AuthSession { user, tenant: Some(tenant), redirect_url: Some(redirect_url) })
    }

    /// Verify a username/password pair against the public partition.
    ///
    /// Unknown user and wrong password both yield [`AuthError::InvalidCredentials`].
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let Some(user) = self.repo.find_user_by_username(&input.username).await? else {
            verify_against_dummy(&input.password);
            return Err(AuthError::InvalidCredentials);
        };
        let Some(cred) = self.repo.get_credentials(user.id).await? else {
            verify_against_dummy(&input.password);
            return Err(AuthError::InvalidCredentials);
        };

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.session_for(user).await?;
        info!(user_id = %session.user.id, has_tenant = session.tenant.is_some(), "user_logged_in");
        Ok(session)
    }

    /// Attach tenant and redirect target to a known user.
    pub async fn session_for(&self, user: super::domain::AuthUser) -> Result<AuthSession, AuthError> {
        let tenant = match user.tenant_id {
            Some(id) => self.tenants.get_tenant(id).await?,
            None => None,
        };
        let redirect_url = match &tenant {
            Some(t) => Some(self.redirects.redirect_url(Some(t.id), true).await?),
            None => None,
        };
        Ok(AuthSession { user, tenant, redirect_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> AuthService {
        AuthService::new(
            store.clone(),
            store.clone(),
            Arc::new(TenantRegistry::new(store.clone(), "localhost")),
            Arc::new(RedirectResolver::new(store.clone(), "http", 8000, "/auth/login/")),
            AuthConfig::default(),
        )
    }

    fn input(username: &str, email: &str, org: &str) -> RegisterInput {
        RegisterInput {
            username: username.into(),
            email: email.into(),
            password: "Passw0rd!".into(),
            password_confirm: "Passw0rd!".into(),
            organization: org.into(),
            first_name: "Ada".into(),
            last_name: String::new(),
        }
    }

    #[tokio::test]
    async fn register_derives_partition_and_domain() {
        let store = Arc::new(MemoryStore::default());
        let session = service(&store).register(input("alice", "alice@example.com", "Test Organization")).await.unwrap();
        let tenant = session.tenant.unwrap();
        assert_eq!(tenant.schema_name.as_str(), "testorganization");
        assert_eq!(store.primary_of(tenant.id).unwrap().hostname, "testorganization.localhost");
        assert_eq!(session.user.tenant_id, Some(tenant.id));
        assert_eq!(session.user.first_name, "Ada");
    }

    #[tokio::test]
    async fn duplicate_username_creates_no_second_tenant() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        svc.register(input("alice", "alice@example.com", "Org One")).await.unwrap();
        let err = svc.register(input("alice", "other@example.com", "Org Two")).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateUsername));
        assert_eq!(store.tenant_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        svc.register(input("alice", "alice@example.com", "Org One")).await.unwrap();
        let err = svc.register(input("bob", "alice@example.com", "Org Two")).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[tokio::test]
    async fn password_mismatch_creates_nothing() {
        let store = Arc::new(MemoryStore::default());
        let mut i = input("alice", "alice@example.com", "Org");
        i.password_confirm = "different".into();
        let err = service(&store).register(i).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.tenant_count(), 0);
    }

    #[tokio::test]
    async fn taken_organization_is_conflict() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        svc.register(input("alice", "alice@example.com", "Acme")).await.unwrap();
        let err = svc.register(input("bob", "bob@example.com", "ACME")).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));
        assert_eq!(store.user_count(), 1);
    }

    #[tokio::test]
    async fn failed_bootstrap_leaves_no_user() {
        let store = Arc::new(MemoryStore::default());
        store.fail_next_registration();
        let err = service(&store).register(input("alice", "alice@example.com", "Acme")).await.unwrap_err();
        assert!(err.is_internal());
        assert_eq!(store.user_count(), 0);
        assert_eq!(store.tenant_count(), 0);
    }

    #[tokio::test]
    async fn login_success_and_generic_failures() {
        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        svc.register(input("alice", "alice@example.com", "Acme")).await.unwrap();

        let ok = svc.login(LoginInput { username: "alice".into(), password: "Passw0rd!".into() }).await.unwrap();
        assert_eq!(ok.redirect_url.as_deref(), Some("http://acme.localhost:8000/"));

        let wrong_pw = svc.login(LoginInput { username: "alice".into(), password: "nope".into() }).await.unwrap_err();
        let no_user = svc.login(LoginInput { username: "mallory".into(), password: "Passw0rd!".into() }).await.unwrap_err();
        assert!(matches!(wrong_pw, AuthError::InvalidCredentials));
        assert_eq!(wrong_pw.public_message(), no_user.public_message());
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        let hash = DUMMY_HASH.as_deref().expect("dummy hash");
        let parsed = PasswordHash::new(hash).expect("parse");
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(Argon2::default().verify_password(b"Passw0rd!", &parsed).is_err());
    }

    #[tokio::test]
    async fn unknown_user_costs_as_much_as_wrong_password() {
        use std::time::{Duration, Instant};

        let store = Arc::new(MemoryStore::default());
        let svc = service(&store);
        svc.register(input("alice", "alice@example.com", "Acme")).await.unwrap();
        let bare = store.seed_user("nocreds", "nocreds@example.com");

        async fn timed(svc: &AuthService, username: &str) -> Duration {
            let start = Instant::now();
            for _ in 0..3 {
                let err = svc
                    .login(LoginInput { username: username.into(), password: "wrong-password".into() })
                    .await
                    .unwrap_err();
                assert!(matches!(err, AuthError::InvalidCredentials));
            }
            start.elapsed()
        }

        // first call builds the dummy hash
        timed(&svc, "ghost").await;
        let wrong_pw = timed(&svc, "alice").await;
        let unknown = timed(&svc, "ghost").await;
        let no_creds = timed(&svc, &bare.username).await;
        assert!(unknown * 4 >= wrong_pw, "unknown user {unknown:?} vs wrong password {wrong_pw:?}");
        assert!(no_creds * 4 >= wrong_pw, "missing credentials {no_creds:?} vs wrong password {wrong_pw:?}");
    }

    #[tokio::test]
    async fn tenantless_user_has_no_redirect() {
        let store = Arc::new(MemoryStore::default());
        let user = store.seed_user("loner", "loner@example.com");
        let session = service(&store).session_for(user).await.unwrap();
        assert!(session.tenant.is_none());
        assert!(session.redirect_url.is_none());
    }
}
