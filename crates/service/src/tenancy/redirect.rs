use std::sync::Arc;

use uuid::Uuid;

use super::errors::TenancyError;
use super::repository::TenancyRepository;

/// Builds the entry URL of a user's tenant from its primary domain.
pub struct RedirectResolver {
    repo: Arc<dyn TenancyRepository>,
    scheme: String,
    port: u16,
    login_path: String,
}

impl RedirectResolver {
    pub fn new(repo: Arc<dyn TenancyRepository>, scheme: impl Into<String>, port: u16, login_path: impl Into<String>) -> Self {
        Self { repo, scheme: scheme.into(), port, login_path: login_path.into() }
    }

    pub fn from_config(repo: Arc<dyn TenancyRepository>, cfg: &configs::TenancyConfig) -> Self {
        Self::new(repo, cfg.redirect_scheme.clone(), cfg.redirect_port, cfg.login_path.clone())
    }

    pub fn login_path(&self) -> &str { &self.login_path }

    /// `{scheme}://{primary}:{port}/` for authenticated callers, the tenant's
    /// login page otherwise. Without a tenant or a primary domain this is the
    /// generic login path.
    pub async fn redirect_url(&self, tenant_id: Option<Uuid>, authenticated: bool) -> Result<String, TenancyError> {
        let Some(tenant_id) = tenant_id else {
            return Ok(self.login_path.clone());
        };
        let Some(primary) = self.repo.primary_domain(tenant_id).await? else {
            return Ok(self.login_path.clone());
        };
        let path = if authenticated { "/" } else { self.login_path.as_str() };
        Ok(format!("{}://{}:{}{}", self.scheme, primary.hostname, self.port, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MemoryStore;
    use crate::tenancy::TenantRegistry;

    #[tokio::test]
    async fn urls_follow_primary_domain() {
        let store = Arc::new(MemoryStore::default());
        let owner = store.seed_user("alice", "alice@example.com");
        let (tenant, _) = TenantRegistry::new(store.clone(), "localhost")
            .create_tenant("Test Organization", owner.id)
            .await
            .unwrap();
        let redirects = RedirectResolver::new(store, "http", 8000, "/auth/login/");
        assert_eq!(
            redirects.redirect_url(Some(tenant.id), true).await.unwrap(),
            "http://testorganization.localhost:8000/"
        );
        assert_eq!(
            redirects.redirect_url(Some(tenant.id), false).await.unwrap(),
            "http://testorganization.localhost:8000/auth/login/"
        );
    }

    #[tokio::test]
    async fn missing_tenant_or_primary_falls_back_to_login() {
        let redirects = RedirectResolver::new(Arc::new(MemoryStore::default()), "http", 8000, "/auth/login/");
        assert_eq!(redirects.redirect_url(None, true).await.unwrap(), "/auth/login/");
        assert_eq!(redirects.redirect_url(Some(Uuid::new_v4()), true).await.unwrap(), "/auth/login/");
    }
}
