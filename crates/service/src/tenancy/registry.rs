use std::sync::Arc;

use common::normalize_host;
use models::partition::PartitionKey;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{DomainRecord, NewTenant, TenantSummary};
use super::errors::TenancyError;
use super::repository::TenancyRepository;

/// Owns tenant and domain records.
pub struct TenantRegistry {
    repo: Arc<dyn TenancyRepository>,
    base_domain: String,
}

impl TenantRegistry {
    pub fn new(repo: Arc<dyn TenancyRepository>, base_domain: impl Into<String>) -> Self {
        Self { repo, base_domain: base_domain.into() }
    }

    pub fn from_config(repo: Arc<dyn TenancyRepository>, cfg: &configs::TenancyConfig) -> Self {
        Self::new(repo, cfg.base_domain.clone())
    }

    /// Derive partition key and primary hostname for an organization name.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::mock::MemoryStore;
    /// use service::tenancy::TenantRegistry;
    /// let registry = TenantRegistry::new(Arc::new(MemoryStore::default()), "localhost");
    /// let plan = registry.plan("Test Organization").unwrap();
    /// assert_eq!(plan.key.as_str(), "testorganization");
    /// assert_eq!(plan.hostname, "testorganization.localhost");
    /// ```
    pub fn plan(&self, organization: &str) -> Result<NewTenant, TenancyError> {
        let name = organization.trim();
        if name.is_empty() {
            return Err(TenancyError::Validation("organization name required".into()));
        }
        let key = PartitionKey::derive(name)?;
        let hostname = format!("{}.{}", key, self.base_domain);
        Ok(NewTenant { name: name.to_string(), key, hostname })
    }

    /// Conflict when the derived partition key is already in use.
    pub async fn ensure_available(&self, plan: &NewTenant) -> Result<(), TenancyError> {
        if self.repo.partition_taken(&plan.key).await? {
            return Err(TenancyError::Conflict(format!("organization `{}` is already registered", plan.name)));
        }
        Ok(())
    }

    /// Create a tenant with its partition and primary domain, and link `owner_id` to it.
    #[instrument(skip(self), fields(organization = %organization, owner_id = %owner_id))]
    pub async fn create_tenant(&self, organization: &str, owner_id: Uuid) -> Result<(TenantSummary, DomainRecord), TenancyError> {
        let plan = self.plan(organization)?;
        self.ensure_available(&plan).await?;
        let (tenant, domain) = self.repo.create_tenant(plan, owner_id).await?;
        info!(tenant_id = %tenant.id, partition = %tenant.schema_name, domain = %domain.hostname, "tenant_created");
        Ok((tenant, domain))
    }

    /// Add a routable hostname. A new primary replaces the previous one.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, is_primary))]
    pub async fn add_domain(&self, tenant_id: Uuid, hostname: &str, is_primary: bool) -> Result<DomainRecord, TenancyError> {
        let hostname = normalize_host(hostname);
        if self.repo.get_tenant(tenant_id).await?.is_none() {
            return Err(TenancyError::NotFound(format!("tenant {tenant_id}")));
        }
        let domain = self.repo.add_domain(tenant_id, &hostname, is_primary).await?;
        info!(domain = %domain.hostname, "domain_added");
        Ok(domain)
    }
}
