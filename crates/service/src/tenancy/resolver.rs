use std::sync::Arc;

use common::normalize_host;
use tracing::debug;

use super::domain::ResolvedPartition;
use super::errors::TenancyError;
use super::repository::TenancyRepository;

/// Maps an inbound host to the partition that serves it.
pub struct TenantResolver {
    repo: Arc<dyn TenancyRepository>,
    public_path_prefixes: Vec<String>,
}

impl TenantResolver {
    pub fn new(repo: Arc<dyn TenancyRepository>, public_path_prefixes: Vec<String>) -> Self {
        Self { repo, public_path_prefixes }
    }

    pub fn from_config(repo: Arc<dyn TenancyRepository>, cfg: &configs::TenancyConfig) -> Self {
        Self::new(repo, cfg.public_path_prefixes.clone())
    }

    /// Login entry points are served from the public partition whatever the host.
    pub fn is_public_path(&self, path: &str) -> bool {
        self.public_path_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    /// Exact hostname lookup; unknown hosts fall back to the public partition.
    pub async fn resolve(&self, host: &str, path: &str) -> Result<ResolvedPartition, TenancyError> {
        if self.is_public_path(path) {
            return Ok(ResolvedPartition::Public);
        }
        let hostname = normalize_host(host);
        if hostname.is_empty() {
            return Ok(ResolvedPartition::Public);
        }
        match self.repo.find_by_hostname(&hostname).await? {
            Some(tenant) => Ok(ResolvedPartition::Tenant(tenant)),
            None => {
                debug!(host = %hostname, "no tenant for host");
                Ok(ResolvedPartition::Public)
            }
        }
    }
}
