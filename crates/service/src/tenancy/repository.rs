use async_trait::async_trait;
use models::partition::PartitionKey;
use uuid::Uuid;

use super::domain::{DomainRecord, NewTenant, TenantSummary};
use super::errors::TenancyError;

/// Persistence for tenants and their domains. Everything here lives in the
/// public partition.
#[async_trait]
pub trait TenancyRepository: Send + Sync {
    /// Exact hostname match.
    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<TenantSummary>, TenancyError>;
    async fn get_tenant(&self, id: Uuid) -> Result<Option<TenantSummary>, TenancyError>;
    async fn primary_domain(&self, tenant_id: Uuid) -> Result<Option<DomainRecord>, TenancyError>;
    /// True when a tenant record or a schema already uses `key`.
    async fn partition_taken(&self, key: &PartitionKey) -> Result<bool, TenancyError>;
    /// Provision the partition, insert tenant and primary domain, link the owner. All or nothing.
    async fn create_tenant(&self, tenant: NewTenant, owner_id: Uuid) -> Result<(TenantSummary, DomainRecord), TenancyError>;
    async fn add_domain(&self, tenant_id: Uuid, hostname: &str, is_primary: bool) -> Result<DomainRecord, TenancyError>;
}
