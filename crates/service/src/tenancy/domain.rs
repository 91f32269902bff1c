use chrono::{DateTime, Utc};
use models::errors::ModelError;
use models::partition::PartitionKey;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Tenant as seen by every caller outside the data layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub schema_name: PartitionKey,
    pub created_on: DateTime<Utc>,
}

impl TryFrom<models::tenant::Model> for TenantSummary {
    type Error = ModelError;

    fn try_from(m: models::tenant::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            name: m.name,
            schema_name: PartitionKey::parse(m.schema_name)?,
            created_on: m.created_at.with_timezone(&Utc),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: Uuid,
    pub hostname: String,
    pub tenant_id: Uuid,
    pub is_primary: bool,
}

impl From<models::domain::Model> for DomainRecord {
    fn from(m: models::domain::Model) -> Self {
        Self { id: m.id, hostname: m.domain, tenant_id: m.tenant_id, is_primary: m.is_primary }
    }
}

/// A tenant about to be created: name, derived key and primary hostname.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTenant {
    pub name: String,
    pub key: PartitionKey,
    pub hostname: String,
}

/// Outcome of resolving a request host.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedPartition {
    Public,
    Tenant(TenantSummary),
}

impl ResolvedPartition {
    pub fn tenant(&self) -> Option<&TenantSummary> {
        match self {
            ResolvedPartition::Public => None,
            ResolvedPartition::Tenant(t) => Some(t),
        }
    }
}
