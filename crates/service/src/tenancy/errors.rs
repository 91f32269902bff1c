use models::errors::ModelError;
use thiserror::Error;

/// Business errors for tenant bookkeeping
#[derive(Debug, Error)]
pub enum TenancyError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("partition provisioning failed: {0}")]
    PartitionProvisioning(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl TenancyError {
    pub fn code(&self) -> u16 {
        match self {
            TenancyError::Validation(_) => 2001,
            TenancyError::Conflict(_) => 2002,
            TenancyError::NotFound(_) => 2003,
            TenancyError::PartitionProvisioning(_) => 2101,
            TenancyError::Repository(_) => 2200,
        }
    }
}

impl From<ModelError> for TenancyError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(m) => TenancyError::Validation(m),
            ModelError::Conflict(m) => TenancyError::Conflict(m),
            ModelError::NotFound(m) => TenancyError::NotFound(m),
            ModelError::Partition(m) => TenancyError::PartitionProvisioning(m),
            ModelError::Db(m) => TenancyError::Repository(m),
        }
    }
}
