use models::errors::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Stable numeric code for logs.
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 3001,
            ServiceError::NotFound(_) => 3003,
            ServiceError::Db(_) => 3200,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(m) => ServiceError::Validation(m),
            ModelError::NotFound(m) => ServiceError::NotFound(m),
            other => ServiceError::Db(other.to_string()),
        }
    }
}
