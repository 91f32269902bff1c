use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("partition provisioning failed: {0}")]
    Partition(String),
    #[error("database error: {0}")]
    Db(String),
}

impl ModelError {
    /// Map a driver error, surfacing unique-constraint violations as [`ModelError::Conflict`].
    pub fn from_db(e: DbErr) -> Self {
        match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => ModelError::Conflict(detail),
            _ => ModelError::Db(e.to_string()),
        }
    }
}
