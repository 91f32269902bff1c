use thiserror::Error;

use crate::tenancy::errors::TenancyError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("username already exists")]
    DuplicateUsername,
    #[error("email already in use")]
    DuplicateEmail,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::PasswordMismatch => 1002,
            AuthError::DuplicateUsername => 1003,
            AuthError::DuplicateEmail => 1004,
            AuthError::Conflict(_) => 1005,
            AuthError::InvalidCredentials => 1006,
            AuthError::Unauthenticated => 1007,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }

    /// Whether the message is safe to show to the caller as is.
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_))
    }

    /// Message for response bodies; internal failures collapse to a generic text.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Validation(m) => m.clone(),
            AuthError::Conflict(m) => m.clone(),
            e if e.is_internal() => "internal error, please try again later".to_string(),
            e => e.to_string(),
        }
    }
}

impl From<TenancyError> for AuthError {
    fn from(e: TenancyError) -> Self {
        match e {
            TenancyError::Validation(m) => AuthError::Validation(m),
            TenancyError::Conflict(m) => AuthError::Conflict(m),
            other => AuthError::Repository(other.to_string()),
        }
    }
}
