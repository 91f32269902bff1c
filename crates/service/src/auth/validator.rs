use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::TokenCodec;
use crate::tenancy::{domain::TenantSummary, repository::TenancyRepository};

const BEARER_PREFIX: &str = "Bearer ";

/// A caller resolved back to a user row.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user: AuthUser,
    pub tenant: Option<TenantSummary>,
}

impl Identity {
    /// Business endpoints only serve users that completed tenant bootstrap.
    pub fn require_tenant(&self) -> Result<&TenantSummary, AuthError> {
        self.tenant.as_ref().ok_or(AuthError::Unauthenticated)
    }
}

/// Turns an `Authorization` header (or a session's user id) into an [`Identity`].
pub struct SessionValidator {
    codec: Arc<TokenCodec>,
    users: Arc<dyn AuthRepository>,
    tenants: Arc<dyn TenancyRepository>,
}

impl SessionValidator {
    pub fn new(codec: Arc<TokenCodec>, users: Arc<dyn AuthRepository>, tenants: Arc<dyn TenancyRepository>) -> Self {
        Self { codec, users, tenants }
    }

    /// Missing prefix, bad signature, expiry and unknown users all come back
    /// as [`AuthError::Unauthenticated`]. Only storage failures differ.
    pub async fn validate(&self, header: Option<&str>) -> Result<Identity, AuthError> {
        let token = header
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::Unauthenticated)?;
        let claims = self.codec.verify(token).map_err(|e| {
            debug!(error = %e, "bearer token rejected");
            AuthError::Unauthenticated
        })?;
        self.identify(claims.user_id).await
    }

    /// Load the user and its tenant from the public partition.
    pub async fn identify(&self, user_id: Uuid) -> Result<Identity, AuthError> {
        let user = self.users.find_user_by_id(user_id).await?.ok_or(AuthError::Unauthenticated)?;
        let tenant = match user.tenant_id {
            Some(id) => self.tenants.get_tenant(id).await?,
            None => None,
        };
        Ok(Identity { user, tenant })
    }
}
