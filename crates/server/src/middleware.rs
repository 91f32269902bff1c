use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use common::normalize_host;
use models::partition::PartitionKey;
use service::auth::errors::AuthError;
use service::auth::validator::Identity;
use service::tenancy::domain::ResolvedPartition;
use tracing::{debug, error, warn};

use crate::errors::ApiError;
use crate::observability::BEARER_REJECTED_TOTAL;
use crate::state::ServerState;

pub const TENANT_SCHEMA_HEADER: &str = "x-tenant-schema";
pub const TENANT_HOST_HEADER: &str = "x-tenant-host";

/// Per-request routing decision, stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub host: String,
    pub resolved: ResolvedPartition,
}

fn request_host(req: &Request) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default()
        .to_string()
}

/// Resolve the host to a partition before any handler runs, and tag the
/// response with the tenant it was served for.
pub async fn resolve_tenant(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let host = request_host(&req);
    let resolved = state.resolver.resolve(&host, req.uri().path()).await.map_err(|e| {
        error!(code = e.code(), error = %e, host = %host, "tenant resolution failed");
        ApiError::Internal
    })?;
    let ctx = RequestContext { host: normalize_host(&host), resolved };
    if let Some(t) = ctx.resolved.tenant() {
        debug!(partition = %t.schema_name, host = %ctx.host, "request routed to tenant");
    }
    req.extensions_mut().insert(ctx.clone());

    let mut resp = next.run(req).await;
    if let Some(t) = ctx.resolved.tenant() {
        let headers = resp.headers_mut();
        if let Ok(v) = HeaderValue::from_str(t.schema_name.as_str()) {
            headers.insert(TENANT_SCHEMA_HEADER, v);
        }
        if let Ok(v) = HeaderValue::from_str(&ctx.host) {
            headers.insert(TENANT_HOST_HEADER, v);
        }
    }
    Ok(resp)
}

/// Require `Authorization: Bearer <token>` and expose the caller as an [`Identity`] extension.
pub async fn require_bearer(State(state): State<ServerState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    match state.validator.validate(header.as_deref()).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(AuthError::Unauthenticated) => {
            BEARER_REJECTED_TOTAL.inc();
            warn!(path = %req.uri().path(), "bearer authentication failed");
            Err(ApiError::unauthenticated())
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "bearer validation failed");
            Err(ApiError::Internal)
        }
    }
}

/// The tenant partition a business request runs in.
///
/// The caller must have a tenant. A tenant host must be the caller's own
/// tenant; a public host falls back to it.
#[derive(Debug, Clone)]
pub struct TenantScope(pub PartitionKey);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TenantScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts.extensions.get::<Identity>().ok_or_else(ApiError::unauthenticated)?;
        let own = identity
            .require_tenant()
            .map_err(|_| ApiError::Unauthorized("user has no tenant".into()))?;
        match parts.extensions.get::<RequestContext>().map(|c| &c.resolved) {
            Some(ResolvedPartition::Tenant(host_tenant)) if host_tenant.id != own.id => {
                warn!(user_id = %identity.user.id, host_tenant = %host_tenant.schema_name, "tenant mismatch");
                Err(ApiError::Unauthorized("tenant mismatch".into()))
            }
            _ => Ok(TenantScope(own.schema_name.clone())),
        }
    }
}
