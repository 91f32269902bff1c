pub mod auth;
pub mod projects;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::{OpenApi, ToSchema};

use common::types::Health;

use crate::middleware::{require_bearer, resolve_tenant};
use crate::observability;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// `{success, message}` acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}

/// Build the full application router: public and auth routes, plus
/// bearer-protected tenant routes. Every request is tenant-resolved first.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(observability::metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    // Both transports answer credential failures in the body
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/login-jwt", post(auth::login_jwt))
        .route("/auth/register", post(auth::register))
        .route("/auth/register-jwt", post(auth::register_jwt))
        .route("/auth/check-auth", get(auth::check_auth))
        .route("/auth/check-auth-jwt", get(auth::check_auth_jwt))
        .route("/auth/tenant-info", get(auth::tenant_info))
        .route("/auth/tenant-info-jwt", get(auth::tenant_info_jwt))
        .route("/auth/profile", get(auth::profile))
        .route("/auth/profile-jwt", get(auth::profile_jwt))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/logout-jwt", post(auth::logout_jwt));

    let protected = Router::new()
        .route("/auth/validate-tenant-access", post(auth::validate_tenant_access))
        .route("/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:id",
            get(projects::get).put(projects::update).delete(projects::delete),
        )
        .route("/projects/:id/tasks", get(projects::list_tasks).post(projects::create_task))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    public
        .merge(auth_routes)
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), resolve_tenant))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
