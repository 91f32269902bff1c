//! Credential endpoints. Two parallel families: cookie sessions (`/auth/login`,
//! ...) and bearer tokens (`/auth/login-jwt`, ...). Credential and validation
//! failures answer 200 with `{success:false, message}`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use service::auth::domain::{AuthSession, AuthUser, LoginInput, RegisterInput};
use service::auth::errors::AuthError;
use service::auth::validator::Identity;
use service::tenancy::domain::{ResolvedPartition, TenantSummary};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::observability::{LOGIN_ATTEMPTS_TOTAL, LOGIN_FAILURES_TOTAL, REGISTRATIONS_TOTAL, REGISTRATION_FAILURES_TOTAL};
use crate::routes::MessageResponse;
use crate::session::{expired_session_cookie, session_cookie, SESSION_COOKIE};
use crate::state::ServerState;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tenant: Option<TenantSummary>,
}

impl UserView {
    fn new(user: AuthUser, tenant: Option<TenantSummary>) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            tenant,
        }
    }
}

impl From<Identity> for UserView {
    fn from(i: Identity) -> Self { Self::new(i.user, i.tenant) }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl AuthResponse {
    fn success(message: &str, session: AuthSession) -> Self {
        Self {
            success: true,
            message: message.into(),
            redirect_url: session.redirect_url,
            user: Some(UserView::new(session.user, session.tenant)),
        }
    }

    fn failure(message: String) -> Self {
        Self { success: false, message, user: None, redirect_url: None }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

impl TokenResponse {
    fn failure(message: String) -> Self {
        Self { success: false, message, access_token: None, token_type: None, expires_in: None, user: None, redirect_url: None }
    }
}

/// Tenant summary plus the tenant's entry URL.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TenantInfoView {
    pub id: Uuid,
    pub name: String,
    pub schema_name: String,
    pub created_on: chrono::DateTime<chrono::Utc>,
    pub redirect_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckAuthResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_info: Option<TenantInfoView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TenantInfoResponse {
    pub has_tenant: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<TenantInfoView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateTenantAccessRequest {
    pub tenant_id: Uuid,
    pub domain: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateTenantAccessResponse {
    pub valid: bool,
}

fn failure_message(e: &AuthError, action: &'static str) -> String {
    if e.is_internal() {
        error!(code = e.code(), error = %e, action, "auth request failed");
    } else {
        info!(code = e.code(), reason = %e, action, "auth request rejected");
    }
    e.public_message()
}

fn storage_failure(e: AuthError) -> ApiError {
    error!(code = e.code(), error = %e, "identity lookup failed");
    ApiError::Internal
}

fn optional_identity(res: Result<Identity, AuthError>) -> Result<Option<Identity>, ApiError> {
    match res {
        Ok(identity) => Ok(Some(identity)),
        Err(AuthError::Unauthenticated) => Ok(None),
        Err(e) => Err(storage_failure(e)),
    }
}

async fn session_identity(state: &ServerState, jar: &CookieJar) -> Result<Option<Identity>, ApiError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else { return Ok(None) };
    let Some(user_id) = state.sessions.user_id(cookie.value()).await else { return Ok(None) };
    optional_identity(state.validator.identify(user_id).await)
}

async fn bearer_identity(state: &ServerState, headers: &HeaderMap) -> Result<Option<Identity>, ApiError> {
    let header = headers.get(axum::http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    optional_identity(state.validator.validate(header).await)
}

async fn tenant_info_view(state: &ServerState, tenant: TenantSummary) -> Result<TenantInfoView, ApiError> {
    let redirect_url = state.redirects.redirect_url(Some(tenant.id), true).await.map_err(|e| {
        error!(code = e.code(), error = %e, "redirect lookup failed");
        ApiError::Internal
    })?;
    Ok(TenantInfoView {
        id: tenant.id,
        name: tenant.name,
        schema_name: tenant.schema_name.to_string(),
        created_on: tenant.created_on,
        redirect_url,
    })
}

async fn check_auth_body(state: &ServerState, identity: Option<Identity>) -> Result<CheckAuthResponse, ApiError> {
    let Some(identity) = identity else {
        return Ok(CheckAuthResponse { is_authenticated: false, user: None, tenant_info: None });
    };
    let tenant_info = match identity.tenant.clone() {
        Some(t) => Some(tenant_info_view(state, t).await?),
        None => None,
    };
    Ok(CheckAuthResponse { is_authenticated: true, user: Some(identity.into()), tenant_info })
}

async fn tenant_info_body(state: &ServerState, identity: Option<Identity>) -> Result<TenantInfoResponse, ApiError> {
    let identity = identity.ok_or_else(ApiError::unauthenticated)?;
    match identity.tenant {
        Some(t) => Ok(TenantInfoResponse { has_tenant: true, tenant: Some(tenant_info_view(state, t).await?), message: None }),
        None => Ok(TenantInfoResponse {
            has_tenant: false,
            tenant: None,
            message: Some("user has no tenant".into()),
        }),
    }
}

async fn start_session(state: &ServerState, jar: CookieJar, user_id: Uuid) -> CookieJar {
    if let Some(old) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(old.value()).await;
    }
    let sid = state.sessions.create(user_id).await;
    jar.add(session_cookie(sid))
}

fn token_success(state: &ServerState, message: &str, session: AuthSession) -> TokenResponse {
    match state.codec.issue(&session.user, session.tenant.as_ref()) {
        Ok(token) => TokenResponse {
            success: true,
            message: message.into(),
            access_token: Some(token),
            token_type: Some("bearer".into()),
            expires_in: Some(state.codec.lifetime_secs()),
            redirect_url: session.redirect_url,
            user: Some(UserView::new(session.user, session.tenant)),
        },
        Err(e) => TokenResponse::failure(failure_message(&e, "issue_token")),
    }
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Outcome; sets the session cookie on success", body = AuthResponse)))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, payload: Result<Json<LoginInput>, JsonRejection>) -> (CookieJar, Json<AuthResponse>) {
    LOGIN_ATTEMPTS_TOTAL.inc();
    let input = match payload {
        Ok(Json(input)) => input,
        Err(r) => {
            LOGIN_FAILURES_TOTAL.inc();
            return (jar, Json(AuthResponse::failure(r.body_text())));
        }
    };
    match state.auth.login(input).await {
        Ok(session) => {
            let jar = start_session(&state, jar, session.user.id).await;
            (jar, Json(AuthResponse::success("login successful", session)))
        }
        Err(e) => {
            LOGIN_FAILURES_TOTAL.inc();
            (jar, Json(AuthResponse::failure(failure_message(&e, "login"))))
        }
    }
}

#[utoipa::path(post, path = "/auth/login-jwt", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Outcome with an access token on success", body = TokenResponse)))]
pub async fn login_jwt(State(state): State<ServerState>, payload: Result<Json<LoginInput>, JsonRejection>) -> Json<TokenResponse> {
    LOGIN_ATTEMPTS_TOTAL.inc();
    let input = match payload {
        Ok(Json(input)) => input,
        Err(r) => {
            LOGIN_FAILURES_TOTAL.inc();
            return Json(TokenResponse::failure(r.body_text()));
        }
    };
    match state.auth.login(input).await {
        Ok(session) => Json(token_success(&state, "login successful", session)),
        Err(e) => {
            LOGIN_FAILURES_TOTAL.inc();
            Json(TokenResponse::failure(failure_message(&e, "login_jwt")))
        }
    }
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Outcome; sets the session cookie on success", body = AuthResponse)))]
pub async fn register(State(state): State<ServerState>, jar: CookieJar, payload: Result<Json<RegisterInput>, JsonRejection>) -> (CookieJar, Json<AuthResponse>) {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(r) => {
            REGISTRATION_FAILURES_TOTAL.inc();
            return (jar, Json(AuthResponse::failure(r.body_text())));
        }
    };
    match state.auth.register(input).await {
        Ok(session) => {
            REGISTRATIONS_TOTAL.inc();
            let jar = start_session(&state, jar, session.user.id).await;
            (jar, Json(AuthResponse::success("registration successful", session)))
        }
        Err(e) => {
            REGISTRATION_FAILURES_TOTAL.inc();
            (jar, Json(AuthResponse::failure(failure_message(&e, "register"))))
        }
    }
}

#[utoipa::path(post, path = "/auth/register-jwt", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Outcome with an access token on success", body = TokenResponse)))]
pub async fn register_jwt(State(state): State<ServerState>, payload: Result<Json<RegisterInput>, JsonRejection>) -> Json<TokenResponse> {
    let input = match payload {
        Ok(Json(input)) => input,
        Err(r) => {
            REGISTRATION_FAILURES_TOTAL.inc();
            return Json(TokenResponse::failure(r.body_text()));
        }
    };
    match state.auth.register(input).await {
        Ok(session) => {
            REGISTRATIONS_TOTAL.inc();
            Json(token_success(&state, "registration successful", session))
        }
        Err(e) => {
            REGISTRATION_FAILURES_TOTAL.inc();
            Json(TokenResponse::failure(failure_message(&e, "register_jwt")))
        }
    }
}

#[utoipa::path(get, path = "/auth/check-auth", tag = "auth", responses((status = 200, body = CheckAuthResponse)))]
pub async fn check_auth(State(state): State<ServerState>, jar: CookieJar) -> Result<Json<CheckAuthResponse>, ApiError> {
    let identity = session_identity(&state, &jar).await?;
    Ok(Json(check_auth_body(&state, identity).await?))
}

#[utoipa::path(get, path = "/auth/check-auth-jwt", tag = "auth", responses((status = 200, body = CheckAuthResponse)))]
pub async fn check_auth_jwt(State(state): State<ServerState>, headers: HeaderMap) -> Result<Json<CheckAuthResponse>, ApiError> {
    let identity = bearer_identity(&state, &headers).await?;
    Ok(Json(check_auth_body(&state, identity).await?))
}

#[utoipa::path(get, path = "/auth/tenant-info", tag = "auth", responses((status = 200, body = TenantInfoResponse), (status = 401, description = "Not authenticated")))]
pub async fn tenant_info(State(state): State<ServerState>, jar: CookieJar) -> Result<Json<TenantInfoResponse>, ApiError> {
    let identity = session_identity(&state, &jar).await?;
    Ok(Json(tenant_info_body(&state, identity).await?))
}

#[utoipa::path(get, path = "/auth/tenant-info-jwt", tag = "auth", responses((status = 200, body = TenantInfoResponse), (status = 401, description = "Not authenticated")))]
pub async fn tenant_info_jwt(State(state): State<ServerState>, headers: HeaderMap) -> Result<Json<TenantInfoResponse>, ApiError> {
    let identity = bearer_identity(&state, &headers).await?;
    Ok(Json(tenant_info_body(&state, identity).await?))
}

#[utoipa::path(get, path = "/auth/profile", tag = "auth", responses((status = 200, body = UserView), (status = 401, description = "Not authenticated")))]
pub async fn profile(State(state): State<ServerState>, jar: CookieJar) -> Result<Json<UserView>, ApiError> {
    let identity = session_identity(&state, &jar).await?.ok_or_else(ApiError::unauthenticated)?;
    Ok(Json(identity.into()))
}

#[utoipa::path(get, path = "/auth/profile-jwt", tag = "auth", responses((status = 200, body = UserView), (status = 401, description = "Not authenticated")))]
pub async fn profile_jwt(State(state): State<ServerState>, headers: HeaderMap) -> Result<Json<UserView>, ApiError> {
    let identity = bearer_identity(&state, &headers).await?.ok_or_else(ApiError::unauthenticated)?;
    Ok(Json(identity.into()))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 200, body = MessageResponse)))]
pub async fn logout(State(state): State<ServerState>, jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value()).await;
    }
    let jar = jar.remove(expired_session_cookie());
    (jar, Json(MessageResponse::ok("logout successful")))
}

/// Tokens are not tracked server side; the client discards its copy.
#[utoipa::path(post, path = "/auth/logout-jwt", tag = "auth", responses((status = 200, body = MessageResponse)))]
pub async fn logout_jwt() -> Json<MessageResponse> {
    Json(MessageResponse::ok("logout successful, discard the access token"))
}

#[utoipa::path(post, path = "/auth/validate-tenant-access", tag = "auth", request_body = ValidateTenantAccessRequest, responses((status = 200, body = ValidateTenantAccessResponse), (status = 401, description = "Not authenticated")), security(("bearer" = [])))]
pub async fn validate_tenant_access(
    State(state): State<ServerState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ValidateTenantAccessRequest>, JsonRejection>,
) -> Result<Json<ValidateTenantAccessResponse>, ApiError> {
    let Json(req) = payload?;
    if identity.user.tenant_id != Some(req.tenant_id) {
        return Ok(Json(ValidateTenantAccessResponse { valid: false }));
    }
    let resolved = state.resolver.resolve(&req.domain, "/").await.map_err(|e| {
        error!(code = e.code(), error = %e, "tenant resolution failed");
        ApiError::Internal
    })?;
    let valid = matches!(resolved, ResolvedPartition::Tenant(t) if t.id == req.tenant_id);
    Ok(Json(ValidateTenantAccessResponse { valid }))
}
