use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use configs::AppConfig;
use serde_json::{json, Value};
use service::auth::TokenCodec;
use service::mock::MemoryStore;
use tower::ServiceExt;

use server::{build_app, ServerState};

const SECRET: &str = "test-secret";

fn config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = SECRET.into();
    cfg
}

fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let state = ServerState::new(store.clone(), store.clone(), store.clone(), &config());
    (build_app(state), store)
}

fn register_body(username: &str, organization: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "S3curePass!",
        "password_confirm": "S3curePass!",
        "organization": organization,
    })
}

struct Call<'a> {
    method: &'a str,
    uri: &'a str,
    host: &'a str,
    bearer: Option<&'a str>,
    cookie: Option<&'a str>,
    body: Option<Value>,
}

impl<'a> Call<'a> {
    fn new(method: &'a str, uri: &'a str) -> Self {
        Self { method, uri, host: "localhost:8000", bearer: None, cookie: None, body: None }
    }
    fn host(mut self, host: &'a str) -> Self { self.host = host; self }
    fn bearer(mut self, token: &'a str) -> Self { self.bearer = Some(token); self }
    fn cookie(mut self, cookie: &'a str) -> Self { self.cookie = Some(cookie); self }
    fn json(mut self, body: Value) -> Self { self.body = Some(body); self }

    async fn send(self, app: &Router) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut req = Request::builder().method(self.method).uri(self.uri).header(header::HOST, self.host);
        if let Some(t) = self.bearer {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        if let Some(c) = self.cookie {
            req = req.header(header::COOKIE, c);
        }
        let req = match self.body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&b).unwrap()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, headers, body)
    }
}

fn session_cookie(headers: &axum::http::HeaderMap) -> String {
    let raw = headers.get(header::SET_COOKIE).expect("set-cookie").to_str().unwrap();
    raw.split(';').next().unwrap().to_string()
}

async fn register_jwt(app: &Router, username: &str, organization: &str) -> String {
    let (status, _, body) = Call::new("POST", "/auth/register-jwt").json(register_body(username, organization)).send(app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true, "{body}");
    body["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_jwt_provisions_tenant_and_redirects_to_its_domain() {
    let (app, store) = app();
    let (status, _, body) = Call::new("POST", "/auth/register-jwt")
        .json(register_body("alice", "Test Organization"))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 86_400);
    assert_eq!(body["redirect_url"], "http://testorganization.localhost:8000/");
    assert_eq!(body["user"]["tenant"]["schema_name"], "testorganization");
    assert_eq!(store.tenant_count(), 1);
}

#[tokio::test]
async fn registration_failures_are_reported_in_the_body() {
    let (app, store) = app();
    register_jwt(&app, "alice", "Acme").await;

    let mut dup = register_body("alice", "Other");
    dup["email"] = json!("fresh@example.com");
    let (status, _, body) = Call::new("POST", "/auth/register").json(dup).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "username already exists");

    let mut mismatch = register_body("bob", "Bobs");
    mismatch["password_confirm"] = json!("different1");
    let (_, _, body) = Call::new("POST", "/auth/register").json(mismatch).send(&app).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "passwords do not match");

    let (status, _, body) = Call::new("POST", "/auth/register").json(json!({"username": "x"})).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    assert_eq!(store.tenant_count(), 1);
    assert_eq!(store.user_count(), 1);
}

#[tokio::test]
async fn session_login_sets_cookie_and_check_auth_reads_it() {
    let (app, _) = app();
    register_jwt(&app, "alice", "Acme").await;

    let (status, headers, body) = Call::new("POST", "/auth/login")
        .json(json!({"username": "alice", "password": "S3curePass!"}))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["redirect_url"], "http://acme.localhost:8000/");
    let cookie = session_cookie(&headers);
    assert!(cookie.starts_with("sessionid="));

    let (_, _, body) = Call::new("GET", "/auth/check-auth").cookie(&cookie).send(&app).await;
    assert_eq!(body["is_authenticated"], true);
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["tenant_info"]["schema_name"], "acme");
    assert_eq!(body["tenant_info"]["redirect_url"], "http://acme.localhost:8000/");

    let (_, _, first) = Call::new("GET", "/auth/tenant-info").cookie(&cookie).send(&app).await;
    let (_, _, second) = Call::new("GET", "/auth/tenant-info").cookie(&cookie).send(&app).await;
    assert_eq!(first["has_tenant"], true);
    assert_eq!(first, second);

    let (_, _, body) = Call::new("GET", "/auth/profile").cookie(&cookie).send(&app).await;
    assert_eq!(body["email"], "alice@example.com");

    let (_, headers, body) = Call::new("POST", "/auth/logout").cookie(&cookie).send(&app).await;
    assert_eq!(body["success"], true);
    assert!(headers.get(header::SET_COOKIE).is_some());
    let (_, _, body) = Call::new("GET", "/auth/check-auth").cookie(&cookie).send(&app).await;
    assert_eq!(body["is_authenticated"], false);
    let (status, _, _) = Call::new("GET", "/auth/profile").cookie(&cookie).send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let (app, _) = app();
    register_jwt(&app, "alice", "Acme").await;

    let (_, headers, wrong_pw) = Call::new("POST", "/auth/login")
        .json(json!({"username": "alice", "password": "nope-nope"}))
        .send(&app)
        .await;
    assert!(headers.get(header::SET_COOKIE).is_none());
    let (_, _, unknown) = Call::new("POST", "/auth/login-jwt")
        .json(json!({"username": "ghost", "password": "nope-nope"}))
        .send(&app)
        .await;
    assert_eq!(wrong_pw["success"], false);
    assert_eq!(unknown["success"], false);
    assert_eq!(wrong_pw["message"], unknown["message"]);
    assert!(unknown.get("access_token").is_none());
}

#[tokio::test]
async fn bearer_endpoints_report_identity_or_401() {
    let (app, _) = app();
    let token = register_jwt(&app, "alice", "Acme").await;

    let (_, _, body) = Call::new("GET", "/auth/check-auth-jwt").bearer(&token).send(&app).await;
    assert_eq!(body["is_authenticated"], true);
    let (_, _, body) = Call::new("GET", "/auth/check-auth-jwt").bearer("garbage").send(&app).await;
    assert_eq!(body["is_authenticated"], false);

    let (_, _, body) = Call::new("GET", "/auth/tenant-info-jwt").bearer(&token).send(&app).await;
    assert_eq!(body["tenant"]["name"], "Acme");
    let (status, _, _) = Call::new("GET", "/auth/tenant-info-jwt").send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = Call::new("GET", "/auth/profile-jwt").bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");

    let (_, _, body) = Call::new("POST", "/auth/logout-jwt").bearer(&token).send(&app).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn project_and_task_crud_in_tenant_partition() {
    let (app, _) = app();
    let token = register_jwt(&app, "alice", "Acme").await;
    let host = "acme.localhost:8000";

    let (status, headers, created) = Call::new("POST", "/projects")
        .host(host)
        .bearer(&token)
        .json(json!({"name": "Launch", "description": "first"}))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-tenant-schema").unwrap(), "acme");
    assert_eq!(headers.get("x-tenant-host").unwrap(), "acme.localhost");
    assert_eq!(created["is_completed"], false);
    let id = created["id"].as_i64().unwrap();

    let tasks_uri = format!("/projects/{id}/tasks");
    let (status, _, task) = Call::new("POST", &tasks_uri)
        .host(host)
        .bearer(&token)
        .json(json!({"name": "Write docs"}))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(task["project"], id);

    let (_, _, list) = Call::new("GET", "/projects").host(host).bearer(&token).send(&app).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["tasks"][0]["name"], "Write docs");

    let uri = format!("/projects/{id}");
    let (_, _, updated) = Call::new("PUT", &uri)
        .host(host)
        .bearer(&token)
        .json(json!({"is_completed": true}))
        .send(&app)
        .await;
    assert_eq!(updated["is_completed"], true);
    assert_eq!(updated["name"], "Launch");

    let (_, _, body) = Call::new("DELETE", &uri).host(host).bearer(&token).send(&app).await;
    assert_eq!(body["success"], true);
    let (status, _, body) = Call::new("GET", &uri).host(host).bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn public_host_falls_back_to_callers_partition() {
    let (app, _) = app();
    let token = register_jwt(&app, "alice", "Acme").await;
    let (status, headers, _) = Call::new("POST", "/projects")
        .bearer(&token)
        .json(json!({"name": "From public host"}))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get("x-tenant-schema").is_none());

    let (_, _, list) = Call::new("GET", "/projects").host("acme.localhost").bearer(&token).send(&app).await;
    assert_eq!(list[0]["name"], "From public host");
}

#[tokio::test]
async fn tenants_cannot_reach_each_other() {
    let (app, _) = app();
    let alice = register_jwt(&app, "alice", "Acme").await;
    let bob = register_jwt(&app, "bob", "Globex").await;

    Call::new("POST", "/projects").bearer(&alice).json(json!({"name": "Secret"})).send(&app).await;

    let (_, _, list) = Call::new("GET", "/projects").bearer(&bob).send(&app).await;
    assert_eq!(list.as_array().unwrap().len(), 0);

    let (status, _, body) = Call::new("GET", "/projects").host("acme.localhost").bearer(&bob).send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "tenant mismatch");
}

#[tokio::test]
async fn business_routes_require_a_tenant_bearer() {
    let (app, store) = app();
    let (status, _, _) = Call::new("GET", "/projects").send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _, _) = Call::new("GET", "/projects").bearer("not-a-token").send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let loner = store.seed_user("loner", "loner@example.com");
    let token = TokenCodec::new(SECRET, 3600).issue(&loner, None).unwrap();
    let (status, _, body) = Call::new("GET", "/projects").bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "user has no tenant");

    let (status, _, body) = Call::new("GET", "/auth/tenant-info-jwt").bearer(&token).send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_tenant"], false);

    let other = TokenCodec::new("another-secret", 3600).issue(&loner, None).unwrap();
    let (status, _, _) = Call::new("GET", "/auth/profile-jwt").bearer(&other).send(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_path_stays_public_on_tenant_hosts() {
    let (app, _) = app();
    register_jwt(&app, "alice", "Acme").await;
    let (status, headers, body) = Call::new("POST", "/auth/login-jwt")
        .host("acme.localhost")
        .json(json!({"username": "alice", "password": "S3curePass!"}))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(headers.get("x-tenant-schema").is_none());

    let (_, headers, _) = Call::new("GET", "/health").host("ACME.localhost:8000").send(&app).await;
    assert_eq!(headers.get("x-tenant-schema").unwrap(), "acme");
}

#[tokio::test]
async fn validate_tenant_access_checks_membership_and_domain() {
    let (app, _) = app();
    let token = register_jwt(&app, "alice", "Acme").await;
    let (_, _, info) = Call::new("GET", "/auth/tenant-info-jwt").bearer(&token).send(&app).await;
    let tenant_id = info["tenant"]["id"].clone();

    let (_, _, body) = Call::new("POST", "/auth/validate-tenant-access")
        .bearer(&token)
        .json(json!({"tenant_id": tenant_id, "domain": "acme.localhost"}))
        .send(&app)
        .await;
    assert_eq!(body["valid"], true);

    let (_, _, body) = Call::new("POST", "/auth/validate-tenant-access")
        .bearer(&token)
        .json(json!({"tenant_id": tenant_id, "domain": "elsewhere.localhost"}))
        .send(&app)
        .await;
    assert_eq!(body["valid"], false);

    let (status, _, _) = Call::new("POST", "/auth/validate-tenant-access")
        .json(json!({"tenant_id": tenant_id, "domain": "acme.localhost"}))
        .send(&app)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_metrics_and_docs_are_served() {
    let (app, _) = app();
    let (status, _, body) = Call::new("GET", "/health").send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    Call::new("POST", "/auth/login-jwt").json(json!({"username": "a", "password": "b"})).send(&app).await;
    let req = Request::builder().uri("/metrics").header(header::HOST, "localhost").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let text = String::from_utf8(to_bytes(resp.into_body(), 1 << 20).await.unwrap().to_vec()).unwrap();
    assert!(text.contains("taskhub_login_attempts_total"));

    let (status, _, doc) = Call::new("GET", "/api-docs/openapi.json").send(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/projects"].is_object());
}
