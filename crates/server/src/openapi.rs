use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use service::projects::domain::{NewProject, NewTask, Project, ProjectUpdate, Task};
use service::tenancy::domain::TenantSummary;

use crate::routes::{self, auth, projects, MessageResponse};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    /// Organization name; the tenant partition key is derived from it.
    pub organization: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health,
        auth::login,
        auth::login_jwt,
        auth::register,
        auth::register_jwt,
        auth::check_auth,
        auth::check_auth_jwt,
        auth::tenant_info,
        auth::tenant_info_jwt,
        auth::profile,
        auth::profile_jwt,
        auth::logout,
        auth::logout_jwt,
        auth::validate_tenant_access,
        projects::list,
        projects::create,
        projects::get,
        projects::update,
        projects::delete,
        projects::list_tasks,
        projects::create_task,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            MessageResponse,
            TenantSummary,
            auth::UserView,
            auth::AuthResponse,
            auth::TokenResponse,
            auth::CheckAuthResponse,
            auth::TenantInfoView,
            auth::TenantInfoResponse,
            auth::ValidateTenantAccessRequest,
            auth::ValidateTenantAccessResponse,
            Project,
            Task,
            NewProject,
            ProjectUpdate,
            NewTask,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "projects")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_auth_and_project_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/auth/login-jwt"));
        assert!(paths.contains_key("/projects/{id}/tasks"));
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("bearer"));
    }
}
