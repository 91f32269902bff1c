//! Project and task endpoints. Every handler runs inside the caller's tenant
//! partition, chosen by [`TenantScope`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use service::projects::domain::{NewProject, NewTask, Project, ProjectUpdate, Task};

use crate::errors::ApiError;
use crate::middleware::TenantScope;
use crate::routes::MessageResponse;
use crate::state::ServerState;

#[utoipa::path(get, path = "/projects", tag = "projects", responses((status = 200, body = [Project]), (status = 401, description = "Not authenticated")), security(("bearer" = [])))]
pub async fn list(State(state): State<ServerState>, TenantScope(key): TenantScope) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.projects.list(&key).await?))
}

#[utoipa::path(post, path = "/projects", tag = "projects", request_body = NewProject, responses((status = 200, body = Project), (status = 400, description = "Invalid input")), security(("bearer" = [])))]
pub async fn create(
    State(state): State<ServerState>,
    TenantScope(key): TenantScope,
    payload: Result<Json<NewProject>, JsonRejection>,
) -> Result<Json<Project>, ApiError> {
    let Json(input) = payload?;
    let project = state.projects.create(&key, input).await?;
    Ok(Json(project))
}

#[utoipa::path(get, path = "/projects/{id}", tag = "projects", params(("id" = i64, Path, description = "Project id")), responses((status = 200, body = Project), (status = 404, description = "Not found")), security(("bearer" = [])))]
pub async fn get(State(state): State<ServerState>, TenantScope(key): TenantScope, Path(id): Path<i64>) -> Result<Json<Project>, ApiError> {
    Ok(Json(state.projects.get(&key, id).await?))
}

#[utoipa::path(put, path = "/projects/{id}", tag = "projects", params(("id" = i64, Path, description = "Project id")), request_body = ProjectUpdate, responses((status = 200, body = Project), (status = 404, description = "Not found")), security(("bearer" = [])))]
pub async fn update(
    State(state): State<ServerState>,
    TenantScope(key): TenantScope,
    Path(id): Path<i64>,
    payload: Result<Json<ProjectUpdate>, JsonRejection>,
) -> Result<Json<Project>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.projects.update(&key, id, input).await?))
}

#[utoipa::path(delete, path = "/projects/{id}", tag = "projects", params(("id" = i64, Path, description = "Project id")), responses((status = 200, body = MessageResponse), (status = 404, description = "Not found")), security(("bearer" = [])))]
pub async fn delete(State(state): State<ServerState>, TenantScope(key): TenantScope, Path(id): Path<i64>) -> Result<Json<MessageResponse>, ApiError> {
    state.projects.delete(&key, id).await?;
    Ok(Json(MessageResponse::ok("project deleted")))
}

#[utoipa::path(get, path = "/projects/{id}/tasks", tag = "projects", params(("id" = i64, Path, description = "Project id")), responses((status = 200, body = [Task]), (status = 404, description = "Not found")), security(("bearer" = [])))]
pub async fn list_tasks(State(state): State<ServerState>, TenantScope(key): TenantScope, Path(id): Path<i64>) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(state.projects.list_tasks(&key, id).await?))
}

#[utoipa::path(post, path = "/projects/{id}/tasks", tag = "projects", params(("id" = i64, Path, description = "Project id")), request_body = NewTask, responses((status = 200, body = Task), (status = 404, description = "Not found")), security(("bearer" = [])))]
pub async fn create_task(
    State(state): State<ServerState>,
    TenantScope(key): TenantScope,
    Path(id): Path<i64>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(state.projects.create_task(&key, id, input).await?))
}
