use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: i64,
    /// Owning project id.
    pub project: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<models::task::Model> for Task {
    fn from(m: models::task::Model) -> Self {
        Self {
            id: m.id,
            project: m.project_id,
            name: m.name,
            description: m.description,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl From<models::project::Model> for Project {
    fn from(m: models::project::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            is_completed: m.is_completed,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
            tasks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

impl From<ProjectUpdate> for models::project::ProjectPatch {
    fn from(u: ProjectUpdate) -> Self {
        Self { name: u.name, description: u.description, is_completed: u.is_completed }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: String,
}
