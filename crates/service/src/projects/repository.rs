use async_trait::async_trait;
use models::partition::PartitionKey;

use super::domain::{NewProject, NewTask, Project, ProjectUpdate, Task};
use crate::errors::ServiceError;

/// Partition-scoped persistence for projects and tasks. Returned projects
/// carry no tasks; the service attaches them.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list(&self, key: &PartitionKey) -> Result<Vec<Project>, ServiceError>;
    async fn get(&self, key: &PartitionKey, id: i64) -> Result<Option<Project>, ServiceError>;
    async fn create(&self, key: &PartitionKey, input: NewProject) -> Result<Project, ServiceError>;
    async fn update(&self, key: &PartitionKey, id: i64, input: ProjectUpdate) -> Result<Option<Project>, ServiceError>;
    /// True when a row was removed; its tasks go with it.
    async fn delete(&self, key: &PartitionKey, id: i64) -> Result<bool, ServiceError>;
    async fn tasks_for(&self, key: &PartitionKey, project_ids: &[i64]) -> Result<Vec<Task>, ServiceError>;
    async fn create_task(&self, key: &PartitionKey, project_id: i64, input: NewTask) -> Result<Task, ServiceError>;
}
