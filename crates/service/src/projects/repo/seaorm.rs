use async_trait::async_trait;
use models::partition::PartitionKey;
use models::{project, task};
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::projects::domain::{NewProject, NewTask, Project, ProjectUpdate, Task};
use crate::projects::repository::ProjectRepository;

pub struct SeaOrmProjectRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl ProjectRepository for SeaOrmProjectRepository {
    async fn list(&self, key: &PartitionKey) -> Result<Vec<Project>, ServiceError> {
        Ok(project::list(&self.db, key).await?.into_iter().map(Project::from).collect())
    }

    async fn get(&self, key: &PartitionKey, id: i64) -> Result<Option<Project>, ServiceError> {
        Ok(project::get(&self.db, key, id).await?.map(Project::from))
    }

    async fn create(&self, key: &PartitionKey, input: NewProject) -> Result<Project, ServiceError> {
        let m = project::create(&self.db, key, &input.name, &input.description, input.is_completed).await?;
        Ok(Project::from(m))
    }

    async fn update(&self, key: &PartitionKey, id: i64, input: ProjectUpdate) -> Result<Option<Project>, ServiceError> {
        Ok(project::update(&self.db, key, id, input.into()).await?.map(Project::from))
    }

    async fn delete(&self, key: &PartitionKey, id: i64) -> Result<bool, ServiceError> {
        Ok(project::delete(&self.db, key, id).await?)
    }

    async fn tasks_for(&self, key: &PartitionKey, project_ids: &[i64]) -> Result<Vec<Task>, ServiceError> {
        Ok(task::list_for_projects(&self.db, key, project_ids).await?.into_iter().map(Task::from).collect())
    }

    async fn create_task(&self, key: &PartitionKey, project_id: i64, input: NewTask) -> Result<Task, ServiceError> {
        Ok(Task::from(task::create(&self.db, key, project_id, &input.name, &input.description).await?))
    }
}
