use std::collections::HashMap;
use std::sync::Arc;

use models::partition::PartitionKey;
use tracing::{info, instrument};

use super::domain::{NewProject, NewTask, Project, ProjectUpdate, Task};
use super::repository::ProjectRepository;
use crate::errors::ServiceError;

pub struct ProjectService {
    repo: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self { Self { repo } }

    /// All projects of the partition with their tasks, one task query in total.
    pub async fn list(&self, key: &PartitionKey) -> Result<Vec<Project>, ServiceError> {
        let mut projects = self.repo.list(key).await?;
        let ids: Vec<i64> = projects.iter().map(|p| p.id).collect();
        let mut by_project: HashMap<i64, Vec<Task>> = HashMap::new();
        for t in self.repo.tasks_for(key, &ids).await? {
            by_project.entry(t.project).or_default().push(t);
        }
        for p in &mut projects {
            p.tasks = by_project.remove(&p.id).unwrap_or_default();
        }
        Ok(projects)
    }

    pub async fn get(&self, key: &PartitionKey, id: i64) -> Result<Project, ServiceError> {
        let project = self.repo.get(key, id).await?.ok_or_else(|| ServiceError::not_found("project"))?;
        self.with_tasks(key, project).await
    }

    #[instrument(skip(self, input), fields(partition = %key))]
    pub async fn create(&self, key: &PartitionKey, input: NewProject) -> Result<Project, ServiceError> {
        models::project::validate_name(&input.name)?;
        let project = self.repo.create(key, input).await?;
        info!(project_id = project.id, "project_created");
        Ok(project)
    }

    #[instrument(skip(self, input), fields(partition = %key))]
    pub async fn update(&self, key: &PartitionKey, id: i64, input: ProjectUpdate) -> Result<Project, ServiceError> {
        if let Some(name) = &input.name {
            models::project::validate_name(name)?;
        }
        let project = self.repo.update(key, id, input).await?.ok_or_else(|| ServiceError::not_found("project"))?;
        self.with_tasks(key, project).await
    }

    #[instrument(skip(self), fields(partition = %key))]
    pub async fn delete(&self, key: &PartitionKey, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(key, id).await? {
            return Err(ServiceError::not_found("project"));
        }
        info!(project_id = id, "project_deleted");
        Ok(())
    }

    pub async fn list_tasks(&self, key: &PartitionKey, project_id: i64) -> Result<Vec<Task>, ServiceError> {
        if self.repo.get(key, project_id).await?.is_none() {
            return Err(ServiceError::not_found("project"));
        }
        self.repo.tasks_for(key, &[project_id]).await
    }

    #[instrument(skip(self, input), fields(partition = %key))]
    pub async fn create_task(&self, key: &PartitionKey, project_id: i64, input: NewTask) -> Result<Task, ServiceError> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::Validation("task name required".into()));
        }
        if self.repo.get(key, project_id).await?.is_none() {
            return Err(ServiceError::not_found("project"));
        }
        self.repo.create_task(key, project_id, input).await
    }

    async fn with_tasks(&self, key: &PartitionKey, mut project: Project) -> Result<Project, ServiceError> {
        project.tasks = self.repo.tasks_for(key, &[project.id]).await?;
        Ok(project)
    }
}
