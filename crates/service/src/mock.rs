//! In-memory implementation of every repository trait, for tests and doc
//! examples. One lock guards all maps, so multi-step writes are atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use models::partition::PartitionKey;
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, NewAccount};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;
use crate::projects::domain::{NewProject, NewTask, Project, ProjectUpdate, Task};
use crate::projects::repository::ProjectRepository;
use crate::tenancy::domain::{DomainRecord, NewTenant, TenantSummary};
use crate::tenancy::errors::TenancyError;
use crate::tenancy::repository::TenancyRepository;

#[derive(Default)]
struct PartitionData {
    projects: BTreeMap<i64, Project>,
    tasks: BTreeMap<i64, Task>,
    next_id: i64,
}

impl PartitionData {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, AuthUser>,
    creds: HashMap<Uuid, Credentials>,
    tenants: HashMap<Uuid, TenantSummary>,
    domains: Vec<DomainRecord>,
    partitions: HashMap<PartitionKey, PartitionData>,
}

impl State {
    fn key_taken(&self, key: &PartitionKey) -> bool {
        self.partitions.contains_key(key) || self.tenants.values().any(|t| &t.schema_name == key)
    }

    fn hostname_taken(&self, hostname: &str) -> bool {
        self.domains.iter().any(|d| d.hostname == hostname)
    }

    fn insert_tenant(&mut self, new: NewTenant) -> (TenantSummary, DomainRecord) {
        let tenant = TenantSummary { id: Uuid::new_v4(), name: new.name, schema_name: new.key.clone(), created_on: Utc::now() };
        let domain = DomainRecord { id: Uuid::new_v4(), hostname: new.hostname, tenant_id: tenant.id, is_primary: true };
        self.partitions.insert(new.key, PartitionData::default());
        self.tenants.insert(tenant.id, tenant.clone());
        self.domains.push(domain.clone());
        (tenant, domain)
    }

    fn partition(&mut self, key: &PartitionKey) -> Result<&mut PartitionData, ServiceError> {
        self.partitions
            .get_mut(key)
            .ok_or_else(|| ServiceError::Db(format!("partition {key} does not exist")))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_registration: AtomicBool,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a user without credentials or tenant.
    pub fn seed_user(&self, username: &str, email: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            tenant_id: None,
        };
        self.state().users.insert(user.id, user.clone());
        user
    }

    pub fn user(&self, id: Uuid) -> Option<AuthUser> { self.state().users.get(&id).cloned() }

    pub fn remove_user(&self, id: Uuid) {
        let mut st = self.state();
        st.users.remove(&id);
        st.creds.remove(&id);
    }

    pub fn user_count(&self) -> usize { self.state().users.len() }

    pub fn tenant_count(&self) -> usize { self.state().tenants.len() }

    pub fn has_partition(&self, key: &PartitionKey) -> bool { self.state().partitions.contains_key(key) }

    /// Create an empty partition with no tenant record.
    pub fn add_partition(&self, key: &PartitionKey) {
        self.state().partitions.entry(key.clone()).or_default();
    }

    pub fn primary_of(&self, tenant_id: Uuid) -> Option<DomainRecord> {
        self.state().domains.iter().find(|d| d.tenant_id == tenant_id && d.is_primary).cloned()
    }

    /// Make the next `register_account` fail after validation, as a storage error would.
    pub fn fail_next_registration(&self) {
        self.fail_registration.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthRepository for MemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.state().users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.state().users.values().find(|u| u.email == email).cloned())
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        Ok(self.state().creds.get(&user_id).cloned())
    }

    async fn register_account(&self, account: NewAccount, tenant: NewTenant) -> Result<(AuthUser, TenantSummary), AuthError> {
        let mut st = self.state();
        if st.users.values().any(|u| u.username == account.username || u.email == account.email) {
            return Err(AuthError::Conflict("account or organization already exists".into()));
        }
        if st.key_taken(&tenant.key) || st.hostname_taken(&tenant.hostname) {
            return Err(AuthError::Conflict("account or organization already exists".into()));
        }
        if self.fail_registration.swap(false, Ordering::SeqCst) {
            return Err(AuthError::Repository("injected failure while creating domain".into()));
        }
        let (summary, _) = st.insert_tenant(tenant);
        let user = AuthUser {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            tenant_id: Some(summary.id),
        };
        st.creds.insert(user.id, Credentials {
            user_id: user.id,
            password_hash: account.password_hash,
            password_algorithm: account.password_algorithm,
        });
        st.users.insert(user.id, user.clone());
        Ok((user, summary))
    }
}

#[async_trait]
impl TenancyRepository for MemoryStore {
    async fn find_by_hostname(&self, hostname: &str) -> Result<Option<TenantSummary>, TenancyError> {
        let st = self.state();
        let found = st
            .domains
            .iter()
            .find(|d| d.hostname == hostname)
            .and_then(|d| st.tenants.get(&d.tenant_id).cloned());
        Ok(found)
    }

    async fn get_tenant(&self, id: Uuid) -> Result<Option<TenantSummary>, TenancyError> {
        Ok(self.state().tenants.get(&id).cloned())
    }

    async fn primary_domain(&self, tenant_id: Uuid) -> Result<Option<DomainRecord>, TenancyError> {
        Ok(self.primary_of(tenant_id))
    }

    async fn partition_taken(&self, key: &PartitionKey) -> Result<bool, TenancyError> {
        Ok(self.state().key_taken(key))
    }

    async fn create_tenant(&self, tenant: NewTenant, owner_id: Uuid) -> Result<(TenantSummary, DomainRecord), TenancyError> {
        let mut st = self.state();
        if st.key_taken(&tenant.key) {
            return Err(TenancyError::Conflict(format!("partition {} already exists", tenant.key)));
        }
        if st.hostname_taken(&tenant.hostname) {
            return Err(TenancyError::Conflict(format!("domain {} already exists", tenant.hostname)));
        }
        if !st.users.contains_key(&owner_id) {
            return Err(TenancyError::NotFound("user".into()));
        }
        let (summary, domain) = st.insert_tenant(tenant);
        if let Some(owner) = st.users.get_mut(&owner_id) {
            owner.tenant_id = Some(summary.id);
        }
        Ok((summary, domain))
    }

    async fn add_domain(&self, tenant_id: Uuid, hostname: &str, is_primary: bool) -> Result<DomainRecord, TenancyError> {
        models::domain::validate_hostname(hostname)?;
        let mut st = self.state();
        if st.hostname_taken(hostname) {
            return Err(TenancyError::Conflict(format!("domain {hostname} already exists")));
        }
        if is_primary {
            for d in st.domains.iter_mut().filter(|d| d.tenant_id == tenant_id) {
                d.is_primary = false;
            }
        }
        let domain = DomainRecord { id: Uuid::new_v4(), hostname: hostname.into(), tenant_id, is_primary };
        st.domains.push(domain.clone());
        Ok(domain)
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn list(&self, key: &PartitionKey) -> Result<Vec<Project>, ServiceError> {
        Ok(self.state().partition(key)?.projects.values().cloned().collect())
    }

    async fn get(&self, key: &PartitionKey, id: i64) -> Result<Option<Project>, ServiceError> {
        Ok(self.state().partition(key)?.projects.get(&id).cloned())
    }

    async fn create(&self, key: &PartitionKey, input: NewProject) -> Result<Project, ServiceError> {
        let mut st = self.state();
        let part = st.partition(key)?;
        let now = Utc::now();
        let project = Project {
            id: part.next(),
            name: input.name.trim().to_string(),
            description: input.description,
            is_completed: input.is_completed,
            created_at: now,
            updated_at: now,
            tasks: Vec::new(),
        };
        part.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update(&self, key: &PartitionKey, id: i64, input: ProjectUpdate) -> Result<Option<Project>, ServiceError> {
        let mut st = self.state();
        let Some(p) = st.partition(key)?.projects.get_mut(&id) else { return Ok(None) };
        if let Some(name) = input.name { p.name = name.trim().to_string(); }
        if let Some(description) = input.description { p.description = description; }
        if let Some(done) = input.is_completed { p.is_completed = done; }
        p.updated_at = Utc::now();
        Ok(Some(p.clone()))
    }

    async fn delete(&self, key: &PartitionKey, id: i64) -> Result<bool, ServiceError> {
        let mut st = self.state();
        let part = st.partition(key)?;
        let removed = part.projects.remove(&id).is_some();
        part.tasks.retain(|_, t| t.project != id);
        Ok(removed)
    }

    async fn tasks_for(&self, key: &PartitionKey, project_ids: &[i64]) -> Result<Vec<Task>, ServiceError> {
        let mut st = self.state();
        let tasks = st.partition(key)?.tasks.values().filter(|t| project_ids.contains(&t.project)).cloned().collect();
        Ok(tasks)
    }

    async fn create_task(&self, key: &PartitionKey, project_id: i64, input: NewTask) -> Result<Task, ServiceError> {
        let mut st = self.state();
        let part = st.partition(key)?;
        if !part.projects.contains_key(&project_id) {
            return Err(ServiceError::Db("task references a missing project".into()));
        }
        let now = Utc::now();
        let task = Task {
            id: part.next(),
            project: project_id,
            name: input.name.trim().to_string(),
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        part.tasks.insert(task.id, task.clone());
        Ok(task)
    }
}
