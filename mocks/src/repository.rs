//! Error-injecting fake repository implementations: a
//! `parking_lot::Mutex<HashMap<..>>` backing store, a one-shot
//! `error_injection` slot consumed by the next call, and call-history
//! tracking for verification. Used to exercise `StatusValidator`'s and
//! `CascadeService`'s error-propagation paths without needing a real
//! storage backend.

use async_trait::async_trait;
use chrono::Utc;
use orchestrator_core::error::{OrchestratorError, Result};
use orchestrator_core::models::{
    Dependency, Feature, FeatureCounts, NewDependency, NewFeature, NewProject, NewTask, Project,
    Task, TaskCounts, TaskFilter, UpdateFeature, UpdateProject, UpdateTask,
};
use orchestrator_core::repository::{DependencyRepository, FeatureRepository, ProjectRepository, TaskRepository};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Shared plumbing every `Fake*Repository` below reuses: a one-shot error
/// slot and a call-history log.
#[derive(Default)]
struct FakeControl {
    error_injection: Mutex<Option<OrchestratorError>>,
    call_history: Mutex<Vec<String>>,
}

impl FakeControl {
    fn check(&self) -> Result<()> {
        if let Some(err) = self.error_injection.lock().take() {
            return Err(err);
        }
        Ok(())
    }

    fn record(&self, call: impl Into<String>) {
        self.call_history.lock().push(call.into());
    }
}

macro_rules! fake_repository {
    ($name:ident, $entity:ty) => {
        pub struct $name {
            items: Arc<Mutex<HashMap<Uuid, $entity>>>,
            control: FakeControl,
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    items: Arc::new(Mutex::new(HashMap::new())),
                    control: FakeControl::default(),
                }
            }

            pub fn with_items(items: Vec<$entity>) -> Self
            where
                $entity: HasId,
            {
                let repo = Self::new();
                for item in items {
                    repo.items.lock().insert(item.id(), item);
                }
                repo
            }

            /// The next call to any trait method returns this error instead
            /// of performing the operation.
            pub fn inject_error(&self, error: OrchestratorError) {
                *self.control.error_injection.lock() = Some(error);
            }

            pub fn call_history(&self) -> Vec<String> {
                self.control.call_history.lock().clone()
            }

            pub fn assert_called(&self, method: &str) {
                let history = self.control.call_history.lock();
                assert!(
                    history.iter().any(|c| c == method),
                    "method '{method}' was not called; history: {history:?}"
                );
            }
        }
    };
}

/// Gives a fake repository's `with_items` constructor a uniform way to read
/// the entity's primary key.
pub trait HasId {
    fn id(&self) -> Uuid;
}

impl HasId for Project {
    fn id(&self) -> Uuid {
        self.id
    }
}
impl HasId for Feature {
    fn id(&self) -> Uuid {
        self.id
    }
}
impl HasId for Task {
    fn id(&self) -> Uuid {
        self.id
    }
}

fake_repository!(FakeProjectRepository, Project);
fake_repository!(FakeFeatureRepository, Feature);
fake_repository!(FakeTaskRepository, Task);

#[async_trait]
impl ProjectRepository for FakeProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Project> {
        self.control.record("get_by_id");
        self.control.check()?;
        self.items
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("project", id))
    }

    async fn create(&self, new: NewProject) -> Result<Project> {
        self.control.record("create");
        self.control.check()?;
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            summary: new.summary,
            status: new.status.unwrap_or(orchestrator_core::models::ProjectStatus::Planning),
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        self.items.lock().insert(project.id, project.clone());
        Ok(project)
    }

    async fn update(&self, id: Uuid, update: UpdateProject) -> Result<Project> {
        self.control.record("update");
        self.control.check()?;
        let mut items = self.items.lock();
        let project = items
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::not_found("project", id))?;
        if let Some(status) = update.status {
            project.status = status;
        }
        if let Some(name) = update.name {
            project.name = name;
        }
        project.modified_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.control.record("delete");
        self.control.check()?;
        self.items
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("project", id))
    }

    async fn find_all(&self, limit: Option<u32>) -> Result<Vec<Project>> {
        self.control.record("find_all");
        self.control.check()?;
        let mut items: Vec<Project> = self.items.lock().values().cloned().collect();
        if let Some(limit) = limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn get_feature_counts_by_project_id(&self, _project_id: Uuid) -> Result<FeatureCounts> {
        self.control.record("get_feature_counts_by_project_id");
        self.control.check()?;
        Ok(FeatureCounts::default())
    }
}

#[async_trait]
impl FeatureRepository for FakeFeatureRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Feature> {
        self.control.record("get_by_id");
        self.control.check()?;
        self.items
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("feature", id))
    }

    async fn create(&self, new: NewFeature) -> Result<Feature> {
        self.control.record("create");
        self.control.check()?;
        let now = Utc::now();
        let feature = Feature {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            summary: new.summary,
            status: new.status.unwrap_or(orchestrator_core::models::FeatureStatus::Planning),
            priority: new.priority,
            project_id: new.project_id,
            requires_verification: new.requires_verification,
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        self.items.lock().insert(feature.id, feature.clone());
        Ok(feature)
    }

    async fn update(&self, id: Uuid, update: UpdateFeature) -> Result<Feature> {
        self.control.record("update");
        self.control.check()?;
        let mut items = self.items.lock();
        let feature = items
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::not_found("feature", id))?;
        if let Some(status) = update.status {
            feature.status = status;
        }
        feature.modified_at = Utc::now();
        Ok(feature.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.control.record("delete");
        self.control.check()?;
        self.items
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("feature", id))
    }

    async fn find_all(&self, limit: Option<u32>) -> Result<Vec<Feature>> {
        self.control.record("find_all");
        self.control.check()?;
        let mut items: Vec<Feature> = self.items.lock().values().cloned().collect();
        if let Some(limit) = limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn find_by_project_id(&self, project_id: Uuid) -> Result<Vec<Feature>> {
        self.control.record("find_by_project_id");
        self.control.check()?;
        Ok(self
            .items
            .lock()
            .values()
            .filter(|f| f.project_id == Some(project_id))
            .cloned()
            .collect())
    }

    async fn get_task_counts_by_feature_id(&self, _feature_id: Uuid) -> Result<TaskCounts> {
        self.control.record("get_task_counts_by_feature_id");
        self.control.check()?;
        Ok(TaskCounts::default())
    }
}

#[async_trait]
impl TaskRepository for FakeTaskRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Task> {
        self.control.record("get_by_id");
        self.control.check()?;
        self.items
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("task", id))
    }

    async fn create(&self, new: NewTask) -> Result<Task> {
        self.control.record("create");
        self.control.check()?;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            summary: new.summary,
            status: new.status.unwrap_or(orchestrator_core::models::TaskStatus::Pending),
            priority: new.priority,
            complexity: new.complexity,
            project_id: new.project_id,
            feature_id: new.feature_id,
            requires_verification: new.requires_verification,
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        self.items.lock().insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, update: UpdateTask) -> Result<Task> {
        self.control.record("update");
        self.control.check()?;
        let mut items = self.items.lock();
        let task = items
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::not_found("task", id))?;
        if let Some(status) = update.status {
            task.status = status;
        }
        task.modified_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.control.record("delete");
        self.control.check()?;
        self.items
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("task", id))
    }

    async fn find_all(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        self.control.record("find_all");
        self.control.check()?;
        let mut items: Vec<Task> = self
            .items
            .lock()
            .values()
            .filter(|t| filter.feature_id.map_or(true, |id| t.feature_id == Some(id)))
            .filter(|t| filter.project_id.map_or(true, |id| t.project_id == Some(id)))
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        if let Some(limit) = filter.limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn find_by_feature_id(&self, feature_id: Uuid) -> Result<Vec<Task>> {
        self.control.record("find_by_feature_id");
        self.control.check()?;
        Ok(self
            .items
            .lock()
            .values()
            .filter(|t| t.feature_id == Some(feature_id))
            .cloned()
            .collect())
    }

    async fn find_by_project_id(&self, project_id: Uuid) -> Result<Vec<Task>> {
        self.control.record("find_by_project_id");
        self.control.check()?;
        Ok(self
            .items
            .lock()
            .values()
            .filter(|t| t.project_id == Some(project_id))
            .cloned()
            .collect())
    }
}

/// A fake `DependencyRepository` built directly (no macro, since
/// `Dependency`'s primary key indexing by from/to needs the same
/// general-purpose `HashMap<Uuid, Dependency>` shape, not the `HasId`
/// seam the other three share).
pub struct FakeDependencyRepository {
    items: Arc<Mutex<HashMap<Uuid, Dependency>>>,
    control: FakeControl,
}

impl Default for FakeDependencyRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDependencyRepository {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(HashMap::new())),
            control: FakeControl::default(),
        }
    }

    pub fn with_items(items: Vec<Dependency>) -> Self {
        let repo = Self::new();
        for item in items {
            repo.items.lock().insert(item.id, item);
        }
        repo
    }

    pub fn inject_error(&self, error: OrchestratorError) {
        *self.control.error_injection.lock() = Some(error);
    }
}

#[async_trait]
impl DependencyRepository for FakeDependencyRepository {
    async fn create(&self, new: NewDependency) -> Result<Dependency> {
        self.control.record("create");
        self.control.check()?;
        let dependency = Dependency {
            id: Uuid::new_v4(),
            from_task_id: new.from_task_id,
            to_task_id: new.to_task_id,
            dependency_type: new.dependency_type,
            unblock_at: new.unblock_at,
            created_at: Utc::now(),
        };
        self.items.lock().insert(dependency.id, dependency.clone());
        Ok(dependency)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Dependency> {
        self.control.record("get_by_id");
        self.control.check()?;
        self.items
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("dependency", id))
    }

    async fn find_by_from_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>> {
        self.control.record("find_by_from_task_id");
        self.control.check()?;
        Ok(self
            .items
            .lock()
            .values()
            .filter(|d| d.from_task_id == task_id)
            .cloned()
            .collect())
    }

    async fn find_by_to_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>> {
        self.control.record("find_by_to_task_id");
        self.control.check()?;
        Ok(self
            .items
            .lock()
            .values()
            .filter(|d| d.to_task_id == task_id)
            .cloned()
            .collect())
    }

    async fn find_by_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>> {
        self.control.record("find_by_task_id");
        self.control.check()?;
        Ok(self
            .items
            .lock()
            .values()
            .filter(|d| d.from_task_id == task_id || d.to_task_id == task_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.control.record("delete");
        self.control.check()?;
        self.items
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("dependency", id))
    }

    async fn delete_by_task_id(&self, task_id: Uuid) -> Result<u64> {
        self.control.record("delete_by_task_id");
        self.control.check()?;
        let mut items = self.items.lock();
        let ids: Vec<Uuid> = items
            .values()
            .filter(|d| d.from_task_id == task_id || d.to_task_id == task_id)
            .map(|d| d.id)
            .collect();
        for id in &ids {
            items.remove(id);
        }
        Ok(ids.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inject_error_is_consumed_once() {
        let repo = FakeProjectRepository::new();
        repo.inject_error(OrchestratorError::Database("boom".into()));
        let first = repo.get_by_id(Uuid::new_v4()).await;
        assert!(matches!(first, Err(OrchestratorError::Database(_))));
        let second = repo.get_by_id(Uuid::new_v4()).await;
        assert!(matches!(second, Err(OrchestratorError::NotFound(_))));
    }

    #[tokio::test]
    async fn call_history_records_method_names() {
        let repo = FakeFeatureRepository::new();
        let _ = repo.find_all(None).await;
        repo.assert_called("find_all");
    }

    #[tokio::test]
    async fn dependency_repo_round_trips() {
        let repo = FakeDependencyRepository::new();
        let dep = repo
            .create(NewDependency {
                from_task_id: Uuid::new_v4(),
                to_task_id: Uuid::new_v4(),
                dependency_type: orchestrator_core::models::DependencyType::Blocks,
                unblock_at: None,
            })
            .await
            .unwrap();
        assert_eq!(repo.find_by_from_task_id(dep.from_task_id).await.unwrap().len(), 1);
    }
}
