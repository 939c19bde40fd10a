use super::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use orchestrator_core::error::{OrchestratorError, Result};
use orchestrator_core::models::{NewTask, Task, TaskFilter, TaskStatus, UpdateTask};
use orchestrator_core::repository::TaskRepository;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory `TaskRepository`. Holds no rollups of its own; `FeatureRepository`
/// reads this crate's shared `Store.tasks` table directly for its rollup.
pub struct MemoryTaskRepository {
    store: Arc<Store>,
}

impl Default for MemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::new()))
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Task> {
        self.store
            .tasks
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("task", id))
    }

    async fn create(&self, new: NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            return Err(OrchestratorError::empty_field("title"));
        }
        if !(1..=10).contains(&new.complexity) {
            return Err(OrchestratorError::Validation(format!(
                "complexity {} out of range 1..=10",
                new.complexity
            )));
        }
        if let Some(project_id) = new.project_id {
            if !self.store.projects.lock().contains_key(&project_id) {
                return Err(OrchestratorError::not_found("project", project_id));
            }
        }
        if let Some(feature_id) = new.feature_id {
            if !self.store.features.lock().contains_key(&feature_id) {
                return Err(OrchestratorError::not_found("feature", feature_id));
            }
        }
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            summary: new.summary,
            status: new.status.unwrap_or(TaskStatus::Pending),
            priority: new.priority,
            complexity: new.complexity,
            project_id: new.project_id,
            feature_id: new.feature_id,
            requires_verification: new.requires_verification,
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        self.store.tasks.lock().insert(task.id, task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, update: UpdateTask) -> Result<Task> {
        if let Some(Some(feature_id)) = update.feature_id {
            if !self.store.features.lock().contains_key(&feature_id) {
                return Err(OrchestratorError::not_found("feature", feature_id));
            }
        }
        if let Some(complexity) = update.complexity {
            if !(1..=10).contains(&complexity) {
                return Err(OrchestratorError::Validation(format!(
                    "complexity {complexity} out of range 1..=10"
                )));
            }
        }
        let mut tasks = self.store.tasks.lock();
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::not_found("task", id))?;
        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(OrchestratorError::empty_field("title"));
            }
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(summary) = update.summary {
            task.summary = summary;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(complexity) = update.complexity {
            task.complexity = complexity;
        }
        if let Some(project_id) = update.project_id {
            task.project_id = project_id;
        }
        if let Some(feature_id) = update.feature_id {
            task.feature_id = feature_id;
        }
        if let Some(requires_verification) = update.requires_verification {
            task.requires_verification = requires_verification;
        }
        if let Some(tags) = update.tags {
            task.tags = tags;
        }
        task.modified_at = Utc::now();
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.store
            .tasks
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("task", id))
    }

    async fn find_all(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .store
            .tasks
            .lock()
            .values()
            .filter(|t| filter.project_id.map_or(true, |id| t.project_id == Some(id)))
            .filter(|t| filter.feature_id.map_or(true, |id| t.feature_id == Some(id)))
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| {
                filter
                    .tag
                    .as_ref()
                    .map_or(true, |tag| t.tags.iter().any(|t| t == tag))
            })
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        if let Some(limit) = filter.limit {
            tasks.truncate(limit as usize);
        }
        Ok(tasks)
    }

    async fn find_by_feature_id(&self, feature_id: Uuid) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .store
            .tasks
            .lock()
            .values()
            .filter(|t| t.feature_id == Some(feature_id))
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    async fn find_by_project_id(&self, project_id: Uuid) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .store
            .tasks
            .lock()
            .values()
            .filter(|t| t.project_id == Some(project_id))
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_rejects_out_of_range_complexity() {
        let repo = MemoryTaskRepository::new();
        let err = repo
            .create(NewTask {
                title: "T".into(),
                complexity: 11,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn find_all_filters_by_status_and_tag() {
        let repo = MemoryTaskRepository::new();
        repo.create(NewTask {
            title: "A".into(),
            status: Some(TaskStatus::InProgress),
            tags: vec!["urgent".into()],
            ..Default::default()
        })
        .await
        .unwrap();
        repo.create(NewTask {
            title: "B".into(),
            status: Some(TaskStatus::Pending),
            ..Default::default()
        })
        .await
        .unwrap();

        let found = repo
            .find_all(TaskFilter {
                status: Some(TaskStatus::InProgress),
                tag: Some("urgent".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "A");
    }
}
