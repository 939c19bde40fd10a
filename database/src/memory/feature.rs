use super::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use orchestrator_core::error::{OrchestratorError, Result};
use orchestrator_core::models::{
    Feature, FeatureStatus, NewFeature, TaskCounts, TaskStatus, UpdateFeature,
};
use orchestrator_core::repository::FeatureRepository;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory `FeatureRepository`, reading the shared `Store`'s tasks table
/// for the task-count rollup `CascadeService` needs for
/// `all_tasks_complete`/role-aggregation detection.
pub struct MemoryFeatureRepository {
    store: Arc<Store>,
}

impl Default for MemoryFeatureRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFeatureRepository {
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::new()))
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FeatureRepository for MemoryFeatureRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Feature> {
        self.store
            .features
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("feature", id))
    }

    async fn create(&self, new: NewFeature) -> Result<Feature> {
        if new.name.trim().is_empty() {
            return Err(OrchestratorError::empty_field("name"));
        }
        if let Some(project_id) = new.project_id {
            if !self.store.projects.lock().contains_key(&project_id) {
                return Err(OrchestratorError::not_found("project", project_id));
            }
        }
        let now = Utc::now();
        let feature = Feature {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            summary: new.summary,
            status: new.status.unwrap_or(FeatureStatus::Planning),
            priority: new.priority,
            project_id: new.project_id,
            requires_verification: new.requires_verification,
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        self.store.features.lock().insert(feature.id, feature.clone());
        Ok(feature)
    }

    async fn update(&self, id: Uuid, update: UpdateFeature) -> Result<Feature> {
        if let Some(Some(project_id)) = update.project_id {
            if !self.store.projects.lock().contains_key(&project_id) {
                return Err(OrchestratorError::not_found("project", project_id));
            }
        }
        let mut features = self.store.features.lock();
        let feature = features
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::not_found("feature", id))?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(OrchestratorError::empty_field("name"));
            }
            feature.name = name;
        }
        if let Some(description) = update.description {
            feature.description = description;
        }
        if let Some(summary) = update.summary {
            feature.summary = summary;
        }
        if let Some(status) = update.status {
            feature.status = status;
        }
        if let Some(priority) = update.priority {
            feature.priority = priority;
        }
        if let Some(project_id) = update.project_id {
            feature.project_id = project_id;
        }
        if let Some(requires_verification) = update.requires_verification {
            feature.requires_verification = requires_verification;
        }
        if let Some(tags) = update.tags {
            feature.tags = tags;
        }
        feature.modified_at = Utc::now();
        Ok(feature.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.store
            .features
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("feature", id))
    }

    async fn find_all(&self, limit: Option<u32>) -> Result<Vec<Feature>> {
        let mut features: Vec<Feature> = self.store.features.lock().values().cloned().collect();
        features.sort_by_key(|f| f.created_at);
        if let Some(limit) = limit {
            features.truncate(limit as usize);
        }
        Ok(features)
    }

    async fn find_by_project_id(&self, project_id: Uuid) -> Result<Vec<Feature>> {
        let mut features: Vec<Feature> = self
            .store
            .features
            .lock()
            .values()
            .filter(|f| f.project_id == Some(project_id))
            .cloned()
            .collect();
        features.sort_by_key(|f| f.created_at);
        Ok(features)
    }

    async fn get_task_counts_by_feature_id(&self, feature_id: Uuid) -> Result<TaskCounts> {
        let tasks = self.store.tasks.lock();
        let mut counts = TaskCounts::default();
        for task in tasks.values() {
            if task.feature_id != Some(feature_id) {
                continue;
            }
            counts.total += 1;
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Cancelled => counts.cancelled += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                _ => {}
            }
        }
        Ok(counts)
    }
}
