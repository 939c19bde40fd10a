use super::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use orchestrator_core::error::{OrchestratorError, Result};
use orchestrator_core::models::{FeatureCounts, NewProject, Project, ProjectStatus};
use orchestrator_core::repository::ProjectRepository;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory `ProjectRepository`. A `parking_lot::Mutex<HashMap<..>>`,
/// id-keyed map, reading the shared `Store` for the feature-count rollup.
pub struct MemoryProjectRepository {
    store: Arc<Store>,
}

impl Default for MemoryProjectRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProjectRepository {
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::new()))
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ProjectRepository for MemoryProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Project> {
        self.store
            .projects
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("project", id))
    }

    async fn create(&self, new: NewProject) -> Result<Project> {
        if new.name.trim().is_empty() {
            return Err(OrchestratorError::empty_field("name"));
        }
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            summary: new.summary,
            status: new.status.unwrap_or(ProjectStatus::Planning),
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        self.store.projects.lock().insert(project.id, project.clone());
        Ok(project)
    }

    async fn update(&self, id: Uuid, update: orchestrator_core::models::UpdateProject) -> Result<Project> {
        let mut projects = self.store.projects.lock();
        let project = projects
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::not_found("project", id))?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(OrchestratorError::empty_field("name"));
            }
            project.name = name;
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        if let Some(summary) = update.summary {
            project.summary = summary;
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        if let Some(tags) = update.tags {
            project.tags = tags;
        }
        project.modified_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.store
            .projects
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("project", id))
    }

    async fn find_all(&self, limit: Option<u32>) -> Result<Vec<Project>> {
        let mut projects: Vec<Project> = self.store.projects.lock().values().cloned().collect();
        projects.sort_by_key(|p| p.created_at);
        if let Some(limit) = limit {
            projects.truncate(limit as usize);
        }
        Ok(projects)
    }

    async fn get_feature_counts_by_project_id(&self, project_id: Uuid) -> Result<FeatureCounts> {
        let features = self.store.features.lock();
        let mut counts = FeatureCounts::default();
        for feature in features.values() {
            if feature.project_id != Some(project_id) {
                continue;
            }
            counts.total += 1;
            if matches!(feature.status, orchestrator_core::models::FeatureStatus::Completed) {
                counts.completed += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let repo = MemoryProjectRepository::new();
        let err = repo
            .create(NewProject {
                name: "   ".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn get_by_id_round_trips() {
        let repo = MemoryProjectRepository::new();
        let created = repo
            .create(NewProject {
                name: "Orchestrator".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let repo = MemoryProjectRepository::new();
        let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn feature_counts_reflect_shared_store() {
        let store = Arc::new(Store::new());
        let projects = MemoryProjectRepository::with_store(store.clone());
        let project = projects
            .create(NewProject {
                name: "P".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let feature = orchestrator_core::models::Feature {
            id: Uuid::new_v4(),
            name: "F".into(),
            description: None,
            summary: String::new(),
            status: orchestrator_core::models::FeatureStatus::Completed,
            priority: orchestrator_core::models::Priority::Medium,
            project_id: Some(project.id),
            requires_verification: false,
            tags: vec![],
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        store.features.lock().insert(feature.id, feature);

        let counts = projects.get_feature_counts_by_project_id(project.id).await.unwrap();
        assert_eq!(counts.total, 1);
        assert_eq!(counts.completed, 1);
    }
}
