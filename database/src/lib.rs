//! In-process repository implementations for the task-orchestration engine.
//!
//! No SQL schema, migrations, or ORM here — only the repository contracts
//! matter, so this crate ships a thread-safe in-memory implementation of
//! every `orchestrator_core::repository` trait rather than standing up a
//! database. The pattern — a `parking_lot::Mutex<HashMap<Uuid, T>>` per
//! entity kind — is a test-double shape promoted to shipped reference
//! implementation.

mod memory;

pub use memory::dependency::MemoryDependencyRepository;
pub use memory::feature::MemoryFeatureRepository;
pub use memory::project::MemoryProjectRepository;
pub use memory::section::MemorySectionRepository;
pub use memory::task::MemoryTaskRepository;
pub use memory::template::MemoryTemplateRepository;

use memory::store::Store;
use orchestrator_core::repository::RepositoryContext;
use std::sync::Arc;

/// Builds a `RepositoryContext` backed entirely by the in-memory
/// implementations in this crate, empty of data. All six repositories share
/// one `Store` so that `ProjectRepository::get_feature_counts_by_project_id`
/// and `FeatureRepository::get_task_counts_by_feature_id` see writes made
/// through the sibling repositories.
pub fn in_memory_repository_context() -> RepositoryContext {
    let store = Arc::new(Store::new());
    RepositoryContext {
        projects: Arc::new(MemoryProjectRepository::with_store(store.clone())),
        features: Arc::new(MemoryFeatureRepository::with_store(store.clone())),
        tasks: Arc::new(MemoryTaskRepository::with_store(store.clone())),
        dependencies: Arc::new(MemoryDependencyRepository::with_store(store.clone())),
        sections: Arc::new(MemorySectionRepository::with_store(store.clone())),
        templates: Arc::new(MemoryTemplateRepository::with_store(store)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shared_context_rollups_see_sibling_writes() {
        use orchestrator_core::models::{NewFeature, NewProject};
        use orchestrator_core::repository::{FeatureRepository, ProjectRepository};

        let ctx = in_memory_repository_context();
        let project = ctx
            .projects
            .create(NewProject {
                name: "P".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        ctx.features
            .create(NewFeature {
                name: "F".into(),
                project_id: Some(project.id),
                ..Default::default()
            })
            .await
            .unwrap();

        let counts = ctx
            .projects
            .get_feature_counts_by_project_id(project.id)
            .await
            .unwrap();
        assert_eq!(counts.total, 1);
    }
}
