//! Repository contracts: typed CRUD and relational queries for every entity
//! kind, specified only at their interface. Shaped after an async-trait
//! repository with doc-commented per-method contracts and a rollup struct
//! returned alongside plain CRUD.

use crate::{
    error::Result,
    models::{
        Dependency, Feature, FeatureCounts, NewDependency, NewFeature, NewProject, NewSection,
        NewTask, Project, Section, SectionEntityType, Task, TaskCounts, TaskFilter, Template,
        TemplateSection, UpdateFeature, UpdateProject, UpdateSection, UpdateTask,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Project>;
    async fn create(&self, new: NewProject) -> Result<Project>;
    async fn update(&self, id: Uuid, update: UpdateProject) -> Result<Project>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn find_all(&self, limit: Option<u32>) -> Result<Vec<Project>>;

    /// Rollup consumed by `CascadeService` when a feature reaches terminal
    /// status.
    async fn get_feature_counts_by_project_id(&self, project_id: Uuid) -> Result<FeatureCounts>;
}

#[async_trait]
pub trait FeatureRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Feature>;
    async fn create(&self, new: NewFeature) -> Result<Feature>;
    async fn update(&self, id: Uuid, update: UpdateFeature) -> Result<Feature>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn find_all(&self, limit: Option<u32>) -> Result<Vec<Feature>>;
    async fn find_by_project_id(&self, project_id: Uuid) -> Result<Vec<Feature>>;

    /// Rollup consumed by `CascadeService` when a task reaches terminal
    /// status.
    async fn get_task_counts_by_feature_id(&self, feature_id: Uuid) -> Result<TaskCounts>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Task>;
    async fn create(&self, new: NewTask) -> Result<Task>;
    async fn update(&self, id: Uuid, update: UpdateTask) -> Result<Task>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn find_all(&self, filter: TaskFilter) -> Result<Vec<Task>>;
    async fn find_by_feature_id(&self, feature_id: Uuid) -> Result<Vec<Task>>;
    async fn find_by_project_id(&self, project_id: Uuid) -> Result<Vec<Task>>;
}

#[async_trait]
pub trait DependencyRepository: Send + Sync {
    async fn create(&self, new: NewDependency) -> Result<Dependency>;
    async fn get_by_id(&self, id: Uuid) -> Result<Dependency>;
    async fn find_by_from_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>>;
    async fn find_by_to_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>>;
    /// Every edge touching `task_id`, either side.
    async fn find_by_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    /// Deletes every edge touching `task_id`; returns the number removed.
    async fn delete_by_task_id(&self, task_id: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait SectionRepository: Send + Sync {
    async fn get_section(&self, id: Uuid) -> Result<Section>;
    async fn get_sections_for_entity(
        &self,
        entity_type: SectionEntityType,
        entity_id: Uuid,
    ) -> Result<Vec<Section>>;
    async fn add_section(&self, new: NewSection) -> Result<Section>;
    async fn update_section(&self, id: Uuid, update: UpdateSection) -> Result<Section>;
    async fn delete_section(&self, id: Uuid) -> Result<()>;
    /// Deletes every section attached to the entity; returns the number
    /// removed. Used by `CompletionCleanupService` and cascade deletes.
    async fn delete_sections_for_entity(
        &self,
        entity_type: SectionEntityType,
        entity_id: Uuid,
    ) -> Result<u64>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn get_template(&self, id: Uuid) -> Result<Template>;
    async fn get_template_sections(&self, template_id: Uuid) -> Result<Vec<TemplateSection>>;
}

/// The repository handle set shared by `StatusValidator`, `CascadeService`,
/// `CompletionCleanupService`, and the template engine. Bundles the four main
/// repositories (projects/features/tasks/dependencies) that transition
/// validation needs; sections and templates are added here too since cascade
/// cleanup and template application are wired through the same context
/// rather than threading a second bundle type through the call chain.
#[derive(Clone)]
pub struct RepositoryContext {
    pub projects: Arc<dyn ProjectRepository>,
    pub features: Arc<dyn FeatureRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub dependencies: Arc<dyn DependencyRepository>,
    pub sections: Arc<dyn SectionRepository>,
    pub templates: Arc<dyn TemplateRepository>,
}
