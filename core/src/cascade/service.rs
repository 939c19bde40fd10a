//! `CascadeService`: the heart of the engine. Detects which *other* entities
//! should change status as a consequence of a container's state change,
//! optionally applies those changes with bounded recursion, reports
//! downstream unblocked tasks, and runs completion cleanup. Structured as a
//! service holding injected repositories, with a detect/apply/recurse shape
//! for the cascade engine.

use crate::cascade::cleanup::{CleanupResult, CompletionCleanupService};
use crate::config::{AutoCascadeConfig, CleanupConfig};
use crate::error::Result;
use crate::models::{ContainerType, DependencyType};
use crate::repository::RepositoryContext;
use crate::status::progression::{NextStatusRecommendation, StatusProgressionService};
use crate::status::role::{is_role_at_or_beyond, Role};
use crate::status::validator::StatusValidator;
use crate::tools::locking::{key_for, HeldLocks, LockRegistry};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CascadeEventKind {
    FirstTaskStarted,
    AllTasksComplete,
    AllFeaturesComplete,
    RoleAggregationThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeEvent {
    pub event: CascadeEventKind,
    pub target_type: ContainerType,
    pub target_id: Uuid,
    pub target_name: String,
    pub current_status: String,
    pub suggested_status: String,
    pub flow: String,
    pub automatic: bool,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnblockedTask {
    pub task_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedCascade {
    pub event: CascadeEvent,
    pub applied: bool,
    pub error: Option<String>,
    pub new_status: Option<String>,
    pub unblocked_tasks: Vec<UnblockedTask>,
    pub cleanup: Option<CleanupResult>,
    pub child_cascades: Vec<AppliedCascade>,
}

pub struct CascadeService {
    context: RepositoryContext,
    progression: StatusProgressionService,
    config: AutoCascadeConfig,
    cleanup_config: CleanupConfig,
    locks: LockRegistry,
}

impl CascadeService {
    pub fn new(
        context: RepositoryContext,
        progression: StatusProgressionService,
        config: AutoCascadeConfig,
        cleanup_config: CleanupConfig,
    ) -> Self {
        Self::with_lock_registry(context, progression, config, cleanup_config, LockRegistry::new())
    }

    /// Like [`Self::new`], but shares `locks` with the caller instead of
    /// starting a fresh registry — required so that advisory locks actually
    /// serialize writes across separate tool calls rather than resetting
    /// every time a short-lived `CascadeService` is built.
    pub fn with_lock_registry(
        context: RepositoryContext,
        progression: StatusProgressionService,
        config: AutoCascadeConfig,
        cleanup_config: CleanupConfig,
        locks: LockRegistry,
    ) -> Self {
        Self { context, progression, config, cleanup_config, locks }
    }

    /// A pure detector: it never writes.
    pub async fn detect_cascade_events(
        &self,
        container_id: Uuid,
        container_type: ContainerType,
    ) -> Result<Vec<CascadeEvent>> {
        match container_type {
            ContainerType::Task => self.detect_task_events(container_id).await,
            ContainerType::Feature => self.detect_feature_events(container_id).await,
            ContainerType::Project => Ok(Vec::new()),
        }
    }

    async fn detect_task_events(&self, task_id: Uuid) -> Result<Vec<CascadeEvent>> {
        let task = self.context.tasks.get_by_id(task_id).await?;
        let Some(feature_id) = task.feature_id else {
            return Ok(Vec::new());
        };
        let feature = self.context.features.get_by_id(feature_id).await?;
        let counts = self.context.features.get_task_counts_by_feature_id(feature_id).await?;
        let task_role = self.progression.get_role_for_status(task.status.as_external(), ContainerType::Task, &task.tags);

        let mut events = Vec::new();

        // first_task_started
        if task_role == Role::Work {
            let feature_path = self.progression.get_flow_path(ContainerType::Feature, &feature.tags, &feature.status.to_string());
            if let Some(path) = feature_path {
                let feature_is_at_entry = path.is_first(feature.status.as_external());
                let tasks = self.context.tasks.find_by_feature_id(feature_id).await?;
                let at_work_count = tasks
                    .iter()
                    .filter(|t| {
                        self.progression.get_role_for_status(t.status.as_external(), ContainerType::Task, &t.tags) == Role::Work
                    })
                    .count();
                if feature_is_at_entry && at_work_count == 1 {
                    if let NextStatusRecommendation::Ready { recommended_status, active_flow, .. } =
                        self.progression.get_next_status(feature.status.as_external(), ContainerType::Feature, &feature.tags, &[])
                    {
                        events.push(CascadeEvent {
                            event: CascadeEventKind::FirstTaskStarted,
                            target_type: ContainerType::Feature,
                            target_id: feature_id,
                            target_name: feature.name.clone(),
                            current_status: feature.status.as_external().to_string(),
                            suggested_status: recommended_status.to_string(),
                            flow: active_flow.to_string(),
                            automatic: true,
                            reason: format!("first task '{}' started work in feature '{}'", task.title, feature.name),
                        });
                    }
                }
            }
        }

        // all_tasks_complete
        if is_role_at_or_beyond(&task_role, &Role::Terminal) && counts.terminal() == counts.total && counts.total > 0 {
            if let NextStatusRecommendation::Ready { recommended_status, active_flow, .. } =
                self.progression.get_next_status(feature.status.as_external(), ContainerType::Feature, &feature.tags, &[])
            {
                events.push(CascadeEvent {
                    event: CascadeEventKind::AllTasksComplete,
                    target_type: ContainerType::Feature,
                    target_id: feature_id,
                    target_name: feature.name.clone(),
                    current_status: feature.status.as_external().to_string(),
                    suggested_status: recommended_status.to_string(),
                    flow: active_flow.to_string(),
                    automatic: true,
                    reason: format!(
                        "all {} task(s) in feature '{}' reached a terminal status",
                        counts.total, feature.name
                    ),
                });
            }
        }

        // role_aggregation_threshold (optional, configured)
        if self.config.role_aggregation.enabled && counts.total > 0 {
            let tasks = self.context.tasks.find_by_feature_id(feature_id).await?;
            for rule in self.config.role_aggregation.rules.iter().filter(|r| r.is_valid()) {
                let at_or_beyond = tasks
                    .iter()
                    .filter(|t| {
                        let role = self.progression.get_role_for_status(t.status.as_external(), ContainerType::Task, &t.tags);
                        is_role_at_or_beyond(&role, &rule.role_threshold)
                    })
                    .count();
                let ratio = at_or_beyond as f64 / counts.total as f64;
                if ratio >= rule.percentage && feature.status.as_external() != rule.target_feature_status {
                    let pct = (ratio * 100.0).round() as i64;
                    let threshold_pct = (rule.percentage * 100.0).round() as i64;
                    events.push(CascadeEvent {
                        event: CascadeEventKind::RoleAggregationThreshold,
                        target_type: ContainerType::Feature,
                        target_id: feature_id,
                        target_name: feature.name.clone(),
                        current_status: feature.status.as_external().to_string(),
                        suggested_status: rule.target_feature_status.clone(),
                        flow: "default".to_string(),
                        automatic: true,
                        reason: format!(
                            "{pct}% of tasks at role '{}' or beyond (threshold: {threshold_pct}%)",
                            rule.role_threshold
                        ),
                    });
                }
            }
        }

        Ok(events)
    }

    async fn detect_feature_events(&self, feature_id: Uuid) -> Result<Vec<CascadeEvent>> {
        let feature = self.context.features.get_by_id(feature_id).await?;
        let role = self.progression.get_role_for_status(feature.status.as_external(), ContainerType::Feature, &feature.tags);
        if !is_role_at_or_beyond(&role, &Role::Terminal) {
            return Ok(Vec::new());
        }
        let Some(project_id) = feature.project_id else {
            return Ok(Vec::new());
        };
        let project = self.context.projects.get_by_id(project_id).await?;
        if project.status.as_external() == "completed" {
            return Ok(Vec::new());
        }
        let counts = self.context.projects.get_feature_counts_by_project_id(project_id).await?;
        if counts.total > 0 && counts.completed == counts.total {
            if let NextStatusRecommendation::Ready { recommended_status, active_flow, .. } =
                self.progression.get_next_status(project.status.as_external(), ContainerType::Project, &project.tags, &[])
            {
                return Ok(vec![CascadeEvent {
                    event: CascadeEventKind::AllFeaturesComplete,
                    target_type: ContainerType::Project,
                    target_id: project_id,
                    target_name: project.name.clone(),
                    current_status: project.status.as_external().to_string(),
                    suggested_status: recommended_status.to_string(),
                    flow: active_flow.to_string(),
                    automatic: true,
                    reason: format!("all {} feature(s) of project '{}' are completed", counts.total, project.name),
                }]);
            }
        }
        Ok(Vec::new())
    }

    /// Exceptions are swallowed and an empty list returned — this check is
    /// defensive, not core-critical.
    pub async fn find_newly_unblocked_tasks(&self, completed_task_id: Uuid) -> Vec<UnblockedTask> {
        self.find_newly_unblocked_tasks_inner(completed_task_id)
            .await
            .unwrap_or_default()
    }

    async fn find_newly_unblocked_tasks_inner(&self, completed_task_id: Uuid) -> Result<Vec<UnblockedTask>> {
        let outgoing = self.context.dependencies.find_by_from_task_id(completed_task_id).await?;
        let mut unblocked = Vec::new();

        for dep in outgoing.iter().filter(|d| d.dependency_type == DependencyType::Blocks) {
            let downstream_id = dep.to_task_id;
            let downstream = match self.context.tasks.get_by_id(downstream_id).await {
                Ok(t) => t,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let downstream_role = self.progression.get_role_for_status(
                downstream.status.as_external(),
                ContainerType::Task,
                &downstream.tags,
            );
            if is_role_at_or_beyond(&downstream_role, &Role::Terminal) {
                continue;
            }

            let incoming = self.context.dependencies.find_by_to_task_id(downstream_id).await?;
            let mut all_satisfied = true;
            for edge in incoming.iter().filter(|d| d.dependency_type == DependencyType::Blocks) {
                let blocker = match self.context.tasks.get_by_id(edge.from_task_id).await {
                    Ok(t) => t,
                    // Missing blocker tasks are treated as satisfied.
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(e),
                };
                let blocker_role = self.progression.get_role_for_status(
                    blocker.status.as_external(),
                    ContainerType::Task,
                    &blocker.tags,
                );
                let threshold = edge.effective_unblock_role();
                if !is_role_at_or_beyond(&blocker_role, &threshold) {
                    all_satisfied = false;
                    break;
                }
            }

            if all_satisfied {
                unblocked.push(UnblockedTask { task_id: downstream.id, title: downstream.title.clone() });
            }
        }

        Ok(unblocked)
    }

    /// Recursion is boxed because async fns cannot recurse directly without
    /// infinite-sized futures — the depth parameter stays the only state
    /// threaded through.
    pub fn apply_cascades(
        &self,
        container_id: Uuid,
        container_type: ContainerType,
        depth: u32,
        max_depth: u32,
    ) -> Pin<Box<dyn Future<Output = Vec<AppliedCascade>> + Send + '_>> {
        self.apply_cascades_held(container_id, container_type, depth, max_depth, HeldLocks::new())
    }

    /// The boxed-recursion entry point, threading the reentrancy set through
    /// so a cascade that loops back into an entity already on the call stack
    /// (feature -> project -> back to the same feature, say) does not
    /// deadlock against its own advisory lock.
    fn apply_cascades_held(
        &self,
        container_id: Uuid,
        container_type: ContainerType,
        depth: u32,
        max_depth: u32,
        held: HeldLocks,
    ) -> Pin<Box<dyn Future<Output = Vec<AppliedCascade>> + Send + '_>> {
        Box::pin(async move {
            if depth >= max_depth {
                warn!(depth, max_depth, "cascade recursion depth limit reached, stopping");
                return Vec::new();
            }

            let events = match self.detect_cascade_events(container_id, container_type).await {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "cascade detection failed, treating as no events");
                    return Vec::new();
                }
            };

            let mut applied = Vec::new();
            for event in events {
                applied.push(self.apply_one(event, depth, max_depth, &held).await);
            }
            applied
        })
    }

    async fn apply_one(&self, event: CascadeEvent, depth: u32, max_depth: u32, held: &HeldLocks) -> AppliedCascade {
        let key = key_for(event.target_type, event.target_id);
        let _guard = self.locks.acquire(key, held).await;
        let current = match self.current_status_of(event.target_type, event.target_id).await {
            Ok(s) => s,
            Err(e) => {
                return AppliedCascade {
                    event,
                    applied: false,
                    error: Some(e.to_string()),
                    new_status: None,
                    unblocked_tasks: Vec::new(),
                    cleanup: None,
                    child_cascades: Vec::new(),
                }
            }
        };

        if current == event.suggested_status {
            return AppliedCascade {
                event,
                applied: false,
                error: None,
                new_status: None,
                unblocked_tasks: Vec::new(),
                cleanup: None,
                child_cascades: Vec::new(),
            };
        }

        let tags = match self.tags_of(event.target_type, event.target_id).await {
            Ok(t) => t,
            Err(e) => {
                return AppliedCascade {
                    event,
                    applied: false,
                    error: Some(e.to_string()),
                    new_status: None,
                    unblocked_tasks: Vec::new(),
                    cleanup: None,
                    child_cascades: Vec::new(),
                }
            }
        };

        let validator = StatusValidator::new(&self.progression);
        if let Err(e) = validator
            .validate_transition(&current, &event.suggested_status, event.target_type, event.target_id, &self.context, &tags)
            .await
        {
            return AppliedCascade {
                event,
                applied: false,
                error: Some(e.to_string()),
                new_status: None,
                unblocked_tasks: Vec::new(),
                cleanup: None,
                child_cascades: Vec::new(),
            };
        }

        if let Err(e) = self.write_status(event.target_type, event.target_id, &event.suggested_status).await {
            return AppliedCascade {
                event,
                applied: false,
                error: Some(e.to_string()),
                new_status: None,
                unblocked_tasks: Vec::new(),
                cleanup: None,
                child_cascades: Vec::new(),
            };
        }

        let mut unblocked_tasks = Vec::new();
        if event.target_type == ContainerType::Task {
            let role = self.progression.get_role_for_status(&event.suggested_status, ContainerType::Task, &tags);
            if is_role_at_or_beyond(&role, &Role::Terminal) {
                unblocked_tasks = self.find_newly_unblocked_tasks(event.target_id).await;
            }
        }

        let mut cleanup = None;
        if event.target_type == ContainerType::Feature {
            let cleanup_service = CompletionCleanupService::new(&self.progression, self.cleanup_config.clone());
            cleanup = cleanup_service
                .cleanup_feature_tasks(event.target_id, &event.suggested_status, &self.context)
                .await
                .unwrap_or(None);
        }

        let child_held = held.with(key);
        let child_cascades = self
            .apply_cascades_held(event.target_id, event.target_type, depth + 1, max_depth, child_held)
            .await;

        let new_status = event.suggested_status.clone();
        AppliedCascade {
            event,
            applied: true,
            error: None,
            new_status: Some(new_status),
            unblocked_tasks,
            cleanup,
            child_cascades,
        }
    }

    async fn current_status_of(&self, container_type: ContainerType, id: Uuid) -> Result<String> {
        Ok(match container_type {
            ContainerType::Project => self.context.projects.get_by_id(id).await?.status.as_external().to_string(),
            ContainerType::Feature => self.context.features.get_by_id(id).await?.status.as_external().to_string(),
            ContainerType::Task => self.context.tasks.get_by_id(id).await?.status.as_external().to_string(),
        })
    }

    async fn tags_of(&self, container_type: ContainerType, id: Uuid) -> Result<Vec<String>> {
        Ok(match container_type {
            ContainerType::Project => self.context.projects.get_by_id(id).await?.tags,
            ContainerType::Feature => self.context.features.get_by_id(id).await?.tags,
            ContainerType::Task => self.context.tasks.get_by_id(id).await?.tags,
        })
    }

    async fn write_status(&self, container_type: ContainerType, id: Uuid, status: &str) -> Result<()> {
        match container_type {
            ContainerType::Project => {
                let parsed = crate::models::ProjectStatus::from_external(status)
                    .ok_or_else(|| crate::error::OrchestratorError::invalid_status(status, "project"))?;
                let update = crate::models::UpdateProject { status: Some(parsed), ..Default::default() };
                self.context.projects.update(id, update).await?;
            }
            ContainerType::Feature => {
                let parsed = crate::models::FeatureStatus::from_external(status)
                    .ok_or_else(|| crate::error::OrchestratorError::invalid_status(status, "feature"))?;
                let update = crate::models::UpdateFeature { status: Some(parsed), ..Default::default() };
                self.context.features.update(id, update).await?;
            }
            ContainerType::Task => {
                let parsed = crate::models::TaskStatus::from_external(status)
                    .ok_or_else(|| crate::error::OrchestratorError::invalid_status(status, "task"))?;
                let update = crate::models::UpdateTask { status: Some(parsed), ..Default::default() };
                self.context.tasks.update(id, update).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OrchestratorError;
    use crate::models::{
        Feature, FeatureCounts, NewDependency, NewFeature, NewProject, NewSection, NewTask,
        Project, Section, SectionEntityType, Task, TaskCounts, TaskFilter, Template,
        TemplateSection, UpdateFeature, UpdateProject, UpdateSection, UpdateTask,
    };
    use crate::repository::{
        DependencyRepository, FeatureRepository, ProjectRepository, SectionRepository,
        TaskRepository, TemplateRepository,
    };
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeProjects(Mutex<HashMap<Uuid, Project>>);
    #[async_trait::async_trait]
    impl ProjectRepository for FakeProjects {
        async fn get_by_id(&self, id: Uuid) -> Result<Project> {
            self.0.lock().unwrap().get(&id).cloned().ok_or_else(|| OrchestratorError::not_found("project", id))
        }
        async fn create(&self, _new: NewProject) -> Result<Project> {
            unimplemented!()
        }
        async fn update(&self, id: Uuid, update: UpdateProject) -> Result<Project> {
            let mut map = self.0.lock().unwrap();
            let p = map.get_mut(&id).ok_or_else(|| OrchestratorError::not_found("project", id))?;
            if let Some(status) = update.status {
                p.status = status;
            }
            Ok(p.clone())
        }
        async fn delete(&self, _id: Uuid) -> Result<()> {
            Ok(())
        }
        async fn find_all(&self, _limit: Option<u32>) -> Result<Vec<Project>> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }
        async fn get_feature_counts_by_project_id(&self, _project_id: Uuid) -> Result<FeatureCounts> {
            Ok(FeatureCounts::default())
        }
    }

    struct FakeFeatures(Mutex<HashMap<Uuid, Feature>>, Mutex<HashMap<Uuid, TaskCounts>>);
    #[async_trait::async_trait]
    impl FeatureRepository for FakeFeatures {
        async fn get_by_id(&self, id: Uuid) -> Result<Feature> {
            self.0.lock().unwrap().get(&id).cloned().ok_or_else(|| OrchestratorError::not_found("feature", id))
        }
        async fn create(&self, _new: NewFeature) -> Result<Feature> {
            unimplemented!()
        }
        async fn update(&self, id: Uuid, update: UpdateFeature) -> Result<Feature> {
            let mut map = self.0.lock().unwrap();
            let f = map.get_mut(&id).ok_or_else(|| OrchestratorError::not_found("feature", id))?;
            if let Some(status) = update.status {
                f.status = status;
            }
            Ok(f.clone())
        }
        async fn delete(&self, _id: Uuid) -> Result<()> {
            Ok(())
        }
        async fn find_all(&self, _limit: Option<u32>) -> Result<Vec<Feature>> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }
        async fn find_by_project_id(&self, _project_id: Uuid) -> Result<Vec<Feature>> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }
        async fn get_task_counts_by_feature_id(&self, feature_id: Uuid) -> Result<TaskCounts> {
            Ok(self.1.lock().unwrap().get(&feature_id).copied().unwrap_or_default())
        }
    }

    struct FakeTasks(Mutex<HashMap<Uuid, Task>>);
    #[async_trait::async_trait]
    impl TaskRepository for FakeTasks {
        async fn get_by_id(&self, id: Uuid) -> Result<Task> {
            self.0.lock().unwrap().get(&id).cloned().ok_or_else(|| OrchestratorError::not_found("task", id))
        }
        async fn create(&self, _new: NewTask) -> Result<Task> {
            unimplemented!()
        }
        async fn update(&self, id: Uuid, update: UpdateTask) -> Result<Task> {
            let mut map = self.0.lock().unwrap();
            let t = map.get_mut(&id).ok_or_else(|| OrchestratorError::not_found("task", id))?;
            if let Some(status) = update.status {
                t.status = status;
            }
            Ok(t.clone())
        }
        async fn delete(&self, _id: Uuid) -> Result<()> {
            Ok(())
        }
        async fn find_all(&self, _filter: TaskFilter) -> Result<Vec<Task>> {
            Ok(self.0.lock().unwrap().values().cloned().collect())
        }
        async fn find_by_feature_id(&self, feature_id: Uuid) -> Result<Vec<Task>> {
            Ok(self.0.lock().unwrap().values().filter(|t| t.feature_id == Some(feature_id)).cloned().collect())
        }
        async fn find_by_project_id(&self, _project_id: Uuid) -> Result<Vec<Task>> {
            Ok(Vec::new())
        }
    }

    struct FakeDependencies(Mutex<HashMap<Uuid, crate::models::Dependency>>);
    #[async_trait::async_trait]
    impl DependencyRepository for FakeDependencies {
        async fn create(&self, _new: NewDependency) -> Result<crate::models::Dependency> {
            unimplemented!()
        }
        async fn get_by_id(&self, id: Uuid) -> Result<crate::models::Dependency> {
            self.0.lock().unwrap().get(&id).cloned().ok_or_else(|| OrchestratorError::not_found("dependency", id))
        }
        async fn find_by_from_task_id(&self, task_id: Uuid) -> Result<Vec<crate::models::Dependency>> {
            Ok(self.0.lock().unwrap().values().filter(|d| d.from_task_id == task_id).cloned().collect())
        }
        async fn find_by_to_task_id(&self, task_id: Uuid) -> Result<Vec<crate::models::Dependency>> {
            Ok(self.0.lock().unwrap().values().filter(|d| d.to_task_id == task_id).cloned().collect())
        }
        async fn find_by_task_id(&self, task_id: Uuid) -> Result<Vec<crate::models::Dependency>> {
            Ok(self.0.lock().unwrap().values().filter(|d| d.from_task_id == task_id || d.to_task_id == task_id).cloned().collect())
        }
        async fn delete(&self, _id: Uuid) -> Result<()> {
            Ok(())
        }
        async fn delete_by_task_id(&self, _task_id: Uuid) -> Result<u64> {
            Ok(0)
        }
    }

    struct FakeSections;
    #[async_trait::async_trait]
    impl SectionRepository for FakeSections {
        async fn get_section(&self, id: Uuid) -> Result<Section> {
            Err(OrchestratorError::not_found("section", id))
        }
        async fn get_sections_for_entity(&self, _entity_type: SectionEntityType, _entity_id: Uuid) -> Result<Vec<Section>> {
            Ok(Vec::new())
        }
        async fn add_section(&self, _new: NewSection) -> Result<Section> {
            unimplemented!()
        }
        async fn update_section(&self, id: Uuid, _update: UpdateSection) -> Result<Section> {
            Err(OrchestratorError::not_found("section", id))
        }
        async fn delete_section(&self, _id: Uuid) -> Result<()> {
            Ok(())
        }
        async fn delete_sections_for_entity(&self, _entity_type: SectionEntityType, _entity_id: Uuid) -> Result<u64> {
            Ok(0)
        }
    }

    struct FakeTemplates;
    #[async_trait::async_trait]
    impl TemplateRepository for FakeTemplates {
        async fn get_template(&self, id: Uuid) -> Result<Template> {
            Err(OrchestratorError::not_found("template", id))
        }
        async fn get_template_sections(&self, _template_id: Uuid) -> Result<Vec<TemplateSection>> {
            Ok(Vec::new())
        }
    }

    fn make_feature(id: Uuid, status: crate::models::FeatureStatus, project_id: Option<Uuid>) -> Feature {
        Feature {
            id,
            name: "feature".to_string(),
            description: None,
            summary: String::new(),
            status,
            priority: crate::models::Priority::Medium,
            project_id,
            requires_verification: false,
            tags: Vec::new(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    fn make_task(id: Uuid, status: crate::models::TaskStatus, feature_id: Option<Uuid>) -> Task {
        Task {
            id,
            title: "task".to_string(),
            description: None,
            summary: String::new(),
            status,
            priority: crate::models::Priority::Medium,
            complexity: 5,
            project_id: None,
            feature_id,
            requires_verification: false,
            tags: Vec::new(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    fn make_context(
        features: HashMap<Uuid, Feature>,
        feature_counts: HashMap<Uuid, TaskCounts>,
        tasks: HashMap<Uuid, Task>,
        dependencies: HashMap<Uuid, crate::models::Dependency>,
    ) -> RepositoryContext {
        RepositoryContext {
            projects: std::sync::Arc::new(FakeProjects(Mutex::new(HashMap::new()))),
            features: std::sync::Arc::new(FakeFeatures(Mutex::new(features), Mutex::new(feature_counts))),
            tasks: std::sync::Arc::new(FakeTasks(Mutex::new(tasks))),
            dependencies: std::sync::Arc::new(FakeDependencies(Mutex::new(dependencies))),
            sections: std::sync::Arc::new(FakeSections),
            templates: std::sync::Arc::new(FakeTemplates),
        }
    }

    #[tokio::test]
    async fn first_task_started_suggests_feature_advance() {
        let feature_id = Uuid::new_v4();
        let task_id = Uuid::new_v4();
        let mut features = HashMap::new();
        features.insert(feature_id, make_feature(feature_id, crate::models::FeatureStatus::Planning, None));
        let mut tasks = HashMap::new();
        tasks.insert(task_id, make_task(task_id, crate::models::TaskStatus::InProgress, Some(feature_id)));
        let mut counts = HashMap::new();
        counts.insert(feature_id, TaskCounts { total: 3, completed: 0, cancelled: 0, in_progress: 1 });

        let context = make_context(features, counts, tasks, HashMap::new());
        let svc = CascadeService::new(
            context,
            StatusProgressionService::default(),
            AutoCascadeConfig::default(),
            CleanupConfig::default(),
        );

        let events = svc.detect_cascade_events(task_id, ContainerType::Task).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, CascadeEventKind::FirstTaskStarted);
        assert_eq!(events[0].suggested_status, "in-development");
    }

    #[tokio::test]
    async fn depth_guard_returns_empty_at_limit() {
        let context = make_context(HashMap::new(), HashMap::new(), HashMap::new(), HashMap::new());
        let svc = CascadeService::new(
            context,
            StatusProgressionService::default(),
            AutoCascadeConfig::default(),
            CleanupConfig::default(),
        );
        let result = svc.apply_cascades(Uuid::new_v4(), ContainerType::Feature, 3, 3).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn newly_unblocked_tasks_require_all_blockers_satisfied() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let z = Uuid::new_v4();

        let mut tasks = HashMap::new();
        tasks.insert(a, make_task(a, crate::models::TaskStatus::Completed, None));
        tasks.insert(b, make_task(b, crate::models::TaskStatus::Pending, None));
        tasks.insert(c, make_task(c, crate::models::TaskStatus::Pending, None));
        tasks.insert(z, make_task(z, crate::models::TaskStatus::Pending, None));

        let mut deps = HashMap::new();
        let dep_ab = crate::models::Dependency {
            id: Uuid::new_v4(),
            from_task_id: a,
            to_task_id: b,
            dependency_type: DependencyType::Blocks,
            unblock_at: None,
            created_at: Utc::now(),
        };
        let dep_zb = crate::models::Dependency {
            id: Uuid::new_v4(),
            from_task_id: z,
            to_task_id: b,
            dependency_type: DependencyType::Blocks,
            unblock_at: None,
            created_at: Utc::now(),
        };
        let dep_ac = crate::models::Dependency {
            id: Uuid::new_v4(),
            from_task_id: a,
            to_task_id: c,
            dependency_type: DependencyType::Blocks,
            unblock_at: None,
            created_at: Utc::now(),
        };
        deps.insert(dep_ab.id, dep_ab);
        deps.insert(dep_zb.id, dep_zb);
        deps.insert(dep_ac.id, dep_ac);

        let context = make_context(HashMap::new(), HashMap::new(), tasks, deps);
        let svc = CascadeService::new(
            context,
            StatusProgressionService::default(),
            AutoCascadeConfig::default(),
            CleanupConfig::default(),
        );

        let unblocked = svc.find_newly_unblocked_tasks(a).await;
        let ids: Vec<Uuid> = unblocked.iter().map(|u| u.task_id).collect();
        assert_eq!(ids, vec![c]);
    }
}
