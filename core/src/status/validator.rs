//! `StatusValidator`: per-container status legality and transition validation
//! including prerequisite/dependency checks. Shaped after a state-transition
//! validator paired with a transition-legality match function, extended here
//! with role-aware prerequisite rules layered on top of plain adjacency.

use crate::error::{OrchestratorError, Result};
use crate::models::{ContainerType, DependencyType, FeatureStatus, ProjectStatus, TaskStatus};
use crate::repository::RepositoryContext;
use crate::status::progression::StatusProgressionService;
use crate::status::role::{is_role_at_or_beyond, normalize, Role};
use uuid::Uuid;

pub struct StatusValidator<'a> {
    progression: &'a StatusProgressionService,
}

impl<'a> StatusValidator<'a> {
    pub fn new(progression: &'a StatusProgressionService) -> Self {
        Self { progression }
    }

    /// Rule 1: the string must parse into the container's enum after
    /// normalization.
    pub fn validate_status(&self, status: &str, container_type: ContainerType) -> Result<()> {
        let ok = match container_type {
            ContainerType::Project => ProjectStatus::from_external(status).is_some(),
            ContainerType::Feature => FeatureStatus::from_external(status).is_some(),
            ContainerType::Task => TaskStatus::from_external(status).is_some(),
        };
        if ok {
            Ok(())
        } else {
            Err(OrchestratorError::invalid_status(status, &container_type.to_string()))
        }
    }

    /// Canonical external form list for the container type.
    pub fn get_allowed_statuses(&self, container_type: ContainerType) -> &'static [&'static str] {
        match container_type {
            ContainerType::Project => ProjectStatus::all(),
            ContainerType::Feature => FeatureStatus::all(),
            ContainerType::Task => TaskStatus::all(),
        }
    }

    /// `tags` selects the active flow; `context` supplies the repositories
    /// needed for prerequisite checks (rule 3).
    pub async fn validate_transition(
        &self,
        current_status: &str,
        new_status: &str,
        container_type: ContainerType,
        container_id: Uuid,
        context: &RepositoryContext,
        tags: &[String],
    ) -> Result<()> {
        let current = normalize(current_status);
        let new = normalize(new_status);

        // Rule 4: no-op transitions are always valid.
        if current == new {
            return Ok(());
        }

        // Rule 1: legal value for the container type.
        self.validate_status(&new, container_type)?;

        // Rule 2: adjacency or terminal-of-flow.
        let path = self
            .progression
            .get_flow_path(container_type, tags, &current)
            .ok_or_else(|| {
                OrchestratorError::Validation(format!(
                    "no flow matches {container_type} with tags {tags:?}"
                ))
            })?;

        let is_forward_adjacent = path.successor_of(&current) == Some(new.as_str());
        let is_terminal_of_flow = path.is_terminal(&new);
        let is_immediate_predecessor = path.predecessor_of(&current) == Some(new.as_str());

        if !(is_forward_adjacent || is_terminal_of_flow || is_immediate_predecessor) {
            return Err(OrchestratorError::invalid_transition(&current, &new));
        }

        // Rule 3: prerequisite checks, role-aware.
        match container_type {
            ContainerType::Task => {
                self.validate_task_prerequisites(container_id, &new, context, tags).await?;
            }
            ContainerType::Feature => {
                self.validate_feature_prerequisites(container_id, &new, context, tags).await?;
            }
            ContainerType::Project => {
                self.validate_project_prerequisites(container_id, &new, context, tags).await?;
            }
        }

        Ok(())
    }

    async fn validate_task_prerequisites(
        &self,
        task_id: Uuid,
        new_status: &str,
        context: &RepositoryContext,
        tags: &[String],
    ) -> Result<()> {
        let edges = context.dependencies.find_by_to_task_id(task_id).await?;
        for dep in edges.iter().filter(|d| d.dependency_type == DependencyType::Blocks) {
            let blocker = match context.tasks.get_by_id(dep.from_task_id).await {
                Ok(task) => task,
                // Missing blocker tasks are treated as satisfied.
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let blocker_role = self.progression.get_role_for_status(
                blocker.status.as_external(),
                ContainerType::Task,
                tags,
            );
            let threshold = dep.effective_unblock_role();
            if !is_role_at_or_beyond(&blocker_role, &threshold) && !is_role_at_or_beyond(&blocker_role, &Role::Terminal) {
                return Err(OrchestratorError::Validation(format!(
                    "task {task_id} cannot advance to '{new_status}': blocker task {} is at role '{blocker_role}', requires '{threshold}'",
                    dep.from_task_id
                )));
            }
        }
        Ok(())
    }

    async fn validate_feature_prerequisites(
        &self,
        feature_id: Uuid,
        new_status: &str,
        context: &RepositoryContext,
        tags: &[String],
    ) -> Result<()> {
        if !FeatureStatus::from_external(new_status)
            .map(|s| {
                self.progression
                    .get_flow_path(ContainerType::Feature, tags, s.as_external())
                    .map(|p| p.is_terminal(s.as_external()))
                    .unwrap_or(false)
            })
            .unwrap_or(false)
        {
            return Ok(());
        }
        let tasks = context.tasks.find_by_feature_id(feature_id).await?;
        let incomplete: Vec<Uuid> = tasks
            .iter()
            .filter(|t| {
                let role = self.progression.get_role_for_status(t.status.as_external(), ContainerType::Task, tags);
                !is_role_at_or_beyond(&role, &Role::Terminal)
            })
            .map(|t| t.id)
            .collect();
        if !incomplete.is_empty() {
            return Err(OrchestratorError::Validation(format!(
                "feature {feature_id} cannot advance to '{new_status}': {} task(s) not yet terminal ({:?})",
                incomplete.len(),
                incomplete
            )));
        }
        Ok(())
    }

    async fn validate_project_prerequisites(
        &self,
        project_id: Uuid,
        new_status: &str,
        context: &RepositoryContext,
        tags: &[String],
    ) -> Result<()> {
        if !ProjectStatus::from_external(new_status)
            .map(|s| {
                self.progression
                    .get_flow_path(ContainerType::Project, tags, s.as_external())
                    .map(|p| p.is_terminal(s.as_external()))
                    .unwrap_or(false)
            })
            .unwrap_or(false)
        {
            return Ok(());
        }
        let features = context.features.find_by_project_id(project_id).await?;
        let incomplete: Vec<Uuid> = features
            .iter()
            .filter(|f| {
                let role = self.progression.get_role_for_status(f.status.as_external(), ContainerType::Feature, tags);
                !is_role_at_or_beyond(&role, &Role::Terminal)
            })
            .map(|f| f.id)
            .collect();
        if !incomplete.is_empty() {
            return Err(OrchestratorError::Validation(format!(
                "project {project_id} cannot advance to '{new_status}': {} feature(s) not yet terminal ({:?})",
                incomplete.len(),
                incomplete
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_status_accepts_both_forms() {
        let progression = StatusProgressionService::default();
        let validator = StatusValidator::new(&progression);
        assert!(validator.validate_status("in-progress", ContainerType::Task).is_ok());
        assert!(validator.validate_status("IN_PROGRESS", ContainerType::Task).is_ok());
        assert!(validator.validate_status("bogus", ContainerType::Task).is_err());
    }

    #[test]
    fn allowed_statuses_match_enum() {
        let progression = StatusProgressionService::default();
        let validator = StatusValidator::new(&progression);
        assert_eq!(
            validator.get_allowed_statuses(ContainerType::Task),
            TaskStatus::all()
        );
    }
}
