//! `CompletionCleanupService`: deletes or retains a feature's tasks once it
//! reaches a terminal status, following the FK-safe delete order (dependency
//! edges, then sections, then the task itself) a cascading-delete path
//! around task/section/dependency ownership needs.

use crate::config::CleanupConfig;
use crate::error::Result;
use crate::models::{ContainerType, SectionEntityType};
use crate::repository::RepositoryContext;
use crate::status::progression::StatusProgressionService;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupResult {
    pub tasks_deleted: u64,
    pub tasks_retained: u64,
    pub retained_task_ids: Vec<Uuid>,
    pub sections_deleted: u64,
    pub dependencies_deleted: u64,
    pub reason: String,
    pub performed: bool,
}

pub struct CompletionCleanupService<'a> {
    progression: &'a StatusProgressionService,
    config: CleanupConfig,
}

impl<'a> CompletionCleanupService<'a> {
    pub fn new(progression: &'a StatusProgressionService, config: CleanupConfig) -> Self {
        Self { progression, config }
    }

    pub async fn cleanup_feature_tasks(
        &self,
        feature_id: Uuid,
        target_status: &str,
        context: &RepositoryContext,
    ) -> Result<Option<CleanupResult>> {
        let feature = context.features.get_by_id(feature_id).await?;
        let is_terminal = self
            .progression
            .get_flow_path(ContainerType::Feature, &feature.tags, &feature.status.to_string())
            .map(|path| path.is_terminal(target_status))
            .unwrap_or(false);

        if !is_terminal {
            return Ok(None);
        }

        let tasks = context.tasks.find_by_feature_id(feature_id).await?;

        let mut result = CleanupResult {
            tasks_deleted: 0,
            tasks_retained: 0,
            retained_task_ids: Vec::new(),
            sections_deleted: 0,
            dependencies_deleted: 0,
            reason: format!("feature reached terminal status '{target_status}'"),
            performed: true,
        };

        for task in tasks {
            let keep = task.requires_verification
                || task.tags.iter().any(|t| self.config.keep_tags.iter().any(|k| k == t));

            if keep {
                result.tasks_retained += 1;
                result.retained_task_ids.push(task.id);
                continue;
            }

            // FK-safe order: dependencies, then sections, then the task itself.
            result.dependencies_deleted += context.dependencies.delete_by_task_id(task.id).await?;
            result.sections_deleted += context
                .sections
                .delete_sections_for_entity(SectionEntityType::Task, task.id)
                .await?;
            context.tasks.delete(task.id).await?;
            result.tasks_deleted += 1;
        }

        Ok(Some(result))
    }
}
