//! Standard fixtures for cascade/validator tests: a feature with a mix of
//! task statuses, a chain of blocking dependencies, and bulk task generation.

use crate::builders::{DependencyBuilder, FeatureBuilder, TaskBuilder};
use orchestrator_core::models::{DependencyType, Feature, FeatureStatus, Task, TaskStatus};
use uuid::Uuid;

/// A single task in `Pending` status, not attached to any feature.
pub fn create_test_task() -> Task {
    TaskBuilder::new().build()
}

/// A task in the given status.
pub fn create_test_task_with_status(status: TaskStatus) -> Task {
    TaskBuilder::new().with_status(status).build()
}

/// `count` distinct tasks cycling through every `TaskStatus` variant, all
/// attached to `feature_id`.
pub fn create_test_tasks(count: usize, feature_id: Uuid) -> Vec<Task> {
    let statuses = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
        TaskStatus::Deferred,
    ];
    (0..count)
        .map(|i| {
            TaskBuilder::new()
                .with_title(format!("Task {i}"))
                .with_status(statuses[i % statuses.len()])
                .with_feature_id(feature_id)
                .build()
        })
        .collect()
}

/// A feature at `planning` with no tasks yet — the starting point for a
/// `first_task_started` cascade scenario.
pub fn feature_at_planning() -> Feature {
    FeatureBuilder::new().with_status(FeatureStatus::Planning).build()
}

/// A feature with `total` tasks, `completed` of which are `Completed` and
/// the rest `Pending` — the shape `all_tasks_complete` detection reads.
pub fn feature_with_task_mix(total: usize, completed: usize) -> (Feature, Vec<Task>) {
    let feature = FeatureBuilder::new()
        .with_status(FeatureStatus::InDevelopment)
        .build();
    let tasks = (0..total)
        .map(|i| {
            let status = if i < completed {
                TaskStatus::Completed
            } else {
                TaskStatus::Pending
            };
            TaskBuilder::new()
                .with_title(format!("Task {i}"))
                .with_status(status)
                .with_feature_id(feature.id)
                .build()
        })
        .collect();
    (feature, tasks)
}

/// Task `a` BLOCKS both `b` and `c`: completing `a` should unblock both,
/// unless a caller adds a second blocker on top.
pub fn blocking_chain() -> (Task, Task, Task, Vec<orchestrator_core::models::Dependency>) {
    let a = TaskBuilder::new().with_title("A").build();
    let b = TaskBuilder::new().with_title("B").build();
    let c = TaskBuilder::new().with_title("C").build();
    let deps = vec![
        DependencyBuilder::new(a.id, b.id)
            .with_type(DependencyType::Blocks)
            .build(),
        DependencyBuilder::new(a.id, c.id)
            .with_type(DependencyType::Blocks)
            .build(),
    ];
    (a, b, c, deps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_with_task_mix_has_requested_counts() {
        let (feature, tasks) = feature_with_task_mix(4, 3);
        assert_eq!(tasks.len(), 4);
        assert_eq!(
            tasks.iter().filter(|t| t.status == TaskStatus::Completed).count(),
            3
        );
        assert!(tasks.iter().all(|t| t.feature_id == Some(feature.id)));
    }

    #[test]
    fn blocking_chain_links_a_to_b_and_c() {
        let (a, b, c, deps) = blocking_chain();
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().all(|d| d.from_task_id == a.id));
        assert_eq!(deps[0].to_task_id, b.id);
        assert_eq!(deps[1].to_task_id, c.id);
    }
}
