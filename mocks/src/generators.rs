//! Random test data generation: `fake`-backed realistic strings and
//! `proptest` strategies for entity fields.

use crate::builders::{FeatureBuilder, TaskBuilder};
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::Fake;
use orchestrator_core::models::{Feature, FeatureStatus, Priority, Task, TaskStatus};
use proptest::prelude::*;
use rand::Rng;

/// A realistic task/feature title.
pub fn generate_title() -> String {
    Sentence(3..8).fake()
}

/// A realistic multi-sentence description.
pub fn generate_description() -> String {
    Paragraph(2..5).fake()
}

/// A random tag from a small realistic pool.
pub fn generate_tag() -> String {
    let tags = ["backend", "frontend", "urgent", "tech-debt", "security", "docs"];
    tags[rand::thread_rng().gen_range(0..tags.len())].to_string()
}

/// A task with random (but always-valid) field values.
pub fn generate_random_task() -> Task {
    TaskBuilder::new()
        .with_title(generate_title())
        .with_status(generate_random_task_status())
        .with_complexity(rand::thread_rng().gen_range(1..=10))
        .build()
}

pub fn generate_random_task_status() -> TaskStatus {
    let statuses = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
        TaskStatus::Deferred,
    ];
    statuses[rand::thread_rng().gen_range(0..statuses.len())]
}

pub fn generate_random_feature_status() -> FeatureStatus {
    let statuses = [
        FeatureStatus::Planning,
        FeatureStatus::InDevelopment,
        FeatureStatus::Completed,
        FeatureStatus::Archived,
    ];
    statuses[rand::thread_rng().gen_range(0..statuses.len())]
}

/// A feature with random (but always-valid) field values.
pub fn generate_random_feature() -> Feature {
    FeatureBuilder::new()
        .with_name(generate_title())
        .with_status(generate_random_feature_status())
        .build()
}

/// Proptest strategy for `TaskStatus` — every variant, uniformly.
pub fn task_status_strategy() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Pending),
        Just(TaskStatus::InProgress),
        Just(TaskStatus::Completed),
        Just(TaskStatus::Cancelled),
        Just(TaskStatus::Deferred),
    ]
}

/// Proptest strategy for `Priority`.
pub fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
}

/// Proptest strategy for status strings in either external or internal form
/// — used by normalization idempotence tests.
pub fn status_string_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("in-progress".to_string()),
        Just("IN_PROGRESS".to_string()),
        Just("In_Progress".to_string()),
        Just("completed".to_string()),
        Just("COMPLETED".to_string()),
        Just("pending".to_string()),
    ]
}

/// Proptest strategy for a complete, internally-consistent task.
pub fn task_strategy() -> impl Strategy<Value = Task> {
    (
        "[A-Za-z ]{5,50}",
        task_status_strategy(),
        priority_strategy(),
        1u8..=10,
    )
        .prop_map(|(title, status, priority, complexity)| {
            TaskBuilder::new()
                .with_title(title)
                .with_status(status)
                .with_priority(priority)
                .with_complexity(complexity)
                .build()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_random_task_is_valid() {
        let task = generate_random_task();
        assert!(!task.title.is_empty());
        assert!((1..=10).contains(&task.complexity));
    }

    proptest! {
        #[test]
        fn task_strategy_always_produces_in_range_complexity(task in task_strategy()) {
            prop_assert!((1..=10).contains(&task.complexity));
        }
    }
}
