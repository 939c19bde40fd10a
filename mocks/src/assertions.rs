//! Custom assertion helpers for comparing tasks in tests.

use orchestrator_core::models::{Task, TaskStatus};
use orchestrator_core::status::Role;

/// Assert two tasks are equal ignoring timestamps.
pub fn assert_task_equals(actual: &Task, expected: &Task) {
    assert_eq!(actual.id, expected.id, "task ids don't match");
    assert_eq!(actual.title, expected.title, "task titles don't match");
    assert_eq!(actual.status, expected.status, "task statuses don't match");
    assert_eq!(
        actual.feature_id, expected.feature_id,
        "task feature_ids don't match"
    );
}

/// Partial matcher for a task, used when only a few fields matter.
#[derive(Default)]
pub struct TaskMatcher {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub feature_id: Option<Option<uuid::Uuid>>,
}

pub fn assert_task_matches(task: &Task, matcher: &TaskMatcher) {
    if let Some(ref title) = matcher.title {
        assert_eq!(&task.title, title, "task title doesn't match expected");
    }
    if let Some(status) = matcher.status {
        assert_eq!(task.status, status, "task status doesn't match expected");
    }
    if let Some(feature_id) = matcher.feature_id {
        assert_eq!(
            task.feature_id, feature_id,
            "task feature_id doesn't match expected"
        );
    }
}

/// Assert a role is at or beyond a named threshold, with a readable message
/// (wraps `orchestrator_core::status::role::is_role_at_or_beyond`).
pub fn assert_role_at_or_beyond(role: &Role, threshold: &Role) {
    assert!(
        orchestrator_core::status::role::is_role_at_or_beyond(role, threshold),
        "expected role '{role}' to be at or beyond '{threshold}'"
    );
}
