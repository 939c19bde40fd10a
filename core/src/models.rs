use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three work-item kinds that carry a workflow status.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Project,
    Feature,
    Task,
}

impl std::fmt::Display for ContainerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerType::Project => write!(f, "project"),
            ContainerType::Feature => write!(f, "feature"),
            ContainerType::Task => write!(f, "task"),
        }
    }
}

/// Priority shared by features and tasks.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectStatus {
    Planning,
    InDevelopment,
    Completed,
    Archived,
}

/// Lifecycle status of a feature.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeatureStatus {
    Planning,
    InDevelopment,
    Completed,
    Archived,
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Deferred,
}

macro_rules! status_display {
    ($ty:ty, $($variant:ident => $external:literal),+ $(,)?) => {
        impl $ty {
            /// Canonical external (kebab-case) form, e.g. `in-development`.
            pub fn as_external(&self) -> &'static str {
                match self {
                    $(<$ty>::$variant => $external),+
                }
            }

            /// Parse the canonical external form. Accepts both kebab-case and
            /// the internal SCREAMING_SNAKE form via `crate::status::normalize`.
            pub fn from_external(s: &str) -> Option<Self> {
                let normalized = crate::status::role::normalize(s);
                match normalized.as_str() {
                    $($external => Some(<$ty>::$variant),)+
                    _ => None,
                }
            }

            /// All allowed values in canonical external form.
            pub fn all() -> &'static [&'static str] {
                &[$($external),+]
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_external())
            }
        }
    };
}

status_display!(
    ProjectStatus,
    Planning => "planning",
    InDevelopment => "in-development",
    Completed => "completed",
    Archived => "archived",
);

status_display!(
    FeatureStatus,
    Planning => "planning",
    InDevelopment => "in-development",
    Completed => "completed",
    Archived => "archived",
);

status_display!(
    TaskStatus,
    Pending => "pending",
    InProgress => "in-progress",
    Completed => "completed",
    Cancelled => "cancelled",
    Deferred => "deferred",
);

/// A top-level unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub summary: String,
    pub status: ProjectStatus,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A feature scoped to (optionally) a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feature {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub summary: String,
    pub status: FeatureStatus,
    pub priority: Priority,
    pub project_id: Option<Uuid>,
    pub requires_verification: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A unit of executable work scoped to (optionally) a project and a feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub summary: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// 1 (trivial) through 10 (very complex).
    pub complexity: u8,
    pub project_id: Option<Uuid>,
    pub feature_id: Option<Uuid>,
    pub requires_verification: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// The kind of relationship a dependency edge expresses.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DependencyType {
    Blocks,
    IsBlockedBy,
    RelatesTo,
}

/// A directed edge between two tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dependency {
    pub id: Uuid,
    pub from_task_id: Uuid,
    pub to_task_id: Uuid,
    pub dependency_type: DependencyType,
    /// Role threshold override for when this edge is considered satisfied;
    /// `None` means "the blocker must reach the terminal role".
    pub unblock_at: Option<crate::status::role::Role>,
    pub created_at: DateTime<Utc>,
}

impl Dependency {
    /// The role a blocker must reach for this edge to be considered satisfied.
    pub fn effective_unblock_role(&self) -> crate::status::role::Role {
        self.unblock_at.clone().unwrap_or(crate::status::role::Role::Terminal)
    }
}

/// The entity kinds a section can be attached to.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SectionEntityType {
    Project,
    Feature,
    Task,
    Template,
}

/// The content encoding of a section's body.
#[derive(Debug, Clone, Copy, Hash, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentFormat {
    Markdown,
    PlainText,
    Json,
    Code,
}

/// A piece of supporting documentation attached to a container or template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: Uuid,
    pub entity_type: SectionEntityType,
    pub entity_id: Uuid,
    pub title: String,
    pub usage_description: String,
    pub content: String,
    pub content_format: ContentFormat,
    pub ordinal: u32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A reusable set of section definitions applicable to one entity type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub target_entity_type: SectionEntityType,
    pub is_built_in: bool,
    pub is_protected: bool,
    pub is_enabled: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// One section definition belonging to a [`Template`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateSection {
    pub id: Uuid,
    pub template_id: Uuid,
    pub title: String,
    pub usage_description: String,
    pub content: String,
    pub content_format: ContentFormat,
    pub content_sample: Option<String>,
    pub is_required: bool,
    pub ordinal: u32,
    pub tags: Vec<String>,
}

// --- Create/update DTOs, mirroring the New*/Update* split used throughout ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub status: Option<ProjectStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub summary: Option<String>,
    pub status: Option<ProjectStatus>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewFeature {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub status: Option<FeatureStatus>,
    #[serde(default)]
    pub priority: Priority,
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub requires_verification: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateFeature {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub summary: Option<String>,
    pub status: Option<FeatureStatus>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<Uuid>>,
    pub requires_verification: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub summary: String,
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_complexity")]
    pub complexity: u8,
    pub project_id: Option<Uuid>,
    pub feature_id: Option<Uuid>,
    #[serde(default)]
    pub requires_verification: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_complexity() -> u8 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub summary: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub complexity: Option<u8>,
    pub project_id: Option<Option<Uuid>>,
    pub feature_id: Option<Option<Uuid>>,
    pub requires_verification: Option<bool>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDependency {
    pub from_task_id: Uuid,
    pub to_task_id: Uuid,
    pub dependency_type: DependencyType,
    pub unblock_at: Option<crate::status::role::Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSection {
    pub entity_type: SectionEntityType,
    pub entity_id: Uuid,
    pub title: String,
    pub usage_description: String,
    pub content: String,
    pub content_format: ContentFormat,
    pub ordinal: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UpdateSection {
    pub title: Option<String>,
    pub usage_description: Option<String>,
    pub content: Option<String>,
    pub content_format: Option<ContentFormat>,
    pub ordinal: Option<u32>,
    pub tags: Option<Vec<String>>,
}

/// Filter criteria for querying tasks. All fields are optional and combined
/// with AND logic when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub feature_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub tag: Option<String>,
    pub limit: Option<u32>,
}

/// Rollup of task counts under a single feature, used by cascade detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub in_progress: u64,
}

impl TaskCounts {
    /// Tasks that have reached a terminal status (completed or cancelled).
    pub fn terminal(&self) -> u64 {
        self.completed + self.cancelled
    }
}

/// Rollup of feature counts under a single project, used by cascade detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureCounts {
    pub total: u64,
    pub completed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_external_form() {
        for external in TaskStatus::all() {
            let parsed = TaskStatus::from_external(external).unwrap();
            assert_eq!(parsed.as_external(), *external);
        }
    }

    #[test]
    fn status_accepts_internal_form() {
        assert_eq!(
            TaskStatus::from_external("IN_PROGRESS"),
            Some(TaskStatus::InProgress)
        );
        assert_eq!(
            ProjectStatus::from_external("in_development"),
            Some(ProjectStatus::InDevelopment)
        );
    }

    #[test]
    fn unknown_status_is_none() {
        assert_eq!(TaskStatus::from_external("not-a-status"), None);
    }

    #[test]
    fn dependency_defaults_unblock_role_to_terminal() {
        let dep = Dependency {
            id: Uuid::new_v4(),
            from_task_id: Uuid::new_v4(),
            to_task_id: Uuid::new_v4(),
            dependency_type: DependencyType::Blocks,
            unblock_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(dep.effective_unblock_role(), crate::status::role::Role::Terminal);
    }
}
