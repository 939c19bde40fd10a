//! Fluent builders for constructing entities in tests: a plain struct of
//! defaults plus `with_*` consuming setters, one per entity kind, plus a
//! handful of `New*` DTO helpers.

use chrono::Utc;
use orchestrator_core::models::{
    ContentFormat, Dependency, DependencyType, Feature, FeatureStatus, NewFeature, NewProject,
    NewSection, NewTask, Priority, Project, ProjectStatus, Section, SectionEntityType, Task,
    TaskStatus,
};
use uuid::Uuid;

pub struct ProjectBuilder {
    project: Project,
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            project: Project {
                id: Uuid::new_v4(),
                name: "Test Project".into(),
                description: None,
                summary: String::new(),
                status: ProjectStatus::Planning,
                tags: vec![],
                created_at: now,
                modified_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.project.id = id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.project.name = name.into();
        self
    }

    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.project.status = status;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.project.tags = tags;
        self
    }

    pub fn build(self) -> Project {
        self.project
    }
}

pub struct FeatureBuilder {
    feature: Feature,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            feature: Feature {
                id: Uuid::new_v4(),
                name: "Test Feature".into(),
                description: None,
                summary: String::new(),
                status: FeatureStatus::Planning,
                priority: Priority::Medium,
                project_id: None,
                requires_verification: false,
                tags: vec![],
                created_at: now,
                modified_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.feature.id = id;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.feature.name = name.into();
        self
    }

    pub fn with_status(mut self, status: FeatureStatus) -> Self {
        self.feature.status = status;
        self
    }

    pub fn with_project_id(mut self, project_id: Uuid) -> Self {
        self.feature.project_id = Some(project_id);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.feature.priority = priority;
        self
    }

    pub fn requires_verification(mut self, value: bool) -> Self {
        self.feature.requires_verification = value;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.feature.tags = tags;
        self
    }

    pub fn build(self) -> Feature {
        self.feature
    }
}

pub struct TaskBuilder {
    task: Task,
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            task: Task {
                id: Uuid::new_v4(),
                title: "Test Task".into(),
                description: None,
                summary: String::new(),
                status: TaskStatus::Pending,
                priority: Priority::Medium,
                complexity: 5,
                project_id: None,
                feature_id: None,
                requires_verification: false,
                tags: vec![],
                created_at: now,
                modified_at: now,
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.task.id = id;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.task.title = title.into();
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn with_feature_id(mut self, feature_id: Uuid) -> Self {
        self.task.feature_id = Some(feature_id);
        self
    }

    pub fn with_project_id(mut self, project_id: Uuid) -> Self {
        self.task.project_id = Some(project_id);
        self
    }

    pub fn with_complexity(mut self, complexity: u8) -> Self {
        self.task.complexity = complexity;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn requires_verification(mut self, value: bool) -> Self {
        self.task.requires_verification = value;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.task.tags = tags;
        self
    }

    pub fn build(self) -> Task {
        self.task
    }
}

pub struct DependencyBuilder {
    dependency: Dependency,
}

impl DependencyBuilder {
    pub fn new(from_task_id: Uuid, to_task_id: Uuid) -> Self {
        Self {
            dependency: Dependency {
                id: Uuid::new_v4(),
                from_task_id,
                to_task_id,
                dependency_type: DependencyType::Blocks,
                unblock_at: None,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency.dependency_type = dependency_type;
        self
    }

    pub fn with_unblock_at(mut self, role: orchestrator_core::status::Role) -> Self {
        self.dependency.unblock_at = Some(role);
        self
    }

    pub fn build(self) -> Dependency {
        self.dependency
    }
}

pub struct SectionBuilder {
    section: Section,
}

impl SectionBuilder {
    pub fn new(entity_type: SectionEntityType, entity_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            section: Section {
                id: Uuid::new_v4(),
                entity_type,
                entity_id,
                title: "Test Section".into(),
                usage_description: String::new(),
                content: String::new(),
                content_format: ContentFormat::Markdown,
                ordinal: 0,
                tags: vec![],
                created_at: now,
                modified_at: now,
            },
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.section.title = title.into();
        self
    }

    pub fn with_ordinal(mut self, ordinal: u32) -> Self {
        self.section.ordinal = ordinal;
        self
    }

    pub fn build(self) -> Section {
        self.section
    }
}

/// A `NewProject` with placeholder values, ready for field overrides.
pub fn new_project(name: impl Into<String>) -> NewProject {
    NewProject {
        name: name.into(),
        ..Default::default()
    }
}

/// A `NewFeature` with placeholder values.
pub fn new_feature(name: impl Into<String>) -> NewFeature {
    NewFeature {
        name: name.into(),
        ..Default::default()
    }
}

/// A `NewTask` with placeholder values.
pub fn new_task(title: impl Into<String>) -> NewTask {
    NewTask {
        title: title.into(),
        ..Default::default()
    }
}

/// A `NewSection` with placeholder values.
pub fn new_section(entity_type: SectionEntityType, entity_id: Uuid) -> NewSection {
    NewSection {
        entity_type,
        entity_id,
        title: "Test Section".into(),
        usage_description: String::new(),
        content: String::new(),
        content_format: ContentFormat::Markdown,
        ordinal: None,
        tags: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_builder_applies_overrides() {
        let feature_id = Uuid::new_v4();
        let task = TaskBuilder::new()
            .with_title("Ship it")
            .with_status(TaskStatus::InProgress)
            .with_feature_id(feature_id)
            .build();
        assert_eq!(task.title, "Ship it");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.feature_id, Some(feature_id));
    }

    #[test]
    fn dependency_builder_defaults_to_blocks() {
        let dep = DependencyBuilder::new(Uuid::new_v4(), Uuid::new_v4()).build();
        assert_eq!(dep.dependency_type, DependencyType::Blocks);
        assert!(dep.unblock_at.is_none());
    }
}
