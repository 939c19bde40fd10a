//! The shared backing store behind all six in-memory repositories.
//!
//! Rollups (`ProjectRepository::get_feature_counts_by_project_id`,
//! `FeatureRepository::get_task_counts_by_feature_id`) need to read a table
//! that a sibling repository owns, so instead of six fully independent
//! `MockTaskRepository`-style structs, every `Memory*Repository` wraps a
//! clone of one shared `Store` and reads whichever tables it needs. Each
//! table keeps its own `Mutex` so unrelated entity kinds never contend on
//! the same lock.

use orchestrator_core::models::{Dependency, Feature, Project, Section, Task, Template, TemplateSection};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Default)]
pub struct Store {
    pub projects: Mutex<HashMap<Uuid, Project>>,
    pub features: Mutex<HashMap<Uuid, Feature>>,
    pub tasks: Mutex<HashMap<Uuid, Task>>,
    pub dependencies: Mutex<HashMap<Uuid, Dependency>>,
    pub sections: Mutex<HashMap<Uuid, Section>>,
    pub templates: Mutex<HashMap<Uuid, Template>>,
    pub template_sections: Mutex<HashMap<Uuid, TemplateSection>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
}
