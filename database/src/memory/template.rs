use super::store::Store;
use orchestrator_core::error::{OrchestratorError, Result};
use orchestrator_core::models::{Template, TemplateSection};
use orchestrator_core::repository::TemplateRepository;
use std::sync::Arc;
use uuid::Uuid;

use async_trait::async_trait;

/// In-memory `TemplateRepository`. Template *authoring* (the built-in
/// catalog, UX around defining section content samples) is out of scope;
/// this implementation is a plain read store that `template.rs` (the
/// apply-template-to-entity service) depends on, plus a `seed` helper
/// tests use to pre-populate a template and its sections.
pub struct MemoryTemplateRepository {
    store: Arc<Store>,
}

impl Default for MemoryTemplateRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateRepository {
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::new()))
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Inserts a template and its section definitions directly, bypassing
    /// write validation — used by tests and by config-driven seeding of the
    /// built-in catalog (out of scope here; catalog content lives with
    /// whichever caller owns startup).
    pub fn seed(&self, template: Template, sections: Vec<TemplateSection>) {
        self.store.templates.lock().insert(template.id, template);
        let mut store_sections = self.store.template_sections.lock();
        for section in sections {
            store_sections.insert(section.id, section);
        }
    }
}

#[async_trait]
impl TemplateRepository for MemoryTemplateRepository {
    async fn get_template(&self, id: Uuid) -> Result<Template> {
        self.store
            .templates
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("template", id))
    }

    async fn get_template_sections(&self, template_id: Uuid) -> Result<Vec<TemplateSection>> {
        let mut sections: Vec<TemplateSection> = self
            .store
            .template_sections
            .lock()
            .values()
            .filter(|s| s.template_id == template_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.ordinal);
        Ok(sections)
    }
}
