use super::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use orchestrator_core::error::{OrchestratorError, Result};
use orchestrator_core::models::{NewSection, Section, SectionEntityType, UpdateSection};
use orchestrator_core::repository::SectionRepository;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory `SectionRepository`. Ordinal assignment on create appends after
/// the highest existing ordinal for the entity — template application
/// preserves ordinal order, appended after any existing sections — unless
/// the caller supplies an explicit ordinal.
pub struct MemorySectionRepository {
    store: Arc<Store>,
}

impl Default for MemorySectionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySectionRepository {
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::new()))
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SectionRepository for MemorySectionRepository {
    async fn get_section(&self, id: Uuid) -> Result<Section> {
        self.store
            .sections
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("section", id))
    }

    async fn get_sections_for_entity(
        &self,
        entity_type: SectionEntityType,
        entity_id: Uuid,
    ) -> Result<Vec<Section>> {
        let mut sections: Vec<Section> = self
            .store
            .sections
            .lock()
            .values()
            .filter(|s| s.entity_type == entity_type && s.entity_id == entity_id)
            .cloned()
            .collect();
        sections.sort_by_key(|s| s.ordinal);
        Ok(sections)
    }

    async fn add_section(&self, new: NewSection) -> Result<Section> {
        if new.title.trim().is_empty() {
            return Err(OrchestratorError::empty_field("title"));
        }
        let mut sections = self.store.sections.lock();
        let ordinal = match new.ordinal {
            Some(ordinal) => ordinal,
            None => sections
                .values()
                .filter(|s| s.entity_type == new.entity_type && s.entity_id == new.entity_id)
                .map(|s| s.ordinal + 1)
                .max()
                .unwrap_or(0),
        };
        let now = Utc::now();
        let section = Section {
            id: Uuid::new_v4(),
            entity_type: new.entity_type,
            entity_id: new.entity_id,
            title: new.title,
            usage_description: new.usage_description,
            content: new.content,
            content_format: new.content_format,
            ordinal,
            tags: new.tags,
            created_at: now,
            modified_at: now,
        };
        sections.insert(section.id, section.clone());
        Ok(section)
    }

    async fn update_section(&self, id: Uuid, update: UpdateSection) -> Result<Section> {
        let mut sections = self.store.sections.lock();
        let section = sections
            .get_mut(&id)
            .ok_or_else(|| OrchestratorError::not_found("section", id))?;
        if let Some(title) = update.title {
            if title.trim().is_empty() {
                return Err(OrchestratorError::empty_field("title"));
            }
            section.title = title;
        }
        if let Some(usage_description) = update.usage_description {
            section.usage_description = usage_description;
        }
        if let Some(content) = update.content {
            section.content = content;
        }
        if let Some(content_format) = update.content_format {
            section.content_format = content_format;
        }
        if let Some(ordinal) = update.ordinal {
            section.ordinal = ordinal;
        }
        if let Some(tags) = update.tags {
            section.tags = tags;
        }
        section.modified_at = Utc::now();
        Ok(section.clone())
    }

    async fn delete_section(&self, id: Uuid) -> Result<()> {
        self.store
            .sections
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("section", id))
    }

    async fn delete_sections_for_entity(
        &self,
        entity_type: SectionEntityType,
        entity_id: Uuid,
    ) -> Result<u64> {
        let mut sections = self.store.sections.lock();
        let to_remove: Vec<Uuid> = sections
            .values()
            .filter(|s| s.entity_type == entity_type && s.entity_id == entity_id)
            .map(|s| s.id)
            .collect();
        for id in &to_remove {
            sections.remove(id);
        }
        Ok(to_remove.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_core::models::ContentFormat;

    fn new_section(entity_id: Uuid, ordinal: Option<u32>) -> NewSection {
        NewSection {
            entity_type: SectionEntityType::Task,
            entity_id,
            title: "Notes".into(),
            usage_description: "freeform notes".into(),
            content: "content".into(),
            content_format: ContentFormat::Markdown,
            ordinal,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn add_section_appends_after_existing_ordinals() {
        let repo = MemorySectionRepository::new();
        let entity_id = Uuid::new_v4();
        let first = repo.add_section(new_section(entity_id, None)).await.unwrap();
        let second = repo.add_section(new_section(entity_id, None)).await.unwrap();
        assert_eq!(first.ordinal, 0);
        assert_eq!(second.ordinal, 1);
    }

    #[tokio::test]
    async fn get_sections_for_entity_is_ordinal_sorted() {
        let repo = MemorySectionRepository::new();
        let entity_id = Uuid::new_v4();
        repo.add_section(new_section(entity_id, Some(5))).await.unwrap();
        repo.add_section(new_section(entity_id, Some(1))).await.unwrap();
        let sections = repo
            .get_sections_for_entity(SectionEntityType::Task, entity_id)
            .await
            .unwrap();
        assert_eq!(sections.iter().map(|s| s.ordinal).collect::<Vec<_>>(), vec![1, 5]);
    }
}
