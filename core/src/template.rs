//! Template engine: clones a template's section definitions onto an entity,
//! preserving ordinal order. Built on the New*/`Entity` DTO-separation
//! pattern used throughout `models.rs`: applying a template is just building
//! `NewSection` values from `TemplateSection` definitions and writing them
//! through the same repository create path sections already go through.

use crate::error::Result;
use crate::models::{NewSection, Section, SectionEntityType};
use crate::repository::RepositoryContext;
use std::collections::HashMap;
use uuid::Uuid;

/// Clones `template_id`'s section definitions onto `entity_id`, appended
/// after any sections that already exist there.
pub async fn apply_template(
    context: &RepositoryContext,
    template_id: Uuid,
    entity_type: SectionEntityType,
    entity_id: Uuid,
) -> Result<Vec<Section>> {
    let definitions = context.templates.get_template_sections(template_id).await?;
    let existing = context.sections.get_sections_for_entity(entity_type, entity_id).await?;
    let mut next_ordinal = existing.iter().map(|s| s.ordinal).max().map(|m| m + 1).unwrap_or(0);

    let mut sorted = definitions;
    sorted.sort_by_key(|d| d.ordinal);

    let mut created = Vec::with_capacity(sorted.len());
    for def in sorted {
        let new_section = NewSection {
            entity_type,
            entity_id,
            title: def.title,
            usage_description: def.usage_description,
            // Prefer the sample content as the seeded value; fall back to the
            // definition's own content when no sample was authored.
            content: def.content_sample.unwrap_or(def.content),
            content_format: def.content_format,
            ordinal: Some(next_ordinal),
            tags: def.tags,
        };
        let section = context.sections.add_section(new_section).await?;
        created.push(section);
        next_ordinal += 1;
    }

    Ok(created)
}

/// Applies every template in `template_ids`, in order, to the same entity.
/// Returns the sections created per template, keyed by template id.
pub async fn apply_multiple_templates(
    context: &RepositoryContext,
    template_ids: &[Uuid],
    entity_type: SectionEntityType,
    entity_id: Uuid,
) -> Result<HashMap<Uuid, Vec<Section>>> {
    let mut result = HashMap::with_capacity(template_ids.len());
    for template_id in template_ids {
        let sections = apply_template(context, *template_id, entity_type, entity_id).await?;
        result.insert(*template_id, sections);
    }
    Ok(result)
}
