//! The `ManageContainer` write path: batched create/update/delete across
//! project/feature/task. One call operates on a single `containerType`; the
//! MCP-protocol layer (wire framing, tool schema) is responsible for routing
//! a JSON `containerType` tag to the matching function family below. Shaped
//! after a per-entity CRUD handler, generalized to batches and three entity
//! kinds.

use crate::cascade::{CascadeEvent, CascadeService, UnblockedTask};
use crate::error::{OrchestratorError, Result};
use crate::models::{
    ContainerType, Feature, NewFeature, NewProject, NewTask, Project, SectionEntityType, Task,
    UpdateFeature, UpdateProject, UpdateTask,
};
use crate::repository::RepositoryContext;
use crate::status::progression::StatusProgressionService;
use crate::status::validator::StatusValidator;
use crate::template;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A batch may contain at most this many items.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedTemplate {
    pub template_id: Uuid,
    pub sections_created: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemFailure {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedItem<T> {
    pub entity: T,
    pub applied_templates: Vec<AppliedTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateBatchResult<T> {
    pub created: Vec<CreatedItem<T>>,
    pub failures: Vec<ItemFailure>,
    /// A one-line warning when an item was created without any template
    /// A nudge, not a failure.
    pub warnings: Vec<String>,
}

impl<T> CreateBatchResult<T> {
    fn check_batch_size(len: usize) -> Result<()> {
        if len > MAX_BATCH_SIZE {
            return Err(OrchestratorError::Validation(format!(
                "batch of {len} exceeds the maximum of {MAX_BATCH_SIZE}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatedItem {
    pub id: Uuid,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateBatchResult {
    pub updated: Vec<UpdatedItem>,
    pub failures: Vec<ItemFailure>,
    /// Suggestions only — the tool reports, never applies, these.
    pub cascade_events: Vec<CascadeEvent>,
    pub unblocked_tasks: Vec<UnblockedTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteBatchResult {
    pub deleted: Vec<Uuid>,
    pub failures: Vec<ItemFailure>,
}

async fn ensure_exists(cache: &mut HashMap<Uuid, bool>, id: Uuid, check: impl std::future::Future<Output = Result<bool>>) -> Result<()> {
    if let Some(known_good) = cache.get(&id) {
        if *known_good {
            return Ok(());
        }
    }
    let exists = check.await?;
    cache.insert(id, exists);
    if exists {
        Ok(())
    } else {
        Err(OrchestratorError::not_found("parent entity", id))
    }
}

// --- Create --------------------------------------------------------------

pub async fn create_projects(
    context: &RepositoryContext,
    items: Vec<NewProject>,
    shared_template_ids: &[Uuid],
) -> Result<CreateBatchResult<Project>> {
    CreateBatchResult::<Project>::check_batch_size(items.len())?;
    let mut created = Vec::new();
    let mut failures = Vec::new();
    let mut any_without_template = false;

    for (index, item) in items.into_iter().enumerate() {
        match create_one_project(context, item, shared_template_ids).await {
            Ok(c) => {
                if c.applied_templates.is_empty() {
                    any_without_template = true;
                }
                created.push(c);
            }
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }

    Ok(CreateBatchResult {
        created,
        failures,
        warnings: warnings_for(any_without_template),
    })
}

async fn create_one_project(
    context: &RepositoryContext,
    item: NewProject,
    template_ids: &[Uuid],
) -> Result<CreatedItem<Project>> {
    if item.name.trim().is_empty() {
        return Err(OrchestratorError::empty_field("name"));
    }
    let project = context.projects.create(item).await?;
    let mut applied_templates = Vec::new();
    for template_id in template_ids {
        let sections = template::apply_template(context, *template_id, SectionEntityType::Project, project.id).await?;
        applied_templates.push(AppliedTemplate { template_id: *template_id, sections_created: sections.len() });
    }
    Ok(CreatedItem { entity: project, applied_templates })
}

pub async fn create_features(
    context: &RepositoryContext,
    items: Vec<NewFeature>,
    shared_template_ids: &[Uuid],
) -> Result<CreateBatchResult<Feature>> {
    CreateBatchResult::<Feature>::check_batch_size(items.len())?;
    let mut created = Vec::new();
    let mut failures = Vec::new();
    let mut project_cache = HashMap::new();
    let mut any_without_template = false;

    for (index, item) in items.into_iter().enumerate() {
        match create_one_feature(context, item, shared_template_ids, &mut project_cache).await {
            Ok(c) => {
                if c.applied_templates.is_empty() {
                    any_without_template = true;
                }
                created.push(c);
            }
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }

    Ok(CreateBatchResult {
        created,
        failures,
        warnings: warnings_for(any_without_template),
    })
}

async fn create_one_feature(
    context: &RepositoryContext,
    item: NewFeature,
    template_ids: &[Uuid],
    project_cache: &mut HashMap<Uuid, bool>,
) -> Result<CreatedItem<Feature>> {
    if item.name.trim().is_empty() {
        return Err(OrchestratorError::empty_field("name"));
    }
    if let Some(project_id) = item.project_id {
        ensure_exists(project_cache, project_id, async {
            Ok(context.projects.get_by_id(project_id).await.is_ok())
        })
        .await?;
    }
    let feature = context.features.create(item).await?;
    let mut applied_templates = Vec::new();
    for template_id in template_ids {
        let sections = template::apply_template(context, *template_id, SectionEntityType::Feature, feature.id).await?;
        applied_templates.push(AppliedTemplate { template_id: *template_id, sections_created: sections.len() });
    }
    Ok(CreatedItem { entity: feature, applied_templates })
}

pub async fn create_tasks(
    context: &RepositoryContext,
    items: Vec<NewTask>,
    shared_template_ids: &[Uuid],
) -> Result<CreateBatchResult<Task>> {
    CreateBatchResult::<Task>::check_batch_size(items.len())?;
    let mut created = Vec::new();
    let mut failures = Vec::new();
    let mut project_cache = HashMap::new();
    let mut feature_cache = HashMap::new();
    let mut any_without_template = false;

    for (index, item) in items.into_iter().enumerate() {
        match create_one_task(context, item, shared_template_ids, &mut project_cache, &mut feature_cache).await {
            Ok(c) => {
                if c.applied_templates.is_empty() {
                    any_without_template = true;
                }
                created.push(c);
            }
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }

    Ok(CreateBatchResult {
        created,
        failures,
        warnings: warnings_for(any_without_template),
    })
}

async fn create_one_task(
    context: &RepositoryContext,
    item: NewTask,
    template_ids: &[Uuid],
    project_cache: &mut HashMap<Uuid, bool>,
    feature_cache: &mut HashMap<Uuid, bool>,
) -> Result<CreatedItem<Task>> {
    if item.title.trim().is_empty() {
        return Err(OrchestratorError::empty_field("title"));
    }
    if !(1..=10).contains(&item.complexity) {
        return Err(OrchestratorError::Validation(format!(
            "complexity {} out of range [1, 10]",
            item.complexity
        )));
    }
    if let Some(project_id) = item.project_id {
        ensure_exists(project_cache, project_id, async {
            Ok(context.projects.get_by_id(project_id).await.is_ok())
        })
        .await?;
    }
    if let Some(feature_id) = item.feature_id {
        ensure_exists(feature_cache, feature_id, async {
            Ok(context.features.get_by_id(feature_id).await.is_ok())
        })
        .await?;
    }
    let task = context.tasks.create(item).await?;
    let mut applied_templates = Vec::new();
    for template_id in template_ids {
        let sections = template::apply_template(context, *template_id, SectionEntityType::Task, task.id).await?;
        applied_templates.push(AppliedTemplate { template_id: *template_id, sections_created: sections.len() });
    }
    Ok(CreatedItem { entity: task, applied_templates })
}

fn warnings_for(any_without_template: bool) -> Vec<String> {
    if any_without_template {
        vec!["one or more items were created without any template applied".to_string()]
    } else {
        Vec::new()
    }
}

// --- Update ----------------------------------------------------------------

/// One item in an update batch, paired with its target id.
pub struct UpdateItem<U> {
    pub id: Uuid,
    pub update: U,
}

pub async fn update_projects(
    context: &RepositoryContext,
    cascade: &CascadeService,
    progression: &StatusProgressionService,
    items: Vec<UpdateItem<UpdateProject>>,
) -> Result<UpdateBatchResult> {
    if items.len() > MAX_BATCH_SIZE {
        return Err(OrchestratorError::Validation(format!(
            "batch of {} exceeds the maximum of {MAX_BATCH_SIZE}",
            items.len()
        )));
    }
    let validator = StatusValidator::new(progression);
    let mut updated = Vec::new();
    let mut failures = Vec::new();
    let mut status_changed_ids = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match update_one_project(context, &validator, item).await {
            Ok((u, status_changed)) => {
                if status_changed {
                    status_changed_ids.push(u.id);
                }
                updated.push(u);
            }
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }

    let (cascade_events, unblocked_tasks) =
        collect_cascade_suggestions(cascade, ContainerType::Project, &status_changed_ids).await;

    Ok(UpdateBatchResult { updated, failures, cascade_events, unblocked_tasks })
}

async fn update_one_project(
    context: &RepositoryContext,
    validator: &StatusValidator<'_>,
    item: UpdateItem<UpdateProject>,
) -> Result<(UpdatedItem, bool)> {
    let existing = context.projects.get_by_id(item.id).await?;
    let mut status_changed = false;
    if let Some(new_status) = item.update.status {
        if new_status != existing.status {
            status_changed = true;
            validator
                .validate_transition(
                    existing.status.as_external(),
                    new_status.as_external(),
                    ContainerType::Project,
                    item.id,
                    context,
                    &existing.tags,
                )
                .await?;
        }
    }
    let updated = context.projects.update(item.id, item.update).await?;
    Ok((UpdatedItem { id: updated.id, modified_at: updated.modified_at }, status_changed))
}

pub async fn update_features(
    context: &RepositoryContext,
    cascade: &CascadeService,
    progression: &StatusProgressionService,
    items: Vec<UpdateItem<UpdateFeature>>,
) -> Result<UpdateBatchResult> {
    if items.len() > MAX_BATCH_SIZE {
        return Err(OrchestratorError::Validation(format!(
            "batch of {} exceeds the maximum of {MAX_BATCH_SIZE}",
            items.len()
        )));
    }
    let validator = StatusValidator::new(progression);
    let mut updated = Vec::new();
    let mut failures = Vec::new();
    let mut status_changed_ids = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match update_one_feature(context, &validator, item).await {
            Ok((u, status_changed)) => {
                if status_changed {
                    status_changed_ids.push(u.id);
                }
                updated.push(u);
            }
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }

    let (cascade_events, unblocked_tasks) =
        collect_cascade_suggestions(cascade, ContainerType::Feature, &status_changed_ids).await;

    Ok(UpdateBatchResult { updated, failures, cascade_events, unblocked_tasks })
}

async fn update_one_feature(
    context: &RepositoryContext,
    validator: &StatusValidator<'_>,
    item: UpdateItem<UpdateFeature>,
) -> Result<(UpdatedItem, bool)> {
    let existing = context.features.get_by_id(item.id).await?;
    let mut status_changed = false;
    if let Some(new_status) = item.update.status {
        if new_status != existing.status {
            status_changed = true;
            validator
                .validate_transition(
                    existing.status.as_external(),
                    new_status.as_external(),
                    ContainerType::Feature,
                    item.id,
                    context,
                    &existing.tags,
                )
                .await?;
        }
    }
    let updated = context.features.update(item.id, item.update).await?;
    Ok((UpdatedItem { id: updated.id, modified_at: updated.modified_at }, status_changed))
}

pub async fn update_tasks(
    context: &RepositoryContext,
    cascade: &CascadeService,
    progression: &StatusProgressionService,
    items: Vec<UpdateItem<UpdateTask>>,
) -> Result<UpdateBatchResult> {
    if items.len() > MAX_BATCH_SIZE {
        return Err(OrchestratorError::Validation(format!(
            "batch of {} exceeds the maximum of {MAX_BATCH_SIZE}",
            items.len()
        )));
    }
    let validator = StatusValidator::new(progression);
    let mut updated = Vec::new();
    let mut failures = Vec::new();
    let mut status_changed_ids = Vec::new();

    for (index, item) in items.into_iter().enumerate() {
        match update_one_task(context, &validator, item).await {
            Ok((u, status_changed)) => {
                if status_changed {
                    status_changed_ids.push(u.id);
                }
                updated.push(u);
            }
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }

    let (cascade_events, unblocked_tasks) =
        collect_cascade_suggestions(cascade, ContainerType::Task, &status_changed_ids).await;

    Ok(UpdateBatchResult { updated, failures, cascade_events, unblocked_tasks })
}

async fn update_one_task(
    context: &RepositoryContext,
    validator: &StatusValidator<'_>,
    item: UpdateItem<UpdateTask>,
) -> Result<(UpdatedItem, bool)> {
    let existing = context.tasks.get_by_id(item.id).await?;
    let mut status_changed = false;
    if let Some(new_status) = item.update.status {
        if new_status != existing.status {
            status_changed = true;
            validator
                .validate_transition(
                    existing.status.as_external(),
                    new_status.as_external(),
                    ContainerType::Task,
                    item.id,
                    context,
                    &existing.tags,
                )
                .await?;
        }
    }
    let updated = context.tasks.update(item.id, item.update).await?;
    Ok((UpdatedItem { id: updated.id, modified_at: updated.modified_at }, status_changed))
}

/// For every status-changed entity in an update batch, detect (never apply)
/// cascade events and, for tasks reaching terminal, find newly unblocked
/// tasks. Aggregated across the whole batch.
async fn collect_cascade_suggestions(
    cascade: &CascadeService,
    container_type: ContainerType,
    changed_ids: &[Uuid],
) -> (Vec<CascadeEvent>, Vec<UnblockedTask>) {
    let mut events = Vec::new();
    let mut unblocked = Vec::new();
    for id in changed_ids {
        if let Ok(mut detected) = cascade.detect_cascade_events(*id, container_type).await {
            events.append(&mut detected);
        }
        if container_type == ContainerType::Task {
            unblocked.extend(cascade.find_newly_unblocked_tasks(*id).await);
        }
    }
    (events, unblocked)
}

// --- Delete ------------------------------------------------------------------

pub async fn delete_projects(
    context: &RepositoryContext,
    ids: Vec<Uuid>,
    force: bool,
    delete_sections: bool,
) -> Result<DeleteBatchResult> {
    let mut deleted = Vec::new();
    let mut failures = Vec::new();
    for (index, id) in ids.into_iter().enumerate() {
        match delete_one_project(context, id, force, delete_sections).await {
            Ok(()) => deleted.push(id),
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }
    Ok(DeleteBatchResult { deleted, failures })
}

async fn delete_one_project(context: &RepositoryContext, id: Uuid, force: bool, delete_sections: bool) -> Result<()> {
    context.projects.get_by_id(id).await?;
    let features = context.features.find_by_project_id(id).await?;
    if !force && !features.is_empty() {
        return Err(OrchestratorError::Conflict(format!(
            "project {id} has {} feature(s); pass force=true to cascade-delete",
            features.len()
        )));
    }
    for feature in features {
        delete_one_feature(context, feature.id, true, delete_sections).await?;
    }
    if delete_sections {
        context.sections.delete_sections_for_entity(SectionEntityType::Project, id).await?;
    }
    context.projects.delete(id).await
}

pub async fn delete_features(
    context: &RepositoryContext,
    ids: Vec<Uuid>,
    force: bool,
    delete_sections: bool,
) -> Result<DeleteBatchResult> {
    let mut deleted = Vec::new();
    let mut failures = Vec::new();
    for (index, id) in ids.into_iter().enumerate() {
        match delete_one_feature(context, id, force, delete_sections).await {
            Ok(()) => deleted.push(id),
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }
    Ok(DeleteBatchResult { deleted, failures })
}

async fn delete_one_feature(context: &RepositoryContext, id: Uuid, force: bool, delete_sections: bool) -> Result<()> {
    context.features.get_by_id(id).await?;
    let tasks = context.tasks.find_by_feature_id(id).await?;
    if !force && !tasks.is_empty() {
        return Err(OrchestratorError::Conflict(format!(
            "feature {id} has {} task(s); pass force=true to cascade-delete",
            tasks.len()
        )));
    }
    for task in tasks {
        delete_one_task(context, task.id, true, delete_sections).await?;
    }
    if delete_sections {
        context.sections.delete_sections_for_entity(SectionEntityType::Feature, id).await?;
    }
    context.features.delete(id).await
}

pub async fn delete_tasks(
    context: &RepositoryContext,
    ids: Vec<Uuid>,
    force: bool,
    delete_sections: bool,
) -> Result<DeleteBatchResult> {
    let mut deleted = Vec::new();
    let mut failures = Vec::new();
    for (index, id) in ids.into_iter().enumerate() {
        match delete_one_task(context, id, force, delete_sections).await {
            Ok(()) => deleted.push(id),
            Err(e) => failures.push(ItemFailure { index, error: e.to_string() }),
        }
    }
    Ok(DeleteBatchResult { deleted, failures })
}

async fn delete_one_task(context: &RepositoryContext, id: Uuid, force: bool, delete_sections: bool) -> Result<()> {
    context.tasks.get_by_id(id).await?;
    let deps = context.dependencies.find_by_task_id(id).await?;
    if !force && !deps.is_empty() {
        let incoming = deps.iter().filter(|d| d.to_task_id == id).count();
        let outgoing = deps.iter().filter(|d| d.from_task_id == id).count();
        return Err(OrchestratorError::Conflict(format!(
            "task {id} has {incoming} incoming and {outgoing} outgoing dependency edge(s); pass force=true to delete anyway"
        )));
    }
    if !deps.is_empty() {
        context.dependencies.delete_by_task_id(id).await?;
    }
    if delete_sections {
        context.sections.delete_sections_for_entity(SectionEntityType::Task, id).await?;
    }
    context.tasks.delete(id).await
}
