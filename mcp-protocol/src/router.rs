//! The MCP tool surface: `manage_container`, `request_transition`,
//! `set_status`, and the read paths `query_container`, `get_next_task`,
//! `get_blocked_tasks`, `get_overview`. A `#[tool_router]` struct holding
//! injected repositories, one request struct per tool, a single
//! `#[tool_handler]` `ServerHandler` impl — generalized from a single
//! entity to the project/feature/task hierarchy and widened with read
//! tools alongside the write path.

use crate::envelope::ToolResponse;
use orchestrator_core::cascade::{AppliedCascade, CascadeService};
use orchestrator_core::config::{AutoCascadeConfig, CleanupConfig};
use orchestrator_core::error::{OrchestratorError, Result as CoreResult};
use orchestrator_core::models::{
    ContainerType, DependencyType, Feature, NewFeature, NewProject, NewTask, Priority, Project,
    Task, TaskFilter, TaskStatus, UpdateFeature, UpdateProject, UpdateTask,
};
use orchestrator_core::repository::RepositoryContext;
use orchestrator_core::status::progression::{Blocker, StatusProgressionService};
use orchestrator_core::status::role::is_role_at_or_beyond;
use orchestrator_core::status::validator::StatusValidator;
use orchestrator_core::tools::locking::LockRegistry;
use orchestrator_core::tools::manage_container::{self, UpdateItem};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::model::{CallToolResult, ServerCapabilities, ServerInfo};
use rmcp::schemars::JsonSchema;
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

fn parse_container_type(s: &str) -> CoreResult<ContainerType> {
    match s {
        "project" => Ok(ContainerType::Project),
        "feature" => Ok(ContainerType::Feature),
        "task" => Ok(ContainerType::Task),
        other => Err(OrchestratorError::Validation(format!(
            "unknown container type '{other}'; expected project, feature, or task"
        ))),
    }
}

/// `UpdateX` DTOs have no `id` field of their own — the batch shape puts
/// the target id alongside the partial update, not inside it; this mirrors
/// that onto the wire with `#[serde(flatten)]` rather than adding an `id`
/// field to every `UpdateX` struct in `orchestrator_core`.
#[derive(Debug, Deserialize)]
struct UpdatePayload<U> {
    id: Uuid,
    #[serde(flatten)]
    update: U,
}

fn deserialize_creates<T: for<'de> Deserialize<'de>>(containers: Vec<Value>) -> CoreResult<Vec<T>> {
    serde_json::from_value(Value::Array(containers))
        .map_err(|e| OrchestratorError::Validation(format!("invalid container payload: {e}")))
}

fn deserialize_updates<U: for<'de> Deserialize<'de>>(containers: Vec<Value>) -> CoreResult<Vec<UpdateItem<U>>> {
    let payloads: Vec<UpdatePayload<U>> = serde_json::from_value(Value::Array(containers))
        .map_err(|e| OrchestratorError::Validation(format!("invalid container payload: {e}")))?;
    Ok(payloads.into_iter().map(|p| UpdateItem { id: p.id, update: p.update }).collect())
}

fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::High => 0,
        Priority::Medium => 1,
        Priority::Low => 2,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ManageContainerRequest {
    #[schemars(description = "One of: create, update, delete")]
    pub operation: String,
    #[schemars(description = "One of: project, feature, task")]
    pub container_type: String,
    /// create: an array of `NewProject`/`NewFeature`/`NewTask`-shaped objects.
    /// update: the same shapes, each carrying its own `id` alongside the
    /// fields to change (omitted fields are left untouched).
    #[serde(default)]
    pub containers: Vec<Value>,
    /// delete: the ids to remove.
    #[serde(default)]
    pub ids: Vec<Uuid>,
    #[serde(default)]
    pub shared_template_ids: Vec<Uuid>,
    #[serde(default)]
    pub force: bool,
    #[serde(default = "default_true")]
    pub delete_sections: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RequestTransitionRequest {
    pub container_type: String,
    pub id: Uuid,
    pub new_status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SetStatusRequest {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QueryContainerRequest {
    pub container_type: String,
    pub id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetNextTaskRequest {
    pub project_id: Option<Uuid>,
    pub feature_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetBlockedTasksRequest {
    pub project_id: Option<Uuid>,
    pub feature_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GetOverviewRequest {
    pub project_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
struct BlockedTask {
    task: Task,
    blockers: Vec<Blocker>,
}

/// Injected repositories plus the cascade/cleanup config that governs
/// `request_transition`'s auto-cascade behavior. `core`'s engine types are
/// stateless across calls, so the handler only stores what it needs to build
/// a fresh `StatusProgressionService`/`CascadeService` per request — except
/// the advisory lock registry, which must outlive any single request to
/// actually serialize writes against concurrent calls.
#[derive(Clone)]
pub struct OrchestratorHandler {
    context: RepositoryContext,
    cascade_config: AutoCascadeConfig,
    cleanup_config: CleanupConfig,
    locks: LockRegistry,
    tool_router: ToolRouter<Self>,
}

impl OrchestratorHandler {
    pub fn new(context: RepositoryContext, cascade_config: AutoCascadeConfig, cleanup_config: CleanupConfig) -> Self {
        Self {
            context,
            cascade_config,
            cleanup_config,
            locks: LockRegistry::new(),
            tool_router: Self::tool_router(),
        }
    }

    fn progression(&self) -> StatusProgressionService {
        StatusProgressionService::default()
    }

    fn cascade_service(&self) -> CascadeService {
        CascadeService::with_lock_registry(
            self.context.clone(),
            self.progression(),
            self.cascade_config.clone(),
            self.cleanup_config.clone(),
            self.locks.clone(),
        )
    }

    async fn current_status_and_tags(&self, container_type: ContainerType, id: Uuid) -> CoreResult<(String, Vec<String>)> {
        Ok(match container_type {
            ContainerType::Project => {
                let p = self.context.projects.get_by_id(id).await?;
                (p.status.as_external().to_string(), p.tags)
            }
            ContainerType::Feature => {
                let f = self.context.features.get_by_id(id).await?;
                (f.status.as_external().to_string(), f.tags)
            }
            ContainerType::Task => {
                let t = self.context.tasks.get_by_id(id).await?;
                (t.status.as_external().to_string(), t.tags)
            }
        })
    }

    async fn write_status(&self, container_type: ContainerType, id: Uuid, status: &str) -> CoreResult<()> {
        match container_type {
            ContainerType::Project => {
                let parsed = orchestrator_core::models::ProjectStatus::from_external(status)
                    .ok_or_else(|| OrchestratorError::invalid_status(status, "project"))?;
                self.context
                    .projects
                    .update(id, UpdateProject { status: Some(parsed), ..Default::default() })
                    .await?;
            }
            ContainerType::Feature => {
                let parsed = orchestrator_core::models::FeatureStatus::from_external(status)
                    .ok_or_else(|| OrchestratorError::invalid_status(status, "feature"))?;
                self.context
                    .features
                    .update(id, UpdateFeature { status: Some(parsed), ..Default::default() })
                    .await?;
            }
            ContainerType::Task => {
                let parsed = TaskStatus::from_external(status)
                    .ok_or_else(|| OrchestratorError::invalid_status(status, "task"))?;
                self.context
                    .tasks
                    .update(id, UpdateTask { status: Some(parsed), ..Default::default() })
                    .await?;
            }
        }
        Ok(())
    }

    async fn entity_exists(&self, container_type: ContainerType, id: Uuid) -> bool {
        match container_type {
            ContainerType::Project => self.context.projects.get_by_id(id).await.is_ok(),
            ContainerType::Feature => self.context.features.get_by_id(id).await.is_ok(),
            ContainerType::Task => self.context.tasks.get_by_id(id).await.is_ok(),
        }
    }

    async fn unsatisfied_blockers(&self, progression: &StatusProgressionService, task: &Task) -> CoreResult<Vec<Blocker>> {
        let edges = self.context.dependencies.find_by_to_task_id(task.id).await?;
        let mut blockers = Vec::new();
        for dep in edges.iter().filter(|d| d.dependency_type == DependencyType::Blocks) {
            let blocker = match self.context.tasks.get_by_id(dep.from_task_id).await {
                Ok(t) => t,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            let role = progression.get_role_for_status(blocker.status.as_external(), ContainerType::Task, &task.tags);
            if !is_role_at_or_beyond(&role, &dep.effective_unblock_role()) {
                blockers.push(Blocker { task_id: blocker.id, title: blocker.title });
            }
        }
        Ok(blockers)
    }

    pub async fn manage_container_impl(&self, req: ManageContainerRequest) -> CoreResult<ToolResponse> {
        let container_type = parse_container_type(&req.container_type)?;
        match (req.operation.as_str(), container_type) {
            ("create", ContainerType::Project) => {
                let items: Vec<NewProject> = deserialize_creates(req.containers)?;
                let result = manage_container::create_projects(&self.context, items, &req.shared_template_ids).await?;
                Ok(ToolResponse::ok("projects created", result))
            }
            ("create", ContainerType::Feature) => {
                let items: Vec<NewFeature> = deserialize_creates(req.containers)?;
                let result = manage_container::create_features(&self.context, items, &req.shared_template_ids).await?;
                Ok(ToolResponse::ok("features created", result))
            }
            ("create", ContainerType::Task) => {
                let items: Vec<NewTask> = deserialize_creates(req.containers)?;
                let result = manage_container::create_tasks(&self.context, items, &req.shared_template_ids).await?;
                Ok(ToolResponse::ok("tasks created", result))
            }
            ("update", ContainerType::Project) => {
                let items = deserialize_updates::<UpdateProject>(req.containers)?;
                let progression = self.progression();
                let cascade = self.cascade_service();
                let result = manage_container::update_projects(&self.context, &cascade, &progression, items).await?;
                Ok(ToolResponse::ok("projects updated", result))
            }
            ("update", ContainerType::Feature) => {
                let items = deserialize_updates::<UpdateFeature>(req.containers)?;
                let progression = self.progression();
                let cascade = self.cascade_service();
                let result = manage_container::update_features(&self.context, &cascade, &progression, items).await?;
                Ok(ToolResponse::ok("features updated", result))
            }
            ("update", ContainerType::Task) => {
                let items = deserialize_updates::<UpdateTask>(req.containers)?;
                let progression = self.progression();
                let cascade = self.cascade_service();
                let result = manage_container::update_tasks(&self.context, &cascade, &progression, items).await?;
                Ok(ToolResponse::ok("tasks updated", result))
            }
            ("delete", ContainerType::Project) => {
                let result = manage_container::delete_projects(&self.context, req.ids, req.force, req.delete_sections).await?;
                Ok(ToolResponse::ok("projects deleted", result))
            }
            ("delete", ContainerType::Feature) => {
                let result = manage_container::delete_features(&self.context, req.ids, req.force, req.delete_sections).await?;
                Ok(ToolResponse::ok("features deleted", result))
            }
            ("delete", ContainerType::Task) => {
                let result = manage_container::delete_tasks(&self.context, req.ids, req.force, req.delete_sections).await?;
                Ok(ToolResponse::ok("tasks deleted", result))
            }
            (other, _) => Err(OrchestratorError::Validation(format!(
                "unknown operation '{other}'; expected create, update, or delete"
            ))),
        }
    }

    pub async fn request_transition_impl(&self, req: RequestTransitionRequest) -> CoreResult<ToolResponse> {
        let container_type = parse_container_type(&req.container_type)?;
        let held = orchestrator_core::tools::locking::HeldLocks::new();
        let key = orchestrator_core::tools::locking::key_for(container_type, req.id);
        let _guard = self.locks.acquire(key, &held).await;

        let progression = self.progression();
        let validator = StatusValidator::new(&progression);
        let (current_status, tags) = self.current_status_and_tags(container_type, req.id).await?;

        validator
            .validate_transition(&current_status, &req.new_status, container_type, req.id, &self.context, &tags)
            .await?;
        self.write_status(container_type, req.id, &req.new_status).await?;

        let mut cascades_applied: Vec<AppliedCascade> = Vec::new();
        if self.cascade_config.enabled {
            let cascade = self.cascade_service();
            cascades_applied = cascade
                .apply_cascades(req.id, container_type, 0, self.cascade_config.max_depth)
                .await;
        }

        Ok(
            ToolResponse::ok("transition requested", serde_json::json!({"id": req.id, "status": req.new_status}))
                .with_metadata(serde_json::json!({ "cascades_applied": cascades_applied })),
        )
    }

    pub async fn set_status_impl(&self, req: SetStatusRequest) -> CoreResult<ToolResponse> {
        for container_type in [ContainerType::Task, ContainerType::Feature, ContainerType::Project] {
            if self.entity_exists(container_type, req.id).await {
                return self
                    .request_transition_impl(RequestTransitionRequest {
                        container_type: container_type.to_string(),
                        id: req.id,
                        new_status: req.status.clone(),
                    })
                    .await;
            }
        }
        Err(OrchestratorError::not_found("container", req.id))
    }

    pub async fn query_container_impl(&self, req: QueryContainerRequest) -> CoreResult<ToolResponse> {
        let container_type = parse_container_type(&req.container_type)?;
        match container_type {
            ContainerType::Project => {
                let project: Project = self.context.projects.get_by_id(req.id).await?;
                Ok(ToolResponse::ok("project found", project))
            }
            ContainerType::Feature => {
                let feature: Feature = self.context.features.get_by_id(req.id).await?;
                Ok(ToolResponse::ok("feature found", feature))
            }
            ContainerType::Task => {
                let task: Task = self.context.tasks.get_by_id(req.id).await?;
                Ok(ToolResponse::ok("task found", task))
            }
        }
    }

    pub async fn get_next_task_impl(&self, req: GetNextTaskRequest) -> CoreResult<ToolResponse> {
        let progression = self.progression();
        let filter = TaskFilter {
            project_id: req.project_id,
            feature_id: req.feature_id,
            status: Some(TaskStatus::Pending),
            tag: None,
            limit: None,
        };
        let mut candidates = self.context.tasks.find_all(filter).await?;
        candidates.sort_by(|a, b| {
            priority_rank(a.priority)
                .cmp(&priority_rank(b.priority))
                .then(a.created_at.cmp(&b.created_at))
        });

        for task in candidates {
            let blockers = self.unsatisfied_blockers(&progression, &task).await?;
            if blockers.is_empty() {
                return Ok(ToolResponse::ok("next task found", task));
            }
        }
        Ok(ToolResponse::ok_empty("no unblocked pending task is available"))
    }

    pub async fn get_blocked_tasks_impl(&self, req: GetBlockedTasksRequest) -> CoreResult<ToolResponse> {
        let progression = self.progression();
        let filter = TaskFilter {
            project_id: req.project_id,
            feature_id: req.feature_id,
            status: None,
            tag: None,
            limit: None,
        };
        let candidates = self.context.tasks.find_all(filter).await?;
        let mut blocked = Vec::new();
        for task in candidates {
            if task.status != TaskStatus::Pending && task.status != TaskStatus::InProgress {
                continue;
            }
            let blockers = self.unsatisfied_blockers(&progression, &task).await?;
            if !blockers.is_empty() {
                blocked.push(BlockedTask { task, blockers });
            }
        }
        Ok(ToolResponse::ok(format!("{} blocked task(s)", blocked.len()), blocked))
    }

    pub async fn get_overview_impl(&self, req: GetOverviewRequest) -> CoreResult<ToolResponse> {
        let project = self.context.projects.get_by_id(req.project_id).await?;
        let feature_counts = self.context.projects.get_feature_counts_by_project_id(req.project_id).await?;
        let features = self.context.features.find_by_project_id(req.project_id).await?;

        let mut feature_overviews = Vec::with_capacity(features.len());
        for feature in features {
            let task_counts = self.context.features.get_task_counts_by_feature_id(feature.id).await?;
            feature_overviews.push(serde_json::json!({
                "feature": feature,
                "task_counts": task_counts,
            }));
        }

        Ok(ToolResponse::ok(
            "project overview",
            serde_json::json!({
                "project": project,
                "feature_counts": feature_counts,
                "features": feature_overviews,
            }),
        ))
    }
}

#[tool_router]
impl OrchestratorHandler {
    #[tool(description = "Batched create/update/delete across project, feature, and task containers")]
    async fn manage_container(&self, req: ManageContainerRequest) -> std::result::Result<CallToolResult, McpError> {
        match self.manage_container_impl(req).await {
            Ok(resp) => Ok(resp.into_call_tool_result()),
            Err(e) => Ok(ToolResponse::err(&e).into_call_tool_result()),
        }
    }

    #[tool(description = "Request a status transition for a project, feature, or task, applying cascades if enabled")]
    async fn request_transition(&self, req: RequestTransitionRequest) -> std::result::Result<CallToolResult, McpError> {
        match self.request_transition_impl(req).await {
            Ok(resp) => Ok(resp.into_call_tool_result()),
            Err(e) => Ok(ToolResponse::err(&e).into_call_tool_result()),
        }
    }

    #[tool(description = "Set the status of a single container, auto-detecting whether it is a task, feature, or project")]
    async fn set_status(&self, req: SetStatusRequest) -> std::result::Result<CallToolResult, McpError> {
        match self.set_status_impl(req).await {
            Ok(resp) => Ok(resp.into_call_tool_result()),
            Err(e) => Ok(ToolResponse::err(&e).into_call_tool_result()),
        }
    }

    #[tool(description = "Fetch a single project, feature, or task by id")]
    async fn query_container(&self, req: QueryContainerRequest) -> std::result::Result<CallToolResult, McpError> {
        match self.query_container_impl(req).await {
            Ok(resp) => Ok(resp.into_call_tool_result()),
            Err(e) => Ok(ToolResponse::err(&e).into_call_tool_result()),
        }
    }

    #[tool(description = "Find the highest-priority pending task with no unsatisfied blockers")]
    async fn get_next_task(&self, req: GetNextTaskRequest) -> std::result::Result<CallToolResult, McpError> {
        match self.get_next_task_impl(req).await {
            Ok(resp) => Ok(resp.into_call_tool_result()),
            Err(e) => Ok(ToolResponse::err(&e).into_call_tool_result()),
        }
    }

    #[tool(description = "List tasks that are pending or in progress but have unsatisfied blockers")]
    async fn get_blocked_tasks(&self, req: GetBlockedTasksRequest) -> std::result::Result<CallToolResult, McpError> {
        match self.get_blocked_tasks_impl(req).await {
            Ok(resp) => Ok(resp.into_call_tool_result()),
            Err(e) => Ok(ToolResponse::err(&e).into_call_tool_result()),
        }
    }

    #[tool(description = "Summarize a project: its features and each feature's task counts")]
    async fn get_overview(&self, req: GetOverviewRequest) -> std::result::Result<CallToolResult, McpError> {
        match self.get_overview_impl(req).await {
            Ok(resp) => Ok(resp.into_call_tool_result()),
            Err(e) => Ok(ToolResponse::err(&e).into_call_tool_result()),
        }
    }
}

#[tool_handler]
impl ServerHandler for OrchestratorHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "A task-orchestration MCP server: project/feature/task hierarchy with \
                 status-flow validation and cascading status propagation."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
        }
    }
}
