//! Integration tests for the MCP tool surface.
//!
//! Exercises `OrchestratorHandler`'s tool implementations end to end against
//! the in-memory storage backend, checking the envelope shape rather than
//! the wire-level `CallToolResult` (which is just the envelope JSON-encoded
//! into a single text block).

use orchestrator_core::config::{AutoCascadeConfig, CleanupConfig};
use orchestrator_protocol::router::{
    GetNextTaskRequest, ManageContainerRequest, QueryContainerRequest, RequestTransitionRequest,
};
use orchestrator_protocol::OrchestratorHandler;
use orchestrator_storage::in_memory_repository_context;
use serde_json::json;
use uuid::Uuid;

fn handler() -> OrchestratorHandler {
    OrchestratorHandler::new(in_memory_repository_context(), AutoCascadeConfig::default(), CleanupConfig::default())
}

#[tokio::test]
async fn create_then_query_project_round_trips() {
    let handler = handler();
    let create = ManageContainerRequest {
        operation: "create".into(),
        container_type: "project".into(),
        containers: vec![json!({"name": "Orchestrator Rewrite"})],
        ids: Vec::new(),
        shared_template_ids: Vec::new(),
        force: false,
        delete_sections: true,
    };
    let response = handler.manage_container_impl(create).await.unwrap();
    assert!(response.success);
    let created = response.data.unwrap();
    let project_id: Uuid = created["created"][0]["entity"]["id"].as_str().unwrap().parse().unwrap();

    let query = QueryContainerRequest { container_type: "project".into(), id: project_id };
    let response = handler.query_container_impl(query).await.unwrap();
    assert!(response.success);
    assert_eq!(response.data.unwrap()["name"], "Orchestrator Rewrite");
}

#[tokio::test]
async fn request_transition_rejects_skipped_status() {
    let handler = handler();
    let create = ManageContainerRequest {
        operation: "create".into(),
        container_type: "task".into(),
        containers: vec![json!({"title": "Wire up CI"})],
        ids: Vec::new(),
        shared_template_ids: Vec::new(),
        force: false,
        delete_sections: true,
    };
    let created = handler.manage_container_impl(create).await.unwrap().data.unwrap();
    let task_id: Uuid = created["created"][0]["entity"]["id"].as_str().unwrap().parse().unwrap();

    let skip_ahead = RequestTransitionRequest {
        container_type: "task".into(),
        id: task_id,
        new_status: "completed".into(),
    };
    let err = handler.request_transition_impl(skip_ahead).await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn get_next_task_picks_highest_priority_unblocked_task() {
    let handler = handler();
    let create = ManageContainerRequest {
        operation: "create".into(),
        container_type: "task".into(),
        containers: vec![
            json!({"title": "Low priority cleanup", "priority": "LOW"}),
            json!({"title": "Ship the release", "priority": "HIGH"}),
        ],
        ids: Vec::new(),
        shared_template_ids: Vec::new(),
        force: false,
        delete_sections: true,
    };
    handler.manage_container_impl(create).await.unwrap();

    let response = handler.get_next_task_impl(GetNextTaskRequest::default()).await.unwrap();
    assert!(response.success);
    assert_eq!(response.data.unwrap()["title"], "Ship the release");
}

#[tokio::test]
async fn manage_container_reports_unknown_operation_as_request_error() {
    let handler = handler();
    let req = ManageContainerRequest {
        operation: "archive".into(),
        container_type: "project".into(),
        containers: Vec::new(),
        ids: Vec::new(),
        shared_template_ids: Vec::new(),
        force: false,
        delete_sections: true,
    };
    let err = handler.manage_container_impl(req).await.unwrap_err();
    assert!(err.is_validation());
}
