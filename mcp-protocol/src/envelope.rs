//! The tool response envelope: every tool returns
//! `{success, message, data?, error?, metadata?}` regardless of which
//! operation ran. Batch tools (`manage_container`) always report
//! `success: true` and push per-item failures into their `data` payload
//! instead — only a request-level problem (bad params, a repository
//! outage) produces `success: false` with `error` set. Generalized from a
//! JSON-RPC error object shape to this crate's plain tool envelope.

use orchestrator_core::error::OrchestratorError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use serde_json::Value;

/// `{code, details}`. `code` is one of the seven canonical strings in
/// `orchestrator_core::error::ErrorCode`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub code: &'static str,
    pub details: String,
}

impl From<&OrchestratorError> for ToolError {
    fn from(err: &OrchestratorError) -> Self {
        Self {
            code: err.code().as_str(),
            details: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl ToolResponse {
    /// A successful response carrying a serializable payload.
    pub fn ok(message: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: serde_json::to_value(data).ok(),
            error: None,
            metadata: None,
        }
    }

    /// A successful response with no payload (e.g. a delete that reports
    /// only counts already folded into `message`).
    pub fn ok_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
            metadata: None,
        }
    }

    /// A request-level failure: bad params, a repository outage, anything
    /// that prevented the operation from running at all — distinct from
    /// per-item batch failures, which stay inside a `success: true`
    /// envelope.
    pub fn err(error: &OrchestratorError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            data: None,
            error: Some(error.into()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Serialize) -> Self {
        self.metadata = serde_json::to_value(metadata).ok();
        self
    }

    /// Renders this envelope as the single text content block rmcp expects
    /// from a tool call.
    pub fn into_call_tool_result(self) -> CallToolResult {
        let text = serde_json::to_string(&self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"message":"failed to serialize response: {e}"}}"#)
        });
        CallToolResult::success(vec![Content::text(text)])
    }
}
