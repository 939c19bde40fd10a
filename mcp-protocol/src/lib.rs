//! MCP Protocol Implementation
//!
//! Wires `orchestrator-core`'s workflow engine onto the Model Context
//! Protocol via the `rmcp` SDK: one tool per operation, all returning the
//! shared response envelope rather than raw JSON-RPC errors, so a batch
//! partial failure is distinguishable from a request-level one.
//!
//! # Usage
//!
//! ```no_run
//! use orchestrator_protocol::OrchestratorHandler;
//! use orchestrator_core::config::{AutoCascadeConfig, CleanupConfig};
//! use orchestrator_storage::in_memory_repository_context;
//! use rmcp::ServiceExt;
//!
//! async fn start_server() -> anyhow::Result<()> {
//!     let handler = OrchestratorHandler::new(
//!         in_memory_repository_context(),
//!         AutoCascadeConfig::default(),
//!         CleanupConfig::default(),
//!     );
//!     let transport = rmcp::transport::stdio();
//!     let service = handler.serve(transport).await?;
//!     service.waiting().await?;
//!     Ok(())
//! }
//! ```

pub mod envelope;
pub mod router;

pub use envelope::{ToolError, ToolResponse};
pub use router::OrchestratorHandler;
