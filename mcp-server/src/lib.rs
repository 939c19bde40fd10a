//! MCP Server Library
//!
//! Configuration loading and application wiring for the stdio-transport task
//! orchestration MCP server. The binary in `main.rs` is a thin CLI shell
//! around what this library exposes.

pub mod config;
pub mod setup;
pub mod telemetry;

pub use config::Config;
pub use setup::{create_handler, create_repository_context, initialize_app};
pub use telemetry::init_telemetry;
