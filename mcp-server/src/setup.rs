//! Application wiring: turns a loaded [`Config`] into a ready-to-serve
//! [`OrchestratorHandler`]. Shaped after a `create_repository` /
//! `create_server` / `initialize_app` split, re-pointed at the in-memory
//! repository context and the stdio MCP handler.

use anyhow::Result;
use orchestrator_protocol::OrchestratorHandler;
use orchestrator_storage::in_memory_repository_context;
use tracing::info;

use crate::config::Config;

/// Builds the shared in-memory repository context the handler operates on.
///
/// The orchestrator has no persistent store: every process starts from an
/// empty project/feature/task graph.
pub fn create_repository_context() -> orchestrator_core::repository::RepositoryContext {
    info!("creating in-memory repository context");
    in_memory_repository_context()
}

/// Builds the MCP tool handler from a validated configuration.
pub fn create_handler(config: &Config) -> OrchestratorHandler {
    info!("creating orchestrator MCP handler");
    OrchestratorHandler::new(
        create_repository_context(),
        config.auto_cascade.clone(),
        config.cleanup.clone(),
    )
}

/// Loads configuration and builds the handler in one step.
pub fn initialize_app(config: &Config) -> Result<OrchestratorHandler> {
    info!("initializing application");
    Ok(create_handler(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_handler_builds_from_default_config() {
        let config = Config::default();
        let _handler = create_handler(&config);
    }

    #[test]
    fn initialize_app_succeeds_with_default_config() {
        let config = Config::default();
        assert!(initialize_app(&config).is_ok());
    }
}
