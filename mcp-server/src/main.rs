mod config;
mod setup;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use rmcp::ServiceExt;
use setup::initialize_app;
use telemetry::{init_telemetry, log_startup_info};
use tracing::{error, info};

/// Task orchestrator MCP server: a stdio-transport Model Context Protocol
/// process exposing the project/feature/task workflow engine.
#[derive(Parser)]
#[command(name = "task-orchestrator-mcp")]
#[command(about = "Task orchestration MCP server (stdio transport)")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Configuration file path, bypassing `AGENT_CONFIG_DIR` resolution.
    #[arg(short, long, env = "CONFIG_FILE")]
    config: Option<String>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path).with_context(|| format!("failed to load config from {path}"))?,
        None => Config::load().context("failed to load configuration")?,
    };

    let mut config = config.validate_and_sanitize();
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_telemetry(&config).context("failed to initialize telemetry")?;
    log_startup_info(&config);

    let handler = initialize_app(&config).context("failed to initialize application")?;

    info!("task orchestrator MCP server starting on stdio transport");
    let transport = rmcp::transport::stdio();
    let service = handler
        .serve(transport)
        .await
        .inspect_err(|e| error!(error = %e, "failed to start MCP service"))
        .context("failed to start MCP service")?;

    service.waiting().await.context("MCP service loop exited with an error")?;
    info!("task orchestrator MCP server shut down cleanly");
    Ok(())
}
