use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::{Config, LogFormat};

/// Initialize the tracing subscriber for logging and telemetry.
pub fn init_telemetry(config: &Config) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid log level configuration")?;

    let registry = Registry::default().with(env_filter);

    match config.logging.format {
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer()
                .pretty()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true);
            registry.with(fmt_layer).init();
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_list(true)
                .flatten_event(true);
            registry.with(fmt_layer).init();
        }
        LogFormat::Compact => {
            let fmt_layer = fmt::layer()
                .compact()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false);
            registry.with(fmt_layer).init();
        }
    }

    tracing::info!(
        log_level = %config.logging.level,
        log_format = ?config.logging.format,
        "telemetry initialized"
    );

    Ok(())
}

/// Span for one repository call.
#[macro_export]
macro_rules! repository_span {
    ($operation:expr) => {
        tracing::info_span!("repository_operation", operation = $operation)
    };
}

/// Span for one MCP tool invocation.
#[macro_export]
macro_rules! tool_span {
    ($tool:expr) => {
        tracing::info_span!("mcp_tool", tool = $tool)
    };
}

pub fn log_startup_info(config: &Config) {
    tracing::info!(
        auto_cascade_enabled = config.auto_cascade.enabled,
        auto_cascade_max_depth = config.auto_cascade.max_depth,
        "task orchestrator starting up"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_variants_cover_config_options() {
        let configs = vec![LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];
        for format in configs {
            assert!(matches!(format, LogFormat::Pretty | LogFormat::Json | LogFormat::Compact));
        }
    }
}
