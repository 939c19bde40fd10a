//! Config loader: reads `AGENT_CONFIG_DIR/.taskorchestrator/config.yaml`,
//! falling back to the bundled `configuration/default-config.yaml`, with
//! `MCP_`-prefixed environment overrides layered on top. Shaped after a
//! `Config::from_env`/`from_file` source-layering pattern built on the
//! `config` crate, using YAML rather than TOML.

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use orchestrator_core::config::AutoCascadeConfig;
use orchestrator_core::config::CleanupConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auto_cascade: AutoCascadeConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Pretty }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Config {
    /// Resolves `AGENT_CONFIG_DIR` (falling back to the process working
    /// directory) and loads `.taskorchestrator/config.yaml` from it, layered
    /// over the bundled default and under `MCP_`-prefixed env overrides.
    pub fn load() -> Result<Self> {
        let config_dir = env::var("AGENT_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from_dir(&config_dir)
    }

    fn load_from_dir(config_dir: &std::path::Path) -> Result<Self> {
        let config_path = config_dir.join(".taskorchestrator").join("config.yaml");

        let mut builder = ConfigBuilder::builder().add_source(File::from_str(
            include_str!("../configuration/default-config.yaml"),
            FileFormat::Yaml,
        ));

        builder = builder.add_source(
            File::from(config_path)
                .format(FileFormat::Yaml)
                .required(false),
        );

        builder = builder.add_source(
            Environment::with_prefix("MCP")
                .separator("__")
                .try_parsing(true),
        );

        let built = builder.build().context("failed to build configuration")?;
        built
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// Loads directly from a specific file, bypassing `AGENT_CONFIG_DIR`
    /// resolution (used by `--config`).
    pub fn from_file(path: &str) -> Result<Self> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from_str(
                include_str!("../configuration/default-config.yaml"),
                FileFormat::Yaml,
            ))
            .add_source(File::with_name(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("MCP")
                    .separator("__")
                    .try_parsing(true),
            );

        let built = builder
            .build()
            .context("failed to build configuration from file")?;
        built
            .try_deserialize()
            .context("failed to deserialize configuration from file")
    }

    /// Validates log level and cascade depth; drops malformed role
    /// aggregation rules rather than failing the whole load — malformed
    /// entries are logged and skipped, never fatal.
    pub fn validate_and_sanitize(mut self) -> Self {
        if !matches!(self.logging.level.to_lowercase().as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            tracing::warn!(level = %self.logging.level, "unrecognized log level, falling back to info");
            self.logging.level = "info".to_string();
        }

        if self.auto_cascade.max_depth == 0 {
            tracing::warn!("auto_cascade.max_depth of 0 would disable cascading entirely, using default of 3");
            self.auto_cascade.max_depth = 3;
        }

        let before = self.auto_cascade.role_aggregation.rules.len();
        self.auto_cascade.role_aggregation.rules.retain(|rule| rule.is_valid());
        let dropped = before - self.auto_cascade.role_aggregation.rules.len();
        if dropped > 0 {
            tracing::warn!(dropped, "skipped malformed role_aggregation rule(s)");
        }

        self
    }
}
