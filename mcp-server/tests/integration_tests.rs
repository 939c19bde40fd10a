//! End-to-end application wiring tests: config loading through handler
//! construction, without going through the binary's CLI layer.

use mcp_server::config::Config;
use mcp_server::setup::{create_handler, initialize_app};
use orchestrator_core::config::{AutoCascadeConfig, CleanupConfig};
use std::env;

#[test]
fn default_config_builds_a_handler() {
    let config = Config::default();
    let _handler = create_handler(&config);
}

#[test]
fn initialize_app_succeeds_from_default_config() {
    let config = Config::default();
    assert!(initialize_app(&config).is_ok());
}

#[test]
fn bundled_default_matches_core_defaults() {
    let config: Config =
        serde_yaml::from_str(include_str!("../configuration/default-config.yaml")).unwrap();
    assert_eq!(config.auto_cascade, AutoCascadeConfig::default());
    assert_eq!(config.cleanup, CleanupConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn validate_and_sanitize_falls_back_on_bad_log_level() {
    let mut config = Config::default();
    config.logging.level = "not-a-level".to_string();
    let sanitized = config.validate_and_sanitize();
    assert_eq!(sanitized.logging.level, "info");
}

#[test]
fn validate_and_sanitize_refuses_zero_max_depth() {
    let mut config = Config::default();
    config.auto_cascade.max_depth = 0;
    let sanitized = config.validate_and_sanitize();
    assert_eq!(sanitized.auto_cascade.max_depth, 3);
}

#[test]
fn env_prefixed_overrides_are_layered_by_load() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    env::set_var("MCP_AUTO_CASCADE__MAX_DEPTH", "9");

    let config_dir = temp_dir.path();
    env::set_var("AGENT_CONFIG_DIR", config_dir);
    let config = Config::load().unwrap();

    env::remove_var("MCP_AUTO_CASCADE__MAX_DEPTH");
    env::remove_var("AGENT_CONFIG_DIR");

    assert_eq!(config.auto_cascade.max_depth, 9);
}
