//! Config structures consumed by `CascadeService`. File I/O and the
//! bundled-default/env-var layering live in `mcp-server`; this crate only
//! needs the parsed shape so cascade logic stays free of filesystem concerns.

use crate::status::role::Role;
use serde::{Deserialize, Serialize};

/// One additive rule: if at least `percentage` of a feature's tasks have
/// reached `role_threshold` or beyond, suggest `target_feature_status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleAggregationRule {
    pub role_threshold: Role,
    pub percentage: f64,
    pub target_feature_status: String,
}

impl RoleAggregationRule {
    /// Percentages must lie in `[0, 1]`; thresholds must be a role this
    /// engine recognizes. Malformed rules are logged and skipped, never
    /// fatal — the loader is responsible for the logging, this just reports
    /// whether the rule is usable.
    pub fn is_valid(&self) -> bool {
        (0.0..=1.0).contains(&self.percentage) && !matches!(self.role_threshold, Role::Custom(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleAggregationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<RoleAggregationRule>,
}

impl Default for RoleAggregationConfig {
    fn default() -> Self {
        Self { enabled: false, rules: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoCascadeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default)]
    pub role_aggregation: RoleAggregationConfig,
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    3
}

impl Default for AutoCascadeConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_depth: default_max_depth(),
            role_aggregation: RoleAggregationConfig::default(),
        }
    }
}

/// Governs `CompletionCleanupService`. Cleanup's on/off switch is tied to the
/// same `auto_cascade.enabled` toggle rather than a separate key; `keep_tags`
/// holds the tag allowlist that exempts a task from delete-on-completion
/// cleanup (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CleanupConfig {
    #[serde(default)]
    pub keep_tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = AutoCascadeConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.max_depth, 3);
        assert!(!cfg.role_aggregation.enabled);
    }

    #[test]
    fn rule_rejects_out_of_range_percentage() {
        let rule = RoleAggregationRule {
            role_threshold: Role::Review,
            percentage: 1.5,
            target_feature_status: "in-review".to_string(),
        };
        assert!(!rule.is_valid());
    }

    #[test]
    fn rule_rejects_an_unrecognized_role_threshold() {
        let rule = RoleAggregationRule {
            role_threshold: Role::parse("revieww"),
            percentage: 0.5,
            target_feature_status: "in-review".to_string(),
        };
        assert!(!rule.is_valid());
    }
}
