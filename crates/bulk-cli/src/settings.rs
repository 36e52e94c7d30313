//! Layered runtime settings.
//!
//! [`Settings`] is loaded by `ortho_config` from, in rising precedence, the
//! built-in defaults, a TOML file (`--config-path`, `BULK_CONFIG_PATH` or a
//! discovered `.bulk.toml`), `BULK_*` environment variables and the
//! configuration flags on the command line.

use bulk_api::{BatchRule, FailurePolicy, REPORT_EXECUTOR};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::logging::LogFormat;

/// Default number of bytes read from the input at a time.
pub(crate) const DEFAULT_CHUNK_SIZE: usize = bulk_api::splitter::DEFAULT_CHUNK_SIZE;

/// Default tracing filter directive.
pub(crate) const DEFAULT_LOG_FILTER: &str = "info";

/// Reaction to an executor rejecting a command.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub(crate) enum PolicySetting {
    /// Stop the batch at the first rejected command.
    #[default]
    FailFast,
    /// Report the rejection and continue with the next command.
    BestEffort,
}

impl From<PolicySetting> for FailurePolicy {
    fn from(value: PolicySetting) -> Self {
        match value {
            PolicySetting::FailFast => Self::FailFast,
            PolicySetting::BestEffort => Self::BestEffort,
        }
    }
}

/// Whether a batch must open with its single `config` command.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub(crate) enum BatchRuleSetting {
    #[default]
    ConfigurationFirst,
    Unconstrained,
}

impl From<BatchRuleSetting> for BatchRule {
    fn from(value: BatchRuleSetting) -> Self {
        match value {
            BatchRuleSetting::ConfigurationFirst => Self::ConfigurationFirst,
            BatchRuleSetting::Unconstrained => Self::Unconstrained,
        }
    }
}

/// Settings shared by every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "BULK")]
pub(crate) struct Settings {
    /// Reaction to a rejected command.
    #[ortho_config(default = PolicySetting::FailFast)]
    pub(crate) failure_policy: PolicySetting,
    /// Batch structure rule.
    #[ortho_config(default = BatchRuleSetting::ConfigurationFirst)]
    pub(crate) batch_rule: BatchRuleSetting,
    /// Number of bytes read from the input at a time.
    #[ortho_config(default = DEFAULT_CHUNK_SIZE)]
    pub(crate) chunk_size: usize,
    /// Registered executor that carries out the commands.
    #[ortho_config(default = String::from(REPORT_EXECUTOR))]
    pub(crate) executor: String,
    /// Tracing filter directive.
    #[ortho_config(default = String::from(DEFAULT_LOG_FILTER))]
    pub(crate) log_filter: String,
    /// Log output format written to standard error.
    #[ortho_config(default = LogFormat::Compact)]
    pub(crate) log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            failure_policy: PolicySetting::default(),
            batch_rule: BatchRuleSetting::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            executor: String::from(REPORT_EXECUTOR),
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("fail-fast", PolicySetting::FailFast)]
    #[case("BEST-EFFORT", PolicySetting::BestEffort)]
    fn policies_parse_case_insensitively(#[case] text: &str, #[case] expected: PolicySetting) {
        assert_eq!(PolicySetting::from_str(text).expect("known policy"), expected);
    }

    #[test]
    fn batch_rules_map_onto_processor_rules() {
        let rule = BatchRuleSetting::from_str("unconstrained").expect("known rule");
        assert_eq!(BatchRule::from(rule), BatchRule::Unconstrained);
        assert_eq!(
            BatchRule::from(BatchRuleSetting::default()),
            BatchRule::ConfigurationFirst
        );
    }

    #[test]
    fn settings_deserialise_from_kebab_case_values() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "failure_policy": "best-effort",
            "batch_rule": "unconstrained",
            "chunk_size": 4,
            "executor": "report",
            "log_filter": "debug",
            "log_format": "json",
        }))
        .expect("valid settings");

        assert_eq!(settings.failure_policy, PolicySetting::BestEffort);
        assert_eq!(settings.batch_rule, BatchRuleSetting::Unconstrained);
        assert_eq!(settings.chunk_size, 4);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.failure_policy, PolicySetting::FailFast);
        assert_eq!(settings.batch_rule, BatchRuleSetting::ConfigurationFirst);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(settings.executor, REPORT_EXECUTOR);
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(settings.log_format, LogFormat::Compact);
    }
}
