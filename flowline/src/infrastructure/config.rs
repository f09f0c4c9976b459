// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Configuration
//!
//! TOML-backed configuration for the runtime surface: observability
//! settings for the logging subscriber and runner settings for run
//! instrumentation. Every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```toml
//! [observability]
//! log_level = "flowline=debug"
//! json_output = false
//!
//! [runner]
//! max_materialized = 100000
//! trace_items = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use flowline_domain::error::StreamError;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlowlineConfig {
    pub observability: ObservabilityConfig,
    pub runner: RunnerSettings,
}

/// Settings for the tracing subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Env-filter directive string (for example `"info"` or
    /// `"flowline=debug"`)
    pub log_level: String,
    /// Emit machine-readable JSON instead of the human-readable format
    pub json_output: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

/// Settings for the configured runner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerSettings {
    /// Abort a run once this many items have been materialized
    pub max_materialized: Option<usize>,
    /// Log every materialized item at trace level
    pub trace_items: bool,
}

impl FlowlineConfig {
    /// Parses a configuration from a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, StreamError> {
        let config: FlowlineConfig = toml::from_str(text)
            .map_err(|err| StreamError::validation(format!("invalid configuration: {}", err)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and parses a configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, StreamError> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|err| {
            StreamError::io(format!(
                "cannot read configuration {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        Self::from_toml_str(&text)
    }

    /// Validates cross-field rules
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.observability.log_level.trim().is_empty() {
            return Err(StreamError::validation("log_level must not be empty"));
        }
        if self.runner.max_materialized == Some(0) {
            return Err(StreamError::validation(
                "max_materialized must allow at least one item",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = FlowlineConfig::from_toml_str("").unwrap();
        assert_eq!(config, FlowlineConfig::default());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_full_document_parses() {
        let config = FlowlineConfig::from_toml_str(
            r#"
            [observability]
            log_level = "flowline=debug"
            json_output = true

            [runner]
            max_materialized = 10
            trace_items = true
            "#,
        )
        .unwrap();
        assert!(config.observability.json_output);
        assert_eq!(config.runner.max_materialized, Some(10));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = FlowlineConfig::from_toml_str("[runner]\nworkers = 4\n").unwrap_err();
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn test_zero_cap_rejected() {
        let err =
            FlowlineConfig::from_toml_str("[runner]\nmax_materialized = 0\n").unwrap_err();
        assert_eq!(err.category(), "validation");
    }
}
