// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging Initialization
//!
//! Installs the global tracing subscriber from an
//! [`ObservabilityConfig`]. The runtime itself only emits through the
//! `tracing` macros; embedding applications that already install a
//! subscriber can skip this module entirely.

use tracing_subscriber::EnvFilter;

use flowline_domain::error::StreamError;

use crate::infrastructure::config::ObservabilityConfig;

/// Installs the global subscriber.
///
/// # Errors
///
/// `Validation` when the filter directive does not parse; `Internal` when
/// a global subscriber is already installed.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), StreamError> {
    let filter = EnvFilter::try_new(&config.log_level)
        .map_err(|err| StreamError::validation(format!("invalid log filter: {}", err)))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let installed = if config.json_output {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| StreamError::internal(format!("cannot install subscriber: {}", err)))
}
