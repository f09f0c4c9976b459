// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Infrastructure layer: adapters over external resources, logging
//! initialization, and configuration.

pub mod adapters;
pub mod config;
pub mod logging;

pub use adapters::{byte_source, message_source, queue_pull, queue_push, records};
pub use config::{FlowlineConfig, ObservabilityConfig, RunnerSettings};
pub use logging::init_logging;
