// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage and Flow Identifier Value Objects
//!
//! Type-safe ULID-backed identifiers for the two identity-bearing objects of
//! the domain: stages (immutable pipeline steps) and flows (live coroutine
//! instances spawned during a run).
//!
//! ## Key Features
//!
//! - **Compile-Time Safety**: A `StageId` cannot be confused with a `FlowId`
//! - **Time-Ordered**: ULIDs sort by creation time, so diagnostics list
//!   stages and flows in construction order
//! - **Serialization**: String representation for logs and APIs
//!
//! ## Usage
//!
//! ```
//! use flowline_domain::value_objects::StageId;
//!
//! let id = StageId::new();
//! let parsed: StageId = id.to_string().parse().unwrap();
//! assert_eq!(id, parsed);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use ulid::Ulid;

use crate::error::StreamError;

/// Unique identifier for a pipeline stage.
///
/// Stages are immutable value objects; the identifier distinguishes
/// instances in diagnostics and descriptors, not in any persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StageId(Ulid);

impl StageId {
    /// Generates a new time-ordered stage identifier
    pub fn new() -> Self {
        StageId(Ulid::new())
    }

    /// Gets the creation timestamp encoded in the identifier (Unix millis)
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for StageId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StageId {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(StageId)
            .map_err(|e| StreamError::validation(format!("invalid stage id {:?}: {}", s, e)))
    }
}

/// Unique identifier for a flow instance.
///
/// A fresh `FlowId` is minted for every flow spawned during a run; the
/// upstream link of a bound flow is reported through this identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(Ulid);

impl FlowId {
    /// Generates a new time-ordered flow identifier
    pub fn new() -> Self {
        FlowId(Ulid::new())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FlowId {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s)
            .map(FlowId)
            .map_err(|e| StreamError::validation(format!("invalid flow id {:?}: {}", s, e)))
    }
}
