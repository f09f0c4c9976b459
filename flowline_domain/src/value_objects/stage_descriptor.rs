// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Evaluation Strategy and Stage Descriptor
//!
//! The evaluation strategy categorizes stages by how their output comes into
//! existence, and the descriptor is the serializable diagnostic view of a
//! stage. Stages themselves are deliberately not serializable: their logic
//! is a closure, and cloning a stage through a serialization boundary would
//! silently duplicate captured state across a run.
//!
//! ## Strategies
//!
//! - **Lazy**: output is produced element-by-element as the downstream
//!   demands it; an infinite source behind a lazy stage is valid
//! - **Strict**: output is fully materialized before the first element is
//!   yielded; failures surface eagerly
//! - **Flow**: the logic is a suspendable coroutine driven by the pull
//!   schedule

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::error::StreamError;
use crate::value_objects::StageId;

/// How a stage's logic turns an upstream into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Pull-driven: produce only as far as demanded
    Lazy,
    /// Eager: materialize everything before yielding
    Strict,
    /// Coroutine: suspend between receive and emit
    Flow,
}

impl Strategy {
    /// Gets the lowercase name of the strategy
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Lazy => "lazy",
            Strategy::Strict => "strict",
            Strategy::Flow => "flow",
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lazy" => Ok(Strategy::Lazy),
            "strict" => Ok(Strategy::Strict),
            "flow" => Ok(Strategy::Flow),
            _ => Err(StreamError::validation(format!("unknown strategy: {}", s))),
        }
    }
}

/// Serializable diagnostic view of a stage.
///
/// Carries everything about a stage except its logic: identity, name,
/// strategy, whether it is the fusion of other stages, how many primitive
/// stages it fuses, and the construction-time parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    id: StageId,
    name: String,
    strategy: Strategy,
    composite: bool,
    arity: usize,
    params: serde_json::Value,
}

impl StageDescriptor {
    /// Creates a descriptor from stage attributes
    pub fn new(
        id: StageId,
        name: impl Into<String>,
        strategy: Strategy,
        composite: bool,
        arity: usize,
        params: serde_json::Value,
    ) -> Self {
        StageDescriptor {
            id,
            name: name.into(),
            strategy,
            composite,
            arity,
            params,
        }
    }

    /// Gets the stage identifier
    pub fn id(&self) -> StageId {
        self.id
    }

    /// Gets the stage name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the evaluation strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Checks whether the stage is a fusion of other stages
    pub fn is_composite(&self) -> bool {
        self.composite
    }

    /// Gets the count of primitive stages fused into this one
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Gets the construction-time parameter map
    pub fn params(&self) -> &serde_json::Value {
        &self.params
    }
}

impl Display for StageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}; arity {}]", self.name, self.strategy, self.arity)
    }
}
