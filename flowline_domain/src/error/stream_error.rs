// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! This module provides the error system for the stream pipeline domain. It
//! categorizes every failure a pipeline run can surface and keeps the two
//! stream-control signals (`BlockedUpstream`, `FlowExit`) in the same
//! taxonomy so stage logic can match on a single type.
//!
//! ## Overview
//!
//! - **Domain-Specific**: Errors are tailored to stream pipeline concepts
//! - **Hierarchical**: Variants are grouped by category for systematic
//!   handling
//! - **Signals vs faults**: End-of-stream and cooperative shutdown are
//!   modeled as dedicated variants, not as wrapped payloads
//! - **Interoperable**: Conversions from standard library and serde errors
//!
//! ## Error Categories
//!
//! ### Stream control
//! - **BlockedUpstream**: A consumer demanded input past end-of-stream or
//!   with no live producer. Stage logic may catch it to perform graceful
//!   end-of-input behavior; otherwise it travels downstream as
//!   end-of-stream.
//! - **FlowExit**: The cooperative shutdown signal for a flow. The runner
//!   consumes it and never surfaces it to the caller.
//!
//! ### Composition errors
//! - **CannotCoerce**: A value could not be lifted into a pipeline item.
//! - **InvalidComposition**: A stage or flow was wired illegally (for
//!   example, binding an upstream twice).
//! - **Validation**: A configuration or parameter value failed its rules.
//!
//! ### Processing errors
//! - **Processing**: A stage's own logic failed.
//! - **ResourceExhausted**: A run exceeded a configured bound.
//!
//! ### Infrastructure errors
//! - **Io**, **Channel**: Adapter-layer failures talking to external
//!   handles and queue endpoints.
//!
//! ### System errors
//! - **Cancelled**, **Internal**: Operator-initiated teardown and bugs.

use thiserror::Error;

/// Domain-specific errors for the stream pipeline runtime.
///
/// Every item travelling through a pipeline is a `Result<T, StreamError>`;
/// an `Err` item is a fault that surfaces from the runner after the chain
/// has been torn down. The two control variants are special:
/// `BlockedUpstream` marks end-of-stream at a demand site and `FlowExit`
/// marks cooperative shutdown of a flow.
///
/// ## Design Principles
///
/// - **Specific**: Each variant represents one failure mode
/// - **Actionable**: Messages carry enough context for debugging
/// - **Categorized**: `category()` groups variants for logging and metrics
/// - **Cloneable**: Items can be re-yielded and recorded without cost
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("blocked upstream: input demanded past end-of-stream")]
    BlockedUpstream,

    #[error("flow exit")]
    FlowExit,

    #[error("cannot coerce: {0}")]
    CannotCoerce(String),

    #[error("invalid composition: {0}")]
    InvalidComposition(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("processing failed: {0}")]
    Processing(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("cancelled: {0}")]
    Cancelled(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StreamError {
    /// Creates a new coercion error
    pub fn cannot_coerce(msg: impl Into<String>) -> Self {
        Self::CannotCoerce(msg.into())
    }

    /// Creates a new composition error
    pub fn invalid_composition(msg: impl Into<String>) -> Self {
        Self::InvalidComposition(msg.into())
    }

    /// Creates a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new processing error
    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing(msg.into())
    }

    /// Creates a new resource exhausted error
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Creates a new IO error
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates a new channel error
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Creates a new cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Creates a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Checks whether the error marks end-of-stream rather than a fault
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, StreamError::BlockedUpstream)
    }

    /// Checks whether the error is the cooperative shutdown signal
    pub fn is_shutdown(&self) -> bool {
        matches!(self, StreamError::FlowExit | StreamError::Cancelled(_))
    }

    /// Checks if the error is recoverable by retrying the operation
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StreamError::Io(_) | StreamError::Channel(_) | StreamError::ResourceExhausted(_)
        )
    }

    /// Gets the error category
    pub fn category(&self) -> &'static str {
        match self {
            StreamError::BlockedUpstream => "end-of-stream",
            StreamError::FlowExit => "shutdown",
            StreamError::CannotCoerce(_) => "coercion",
            StreamError::InvalidComposition(_) => "composition",
            StreamError::Validation(_) => "validation",
            StreamError::Processing(_) => "processing",
            StreamError::ResourceExhausted(_) => "resource",
            StreamError::Io(_) => "io",
            StreamError::Channel(_) => "channel",
            StreamError::Cancelled(_) => "cancellation",
            StreamError::Internal(_) => "internal",
        }
    }
}

// Implement conversion from standard library errors
impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::CannotCoerce(err.to_string())
    }
}
