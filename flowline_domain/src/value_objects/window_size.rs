// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Window Size Value Object
//!
//! Validated capacity for bounded strict stages. A bounded strict stage
//! retains only the most recent `WindowSize` elements of its materialized
//! output, in insertion order.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::error::StreamError;

/// Validated sliding-window capacity for bounded strict stages.
///
/// The window must hold at least one element; the upper bound guards
/// against accidentally materializing an unbounded stream through a typo'd
/// capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowSize(usize);

impl WindowSize {
    /// Minimum window capacity (one element)
    pub const MIN: usize = 1;

    /// Maximum window capacity
    pub const MAX: usize = 16 * 1024 * 1024;

    /// Default window capacity
    pub const DEFAULT: usize = 1024;

    /// Creates a validated window size
    ///
    /// # Errors
    ///
    /// Returns `Validation` when the capacity is zero or above [`Self::MAX`].
    pub fn new(capacity: usize) -> Result<Self, StreamError> {
        if capacity < Self::MIN {
            return Err(StreamError::validation("window size must hold at least one element"));
        }
        if capacity > Self::MAX {
            return Err(StreamError::validation(format!(
                "window size {} exceeds the maximum of {}",
                capacity,
                Self::MAX
            )));
        }
        Ok(WindowSize(capacity))
    }

    /// Gets the capacity as a plain count
    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize(Self::DEFAULT)
    }
}

impl Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
