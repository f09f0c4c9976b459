// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Run Metrics Entity
//!
//! Operational record of a single pipeline run: when it started and
//! finished, how many items reached the materializer, and how it ended.
//! The runner owns the instance for the duration of the run and freezes it
//! on completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StreamError;

/// Performance and outcome record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    stage_name: String,
    stage_arity: usize,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    items_emitted: u64,
    error_category: Option<String>,
}

impl RunMetrics {
    /// Starts a metrics record for a run of the named line
    pub fn begin(stage_name: impl Into<String>, stage_arity: usize) -> Self {
        RunMetrics {
            stage_name: stage_name.into(),
            stage_arity,
            started_at: Utc::now(),
            completed_at: None,
            items_emitted: 0,
            error_category: None,
        }
    }

    /// Records one item reaching the materializer
    pub fn record_item(&mut self) {
        self.items_emitted += 1;
    }

    /// Freezes the record as a successful run
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Freezes the record as a failed run
    pub fn fail(&mut self, err: &StreamError) {
        self.error_category = Some(err.category().to_string());
        self.completed_at = Some(Utc::now());
    }

    /// Gets the name of the line that ran
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// Gets the count of primitive stages in the line
    pub fn stage_arity(&self) -> usize {
        self.stage_arity
    }

    /// Gets the run start timestamp
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Gets the run completion timestamp, if the run has ended
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Gets the count of items that reached the materializer
    pub fn items_emitted(&self) -> u64 {
        self.items_emitted
    }

    /// Gets the category of the error that ended the run, if any
    pub fn error_category(&self) -> Option<&str> {
        self.error_category.as_deref()
    }

    /// Checks whether the run ended without a fault
    pub fn succeeded(&self) -> bool {
        self.completed_at.is_some() && self.error_category.is_none()
    }

    /// Gets the wall-clock duration of the run, if it has ended
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }
}
