// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Runner
//!
//! Drives a composed line to completion. A run seeds the head of the chain
//! with the `Nothing` sentinel, pulls the tail through a *decomposer* (the
//! final materializer), and guarantees that every flow spawned during the
//! run is finalized head-first before control returns, on success, on
//! fault, and on early exhaustion alike.
//!
//! Three entry points cover the decomposer spectrum:
//!
//! - [`run`] materializes the line into a `Vec`
//! - [`run_with`] applies a caller-supplied decomposer
//! - [`iterate`] is the identity decomposer: a lazy iterator for stepwise
//!   consumption from outside the pipeline, finalizing on drop
//!
//! [`Runner`] wraps the same loop with run metrics, optional per-item
//! tracing, and a materialization cap.

use tracing::{debug, debug_span, trace, warn};

use flowline_domain::entities::RunMetrics;
use flowline_domain::error::StreamError;
use flowline_domain::feed::{Feed, ItemStream};
use flowline_domain::Stage;

use crate::infrastructure::config::RunnerSettings;

/// Runs a line and materializes its output into a `Vec`.
///
/// A fault reaching the materializer aborts the run with that error after
/// the chain has been torn down; end-of-stream returns whatever was
/// materialized so far.
pub fn run<O: 'static>(line: &Stage<(), O>) -> Result<Vec<O>, StreamError> {
    let span = debug_span!("pipeline_run", line = %line.name(), arity = line.arity());
    let _guard = span.enter();
    let mut stream = line.stream(Feed::nothing());
    let mut values = Vec::new();
    loop {
        match stream.next() {
            Some(Ok(value)) => values.push(value),
            Some(Err(err)) => {
                // Teardown before the fault escapes.
                drop(stream);
                warn!(error = %err, category = err.category(), "pipeline run failed");
                return Err(err);
            }
            None => break,
        }
    }
    drop(stream);
    debug!(items = values.len(), "pipeline run complete");
    Ok(values)
}

/// Runs a line through a caller-supplied decomposer.
///
/// The decomposer receives the tail stream directly; dropping the stream
/// finalizes the chain, so a decomposer that consumes only a prefix still
/// tears everything down.
pub fn run_with<O: 'static, R>(
    line: &Stage<(), O>,
    decomposer: impl FnOnce(ItemStream<O>) -> R,
) -> R {
    decomposer(line.stream(Feed::nothing()))
}

/// Runs a line with the identity decomposer: a lazy stream of results.
///
/// Equivalent to `run_with(line, |s| s)`; the returned iterator finalizes
/// the chain when exhausted or dropped, which makes stepwise external
/// consumption safe.
pub fn iterate<O: 'static>(line: &Stage<(), O>) -> RunStream<O> {
    RunStream {
        inner: line.stream(Feed::nothing()),
    }
}

/// Lazy iterator over a running line.
pub struct RunStream<O: 'static> {
    inner: ItemStream<O>,
}

impl<O: 'static> Iterator for RunStream<O> {
    type Item = Result<O, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// Output of a [`Runner`] run: the materialized values plus the metrics
/// record of the run.
#[derive(Debug)]
pub struct RunReport<O> {
    pub values: Vec<O>,
    pub metrics: RunMetrics,
}

/// A configured runner.
///
/// Adds to the plain [`run`] loop: a [`RunMetrics`] record per run, an
/// optional cap on materialized items (surfaced as `ResourceExhausted`),
/// and optional per-item trace logging.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    settings: RunnerSettings,
}

impl Runner {
    /// Creates a runner with the given settings
    pub fn new(settings: RunnerSettings) -> Self {
        Runner { settings }
    }

    /// Gets the runner's settings
    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Runs a line, materializing values and recording metrics
    pub fn run<O: 'static>(&self, line: &Stage<(), O>) -> Result<RunReport<O>, StreamError> {
        let span = debug_span!("pipeline_run", line = %line.name(), arity = line.arity());
        let _guard = span.enter();
        let mut metrics = RunMetrics::begin(line.name(), line.arity());
        let mut stream = line.stream(Feed::nothing());
        let mut values = Vec::new();
        loop {
            match stream.next() {
                Some(Ok(value)) => {
                    if let Some(cap) = self.settings.max_materialized {
                        if values.len() >= cap {
                            drop(stream);
                            let err = StreamError::resource_exhausted(format!(
                                "run materialized more than {} items",
                                cap
                            ));
                            metrics.fail(&err);
                            warn!(error = %err, "pipeline run aborted at materialization cap");
                            return Err(err);
                        }
                    }
                    if self.settings.trace_items {
                        trace!(index = values.len(), "item materialized");
                    }
                    metrics.record_item();
                    values.push(value);
                }
                Some(Err(err)) => {
                    drop(stream);
                    metrics.fail(&err);
                    warn!(error = %err, category = err.category(), "pipeline run failed");
                    return Err(err);
                }
                None => break,
            }
        }
        drop(stream);
        metrics.complete();
        debug!(items = metrics.items_emitted(), "pipeline run complete");
        Ok(RunReport { values, metrics })
    }
}
