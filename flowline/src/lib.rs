// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flowline
//!
//! A stream pipeline runtime built from cooperatively-scheduled stages.
//! Compose a linear chain of producers, transformers, and consumers with
//! `>>`, then run it: the runtime orchestrates demand-driven data flow
//! between stages, deterministic teardown, and error propagation.
//!
//! ```
//! use flowline::application::runner::run;
//! use flowline::stages::{pipe, take};
//! use flowline_domain::coerce::lift;
//!
//! let line = lift(vec![1, 2, 3, 4]) >> pipe(|x: i64| x * x) >> take(2);
//! assert_eq!(run(&line).unwrap(), vec![1, 4]);
//! ```
//!
//! ## Layers
//!
//! - [`application`]: the runner: `run`, `run_with`, `iterate`, and the
//!   configured [`Runner`](application::runner::Runner) with run metrics
//! - [`stages`]: the stage prelude: maps, sinks, producers, windows,
//!   gates, and the tuple calculus
//! - [`infrastructure`]: adapter stages over abstract I/O handles, queue
//!   endpoints, logging initialization, and TOML configuration
//!
//! The core model (stages, flows, composition, coercion) lives in
//! [`flowline_domain`] and is re-exported here for convenience.

pub mod application;
pub mod infrastructure;
pub mod stages;

pub use application::runner::{iterate, run, run_with, RunReport, Runner};
pub use flowline_domain::{
    bind, gen, lift, Feed, Flow, FlowHandle, ItemStream, RunMetrics, Stage, StageDescriptor,
    StreamError, Strategy, WindowSize,
};
