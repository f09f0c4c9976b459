// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flowline Domain
//!
//! The domain layer of the flowline stream pipeline runtime: the stage
//! composition algebra and the cooperative execution model that animates
//! it, independent of any runtime surface, adapter, or configuration
//! concern.
//!
//! ## Module Structure
//!
//! - [`error`]: the domain error taxonomy, including the two stream
//!   control signals (`BlockedUpstream`, `FlowExit`)
//! - [`value_objects`]: identifiers, validated window capacities, the
//!   evaluation strategy, and the serializable stage descriptor
//! - [`feed`]: the upstream model: live streams, live flows, and the
//!   `Nothing` sentinel that primes every run
//! - [`flow`]: the coroutine primitive with `recv`/`send`/`close`,
//!   deterministic single-threaded scheduling, and head-first finalization
//! - [`entities`]: the immutable [`Stage`](entities::Stage) entity with
//!   its lazy, strict, and flow evaluation strategies, and the
//!   [`RunMetrics`](entities::RunMetrics) record
//! - [`compose`]: `bind`, the `>>`/`<<` composition operators, and the
//!   `|` decomposition operator
//! - [`coerce`]: the explicit source-kind enumeration lifting containers
//!   and iterators into stages
//!
//! ## Core Concepts
//!
//! A pipeline is a linear chain of immutable stages. Running one seeds the
//! head with the `Nothing` sentinel and pulls the tail; demand propagates
//! upstream one control transfer at a time, so scheduling is cooperative,
//! single-threaded, and deterministic. End-of-stream, faults, and
//! cooperative shutdown all travel through the same `StreamError` taxonomy,
//! and every flow spawned by a run is finalized head-first before the run
//! returns.
//!
//! ## Invariants
//!
//! - A stage's name, strategy, composite flag, and logic never change after
//!   construction; running a pipeline mutates no stage composed into it.
//! - A composite's arity equals the count of primitive stages fused into
//!   it, and composition is associative under `run`.
//! - A flow is bound to at most one upstream, the binding is cycle-free by
//!   ownership, and a dead flow rejects every operation with `FlowExit`.
//! - Scoped resources acquired inside flow logic are released exactly once,
//!   in reverse acquisition order within a flow and head-first across a
//!   chain.

pub mod coerce;
pub mod compose;
pub mod entities;
pub mod error;
pub mod feed;
pub mod flow;
pub mod value_objects;

pub use coerce::{gen, lift, IntoStage, SourceKind};
pub use compose::bind;
pub use entities::{RunMetrics, Stage};
pub use error::StreamError;
pub use feed::{Feed, ItemStream};
pub use flow::{Flow, FlowHandle, FlowSource, FlowState, FlowStream, Pull, Resume};
pub use value_objects::{FlowId, StageDescriptor, StageId, Strategy, WindowSize};
