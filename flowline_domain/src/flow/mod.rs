// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flow Coroutine Primitive
//!
//! A flow is a suspendable unit of pipeline logic with three symmetric
//! operations: receive a value from upstream, emit a value downstream, and
//! close the channel. This module implements flows as user futures driven
//! by a wakerless single-step trampoline, which keeps scheduling
//! single-threaded, cooperative, and deterministic: every `recv`, `send`,
//! and `close` is a control transfer to exactly one other flow or to the
//! external caller.
//!
//! ## Scheduling model
//!
//! The driver polls the logic future once per step with a no-op waker and
//! inspects the shared suspension cell:
//!
//! - a pending `send` leaves its value in the outbox; the driver hands it
//!   to whoever demanded it and the `send` resolves at the next poll
//! - a pending `recv` makes the driver pull the bound upstream flow until
//!   it emits, closes, or faults, then resumes the logic with the outcome
//! - a pending `close` makes the driver finalize the upstream chain
//!   head-first and then unwind this flow
//!
//! ## Binding
//!
//! `b.bind(a)` transfers ownership of `a` into `b`. Ownership makes the
//! up/down pairing one-to-one and cycle-free by construction; a second
//! bind is rejected. A non-flow upstream is wrapped in a synthetic
//! `from_feed` flow that emits each element of the feed in order.
//!
//! ## Finalization
//!
//! Scoped resources inside flow logic are ordinary RAII guards owned by
//! the future. Dropping the future releases them in reverse acquisition
//! order, and [`Flow::finalize`] (or dropping the flow) walks the chain
//! most-upstream first, so the producer's resources are released before
//! any downstream unwinding begins. Every termination path funnels through
//! the same walk: normal return, propagated fault, `close`, and external
//! finalization.
//!
//! ## End-of-stream lineage
//!
//! A `BlockedUpstream` synthesized because a live producer closed is
//! *graceful*: a flow that re-propagates it simply ends. A
//! `BlockedUpstream` pulled out of the `Nothing` sentinel is a fault and
//! travels downstream as an error. The distinction is carried by the
//! suspension cell, not by the error value.

mod cell;
mod handle;

pub use handle::{Close, FlowHandle, Recv, Send};

use std::future::Future;
use std::task::{Context, Poll, Waker};

use futures::future::LocalBoxFuture;
use tracing::trace;

use crate::error::StreamError;
use crate::feed::Feed;
use crate::value_objects::FlowId;
use cell::{new_cell, SharedCell, Want};

/// Lifecycle of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Constructed, never resumed
    Fresh,
    /// Resumed at least once and not yet terminated
    Active,
    /// Terminated; every further operation fails with `FlowExit`
    Dead,
}

/// Outcome of resuming a flow.
#[derive(Debug)]
pub enum Resume<O> {
    /// The flow emitted a value
    Emitted(O),
    /// The flow is suspended waiting for input or demand
    Awaiting,
    /// The flow ended (normal return, `close`, or graceful end-of-stream)
    Closed,
}

/// One pull from an upstream producer.
#[derive(Debug)]
pub enum Pull<T> {
    /// The producer emitted a value
    Item(T),
    /// The producer faulted; the fault travels downstream
    Fault(StreamError),
    /// The producer ended its stream
    Closed,
}

/// A pull-driven producer a flow can bind as its upstream.
///
/// Implemented by [`Flow`] itself; the trait erases the producer's own
/// input type so chains of differently-typed flows compose.
pub trait FlowSource<T> {
    /// Advances the producer until it emits, ends, or faults
    fn pull(&mut self) -> Pull<T>;

    /// Tears the producer down, most-upstream first
    fn finalize(&mut self);

    /// Identifier of the producing flow
    fn source_id(&self) -> FlowId;
}

type FlowFuture = LocalBoxFuture<'static, Result<(), StreamError>>;

/// A cooperative coroutine carrying pipeline values from `I` to `O`.
///
/// The logic is any future built from a [`FlowHandle`]; the flow owns the
/// future, its suspension cell, and (once bound) its upstream producer.
///
/// ```
/// use flowline_domain::error::StreamError;
/// use flowline_domain::flow::{Flow, FlowHandle, Resume};
///
/// let mut pair_sum = Flow::new("pair_sum", |h: FlowHandle<i64, i64>| async move {
///     loop {
///         let x = h.recv().await?;
///         let y = h.recv().await?;
///         h.send(x + y).await?;
///     }
/// });
///
/// pair_sum.send(1).unwrap();
/// assert!(matches!(pair_sum.switch(Some(2)).unwrap(), Resume::Emitted(3)));
/// ```
pub struct Flow<I: 'static, O: 'static> {
    id: FlowId,
    name: String,
    // Declared before `future` so teardown stays head-first even when the
    // struct is dropped without an explicit finalize walk.
    up: Option<Box<dyn FlowSource<I>>>,
    up_id: Option<FlowId>,
    future: Option<FlowFuture>,
    cell: SharedCell<I, O>,
    state: FlowState,
    steps: u64,
}

impl<I: 'static, O: 'static> Flow<I, O> {
    /// Creates a fresh flow from its logic.
    ///
    /// The logic runs lazily: nothing executes until the first resume.
    pub fn new<F, Fut>(name: impl Into<String>, logic: F) -> Self
    where
        F: FnOnce(FlowHandle<I, O>) -> Fut,
        Fut: Future<Output = Result<(), StreamError>> + 'static,
    {
        let cell = new_cell();
        let handle = FlowHandle::new(cell.clone());
        let future: FlowFuture = Box::pin(logic(handle));
        Flow {
            id: FlowId::new(),
            name: name.into(),
            up: None,
            up_id: None,
            future: Some(future),
            cell,
            state: FlowState::Fresh,
            steps: 0,
        }
    }

    /// Gets the flow identifier
    pub fn id(&self) -> FlowId {
        self.id
    }

    /// Gets the flow name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the lifecycle state
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// Checks whether the flow has been resumed and not yet terminated
    pub fn active(&self) -> bool {
        matches!(self.state, FlowState::Active)
    }

    /// Gets the resume counter, the flow's execution position.
    ///
    /// Each driver step increments it, so two observations of the same flow
    /// compare progress without inspecting the logic itself.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Gets the identifier of the bound upstream, if any
    pub fn upstream_id(&self) -> Option<FlowId> {
        self.up_id
    }

    /// Checks whether an upstream is bound
    pub fn is_bound(&self) -> bool {
        self.up.is_some()
    }

    /// Binds `upstream` as this flow's producer, taking ownership.
    ///
    /// # Errors
    ///
    /// `FlowExit` when this flow is already dead; `InvalidComposition` when
    /// an upstream is already bound.
    pub fn bind<X: 'static>(&mut self, upstream: Flow<X, I>) -> Result<(), StreamError> {
        self.bind_source(Box::new(upstream))
    }

    /// Binds an already-erased producer.
    pub fn bind_source(&mut self, upstream: Box<dyn FlowSource<I>>) -> Result<(), StreamError> {
        if matches!(self.state, FlowState::Dead) {
            return Err(StreamError::FlowExit);
        }
        if self.up.is_some() {
            return Err(StreamError::invalid_composition(format!(
                "flow {:?} already has an upstream",
                self.name
            )));
        }
        self.up_id = Some(upstream.source_id());
        self.up = Some(upstream);
        Ok(())
    }

    /// Binds any feed, wrapping non-flow feeds in a synthetic emitter flow.
    pub fn bind_feed(&mut self, feed: Feed<I>) -> Result<(), StreamError> {
        match feed {
            Feed::Flow(source) => self.bind_source(source),
            other => self.bind(Flow::from_feed(other)),
        }
    }

    /// Resumes the flow, optionally delivering a value to its pending
    /// `recv`, and reports how it suspended.
    pub fn switch(&mut self, value: Option<I>) -> Result<Resume<O>, StreamError> {
        if let Some(value) = value {
            self.cell.borrow_mut().inbox = Some(value);
        }
        self.advance(true)
    }

    /// Delivers a value and resumes the flow to its next suspension.
    ///
    /// Any value the flow emits along the way stays queued for the next
    /// [`Flow::recv`].
    pub fn send(&mut self, value: I) -> Result<(), StreamError> {
        self.cell.borrow_mut().inbox = Some(value);
        self.advance(false).map(|_| ())
    }

    /// Demands the flow's next emission.
    ///
    /// # Errors
    ///
    /// `BlockedUpstream` when the flow ends (or stalls demanding input with
    /// no producer) before emitting; any fault from the flow's logic.
    pub fn recv(&mut self) -> Result<O, StreamError> {
        match self.advance(true)? {
            Resume::Emitted(value) => Ok(value),
            Resume::Awaiting | Resume::Closed => Err(StreamError::BlockedUpstream),
        }
    }

    /// Closes the flow from outside: downstream demands see end-of-stream
    /// and the chain is torn down head-first.
    pub fn close(&mut self) {
        self.cell.borrow_mut().closed = true;
        self.retire();
    }

    /// Tears the flow down without marking the stream closed first.
    ///
    /// Equivalent to the teardown every run performs on surviving flows.
    pub fn finalize(&mut self) {
        self.retire();
    }

    /// Drives the logic one cooperative step at a time until it emits,
    /// suspends on something only the caller can satisfy, or terminates.
    fn advance(&mut self, take_emitted: bool) -> Result<Resume<O>, StreamError> {
        if matches!(self.state, FlowState::Dead) {
            return Err(StreamError::FlowExit);
        }
        self.state = FlowState::Active;
        loop {
            self.steps += 1;
            let polled = {
                let Some(future) = self.future.as_mut() else {
                    self.state = FlowState::Dead;
                    return Err(StreamError::FlowExit);
                };
                let mut cx = Context::from_waker(Waker::noop());
                future.as_mut().poll(&mut cx)
            };
            match polled {
                Poll::Ready(result) => {
                    let graceful = self.cell.borrow().graceful;
                    self.retire();
                    return match result {
                        Ok(()) => Ok(Resume::Closed),
                        Err(StreamError::FlowExit) => Ok(Resume::Closed),
                        Err(StreamError::BlockedUpstream) if graceful => Ok(Resume::Closed),
                        Err(err) => Err(err),
                    };
                }
                Poll::Pending => {
                    if self.cell.borrow().closed {
                        self.retire();
                        return Ok(Resume::Closed);
                    }
                    if self.cell.borrow().outbox.is_some() {
                        if !take_emitted {
                            return Ok(Resume::Awaiting);
                        }
                        let value = self.cell.borrow_mut().outbox.take();
                        match value {
                            Some(value) => return Ok(Resume::Emitted(value)),
                            None => continue,
                        }
                    }
                    let wants_input = {
                        let cell = self.cell.borrow();
                        matches!(cell.want, Want::Recv)
                            && cell.inbox.is_none()
                            && cell.fault.is_none()
                            && !cell.upstream_done
                    };
                    if !wants_input {
                        return Ok(Resume::Awaiting);
                    }
                    match self.up.as_mut() {
                        Some(upstream) => match upstream.pull() {
                            Pull::Item(value) => self.cell.borrow_mut().inbox = Some(value),
                            Pull::Fault(err) => self.cell.borrow_mut().fault = Some(err),
                            Pull::Closed => self.cell.borrow_mut().upstream_done = true,
                        },
                        None => return Ok(Resume::Awaiting),
                    }
                }
            }
        }
    }

    /// Terminal teardown: upstream chain first, then this flow's future.
    fn retire(&mut self) {
        if let Some(mut upstream) = self.up.take() {
            upstream.finalize();
        }
        if self.future.take().is_some() {
            trace!(flow = %self.name, id = %self.id, "flow finalized");
        }
        self.state = FlowState::Dead;
    }
}

impl<T: 'static> Flow<(), T> {
    /// Wraps a feed in a synthetic flow that emits each element in order.
    ///
    /// Faults in the feed (including the sentinel's `BlockedUpstream`)
    /// terminate the emitter and travel downstream.
    pub fn from_feed(feed: Feed<T>) -> Self {
        Flow::new("from_feed", move |handle: FlowHandle<(), T>| async move {
            for item in feed.into_stream() {
                handle.send(item?).await?;
            }
            Ok(())
        })
    }
}

impl<X: 'static, T: 'static> FlowSource<T> for Flow<X, T> {
    fn pull(&mut self) -> Pull<T> {
        if matches!(self.state, FlowState::Dead) {
            return Pull::Closed;
        }
        match self.advance(true) {
            Ok(Resume::Emitted(value)) => Pull::Item(value),
            Ok(Resume::Closed) => Pull::Closed,
            // A flow stalled on external input has no producer to satisfy it.
            Ok(Resume::Awaiting) => Pull::Fault(StreamError::BlockedUpstream),
            Err(StreamError::FlowExit) => Pull::Closed,
            Err(err) => Pull::Fault(err),
        }
    }

    fn finalize(&mut self) {
        self.retire();
    }

    fn source_id(&self) -> FlowId {
        self.id
    }
}

impl<I: 'static, O: 'static> Drop for Flow<I, O> {
    fn drop(&mut self) {
        self.retire();
    }
}

/// Iterator view of a flow chain; finalizes the chain on exhaustion, on the
/// first fault, and on drop.
pub struct FlowStream<T: 'static> {
    source: Option<Box<dyn FlowSource<T>>>,
}

impl<T: 'static> FlowStream<T> {
    pub fn new(source: Box<dyn FlowSource<T>>) -> Self {
        FlowStream {
            source: Some(source),
        }
    }

    fn finish(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.finalize();
        }
    }
}

impl<T: 'static> Iterator for FlowStream<T> {
    type Item = Result<T, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;
        match source.pull() {
            Pull::Item(value) => Some(Ok(value)),
            Pull::Closed => {
                self.finish();
                None
            }
            Pull::Fault(err) => {
                self.finish();
                Some(Err(err))
            }
        }
    }
}

impl<T: 'static> Drop for FlowStream<T> {
    fn drop(&mut self) {
        self.finish();
    }
}
