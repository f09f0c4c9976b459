// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Flow Handle
//!
//! The capability object a flow's logic uses for cooperative I/O. The three
//! operations mirror the three suspension points of the scheduling model:
//!
//! - [`FlowHandle::recv`]: demand a value from upstream
//! - [`FlowHandle::send`]: emit a value downstream and wait for the next
//!   demand
//! - [`FlowHandle::close`]: end the stream; downstream demands see
//!   end-of-stream and the flow's resources unwind
//!
//! The handle is threaded into the logic explicitly; there is no
//! process-wide current-flow state. Each operation returns a future that
//! the flow driver single-steps deterministically, so suspension never
//! involves a reactor or timer.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::StreamError;
use crate::flow::cell::{SharedCell, Want};

/// Capability handle for cooperative I/O inside a flow's logic.
pub struct FlowHandle<I: 'static, O: 'static> {
    cell: SharedCell<I, O>,
}

impl<I: 'static, O: 'static> Clone for FlowHandle<I, O> {
    fn clone(&self) -> Self {
        FlowHandle {
            cell: self.cell.clone(),
        }
    }
}

impl<I: 'static, O: 'static> FlowHandle<I, O> {
    pub(crate) fn new(cell: SharedCell<I, O>) -> Self {
        FlowHandle { cell }
    }

    /// Demands the next value from upstream.
    ///
    /// Resolves to `Err(BlockedUpstream)` when no producer remains; logic
    /// may catch that to flush buffered state before ending.
    pub fn recv(&self) -> Recv<I, O> {
        Recv {
            cell: self.cell.clone(),
        }
    }

    /// Emits a value downstream and suspends until the next demand.
    pub fn send(&self, value: O) -> Send<I, O> {
        Send {
            cell: self.cell.clone(),
            value: Some(value),
            queued: false,
        }
    }

    /// Ends this flow's stream.
    ///
    /// The returned future never resolves: the driver observes the closed
    /// state at the next suspension, finalizes the upstream chain
    /// head-first, and then unwinds this flow's resources. Use it as the
    /// logic's tail expression: `handle.close().await`.
    pub fn close(&self) -> Close<I, O> {
        Close {
            cell: self.cell.clone(),
        }
    }
}

/// Future returned by [`FlowHandle::recv`].
pub struct Recv<I: 'static, O: 'static> {
    cell: SharedCell<I, O>,
}

impl<I: 'static, O: 'static> Future for Recv<I, O> {
    type Output = Result<I, StreamError>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut cell = self.cell.borrow_mut();
        if let Some(err) = cell.fault.take() {
            cell.want = Want::Idle;
            return Poll::Ready(Err(err));
        }
        if let Some(value) = cell.inbox.take() {
            cell.want = Want::Idle;
            return Poll::Ready(Ok(value));
        }
        if cell.upstream_done {
            // A live producer closed: this end-of-stream is graceful.
            cell.graceful = true;
            cell.want = Want::Idle;
            return Poll::Ready(Err(StreamError::BlockedUpstream));
        }
        cell.want = Want::Recv;
        Poll::Pending
    }
}

/// Future returned by [`FlowHandle::send`].
pub struct Send<I: 'static, O: 'static> {
    cell: SharedCell<I, O>,
    value: Option<O>,
    queued: bool,
}

impl<I: 'static, O: 'static> Future for Send<I, O> {
    type Output = Result<(), StreamError>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `Send` is never pinned in a way that relies on the address
        // stability of `O`; no field is structurally pinned.
        let this = unsafe { self.get_unchecked_mut() };
        let mut cell = this.cell.borrow_mut();
        if this.queued {
            if cell.outbox.is_none() {
                cell.want = Want::Idle;
                return Poll::Ready(Ok(()));
            }
            cell.want = Want::Emit;
            return Poll::Pending;
        }
        if cell.outbox.is_some() {
            // The previous emission has not been demanded yet.
            cell.want = Want::Emit;
            return Poll::Pending;
        }
        match this.value.take() {
            Some(value) => {
                cell.outbox = Some(value);
                this.queued = true;
                cell.want = Want::Emit;
                Poll::Pending
            }
            None => Poll::Ready(Err(StreamError::internal("send polled after completion"))),
        }
    }
}

/// Future returned by [`FlowHandle::close`].
pub struct Close<I: 'static, O: 'static> {
    cell: SharedCell<I, O>,
}

impl<I: 'static, O: 'static> Future for Close<I, O> {
    type Output = Result<(), StreamError>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut cell = self.cell.borrow_mut();
        cell.closed = true;
        cell.want = Want::Idle;
        Poll::Pending
    }
}
