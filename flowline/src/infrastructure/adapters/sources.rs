// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Source Adapter Stages
//!
//! Adapter stages over abstract I/O handles. The core defines no file
//! formats and opens no sockets; it consumes anything exposing the
//! [`ByteSource`] or [`MessageSource`] port shape: `recv()` until EOF,
//! then `close()`. The adapter owns the handle for the duration of a run
//! and closes it on every exit path, including faults and early teardown.
//!
//! Handles are single-shot: a second run of the same adapter stage faults
//! instead of silently reopening a consumed handle.

use std::cell::RefCell;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use tracing::trace;

use flowline_domain::error::StreamError;
use flowline_domain::flow::{Flow, FlowHandle};
use flowline_domain::Stage;

/// Port for a handle supplying framed bytes.
///
/// `recv` returns `Ok(None)` at end of input. `close` releases the
/// underlying resource; the adapter calls it exactly once.
pub trait ByteSource {
    fn recv(&mut self) -> Result<Option<Vec<u8>>, StreamError>;
    fn close(&mut self) -> Result<(), StreamError>;
}

/// Port for a handle supplying structured messages.
pub trait MessageSource {
    fn recv(&mut self) -> Result<Option<serde_json::Value>, StreamError>;
    fn close(&mut self) -> Result<(), StreamError>;
}

/// Closes a byte handle when dropped, whatever path unwound the flow.
struct ByteGuard<H: ByteSource> {
    handle: Option<H>,
}

impl<H: ByteSource> ByteGuard<H> {
    fn new(handle: H) -> Self {
        ByteGuard {
            handle: Some(handle),
        }
    }

    fn recv(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        match self.handle.as_mut() {
            Some(handle) => handle.recv(),
            None => Ok(None),
        }
    }
}

impl<H: ByteSource> Drop for ByteGuard<H> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(err) = handle.close() {
                trace!(error = %err, "byte source close failed during teardown");
            }
        }
    }
}

struct MessageGuard<H: MessageSource> {
    handle: Option<H>,
}

impl<H: MessageSource> MessageGuard<H> {
    fn new(handle: H) -> Self {
        MessageGuard {
            handle: Some(handle),
        }
    }

    fn recv(&mut self) -> Result<Option<serde_json::Value>, StreamError> {
        match self.handle.as_mut() {
            Some(handle) => handle.recv(),
            None => Ok(None),
        }
    }
}

impl<H: MessageSource> Drop for MessageGuard<H> {
    fn drop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(err) = handle.close() {
                trace!(error = %err, "message source close failed during teardown");
            }
        }
    }
}

/// Producer stage emitting byte frames from a [`ByteSource`] until EOF.
pub fn byte_source<I: 'static, H: ByteSource + 'static>(handle: H) -> Stage<I, Vec<u8>> {
    let slot = Rc::new(RefCell::new(Some(handle)));
    Stage::flow("byte_source", move || {
        let slot = Rc::clone(&slot);
        Flow::new("byte_source", move |h: FlowHandle<I, Vec<u8>>| async move {
            let taken = slot.borrow_mut().take();
            let Some(handle) = taken else {
                return Err(StreamError::processing(
                    "byte source handle already consumed by an earlier run",
                ));
            };
            let mut guard = ByteGuard::new(handle);
            loop {
                match guard.recv()? {
                    Some(frame) => h.send(frame).await?,
                    None => return h.close().await,
                }
            }
        })
    })
}

/// Producer stage emitting structured messages from a [`MessageSource`]
/// until EOF.
pub fn message_source<I: 'static, H: MessageSource + 'static>(
    handle: H,
) -> Stage<I, serde_json::Value> {
    let slot = Rc::new(RefCell::new(Some(handle)));
    Stage::flow("message_source", move || {
        let slot = Rc::clone(&slot);
        Flow::new(
            "message_source",
            move |h: FlowHandle<I, serde_json::Value>| async move {
                let taken = slot.borrow_mut().take();
                let Some(handle) = taken else {
                    return Err(StreamError::processing(
                        "message source handle already consumed by an earlier run",
                    ));
                };
                let mut guard = MessageGuard::new(handle);
                loop {
                    match guard.recv()? {
                        Some(message) => h.send(message).await?,
                        None => return h.close().await,
                    }
                }
            },
        )
    })
}

/// Producer stage decoding each message into `T`.
///
/// A message that does not decode faults the run with `CannotCoerce`; the
/// handle is still closed on the way out.
pub fn records<I: 'static, T, H>(handle: H) -> Stage<I, T>
where
    T: DeserializeOwned + 'static,
    H: MessageSource + 'static,
{
    let slot = Rc::new(RefCell::new(Some(handle)));
    Stage::flow("records", move || {
        let slot = Rc::clone(&slot);
        Flow::new("records", move |h: FlowHandle<I, T>| async move {
            let taken = slot.borrow_mut().take();
            let Some(handle) = taken else {
                return Err(StreamError::processing(
                    "message source handle already consumed by an earlier run",
                ));
            };
            let mut guard = MessageGuard::new(handle);
            loop {
                match guard.recv()? {
                    Some(message) => {
                        let record: T = serde_json::from_value(message).map_err(|err| {
                            StreamError::cannot_coerce(format!(
                                "message does not decode into the expected record type: {}",
                                err
                            ))
                        })?;
                        h.send(record).await?;
                    }
                    None => return h.close().await,
                }
            }
        })
    })
}
