// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Queue Endpoint Stages
//!
//! Channel endpoints for driving a pipeline from an external queue. A
//! worker layer composes `queue_pull(input) >> line >> queue_push(output)`
//! and runs it in its own thread; the run terminates when the input
//! channel disconnects, which is the queue's EOF signal.

use crossbeam::channel::{Receiver, Sender};
use serde_json::json;
use tracing::debug;

use flowline_domain::error::StreamError;
use flowline_domain::flow::{Flow, FlowHandle};
use flowline_domain::Stage;

/// Producer stage pulling items from a channel until it disconnects.
pub fn queue_pull<I: 'static, T: 'static>(receiver: Receiver<T>) -> Stage<I, T> {
    Stage::flow_with_params("queue_pull", json!({ "endpoint": "input" }), move || {
        let receiver = receiver.clone();
        Flow::new("queue_pull", move |h: FlowHandle<I, T>| async move {
            loop {
                match receiver.recv() {
                    Ok(item) => h.send(item).await?,
                    Err(_) => {
                        debug!("input queue disconnected; closing");
                        return h.close().await;
                    }
                }
            }
        })
    })
}

/// Sink stage pushing every input into a channel; emits nothing.
pub fn queue_push<T: 'static>(sender: Sender<T>) -> Stage<T, T> {
    Stage::flow_with_params("queue_push", json!({ "endpoint": "output" }), move || {
        let sender = sender.clone();
        Flow::new("queue_push", move |h: FlowHandle<T, T>| async move {
            loop {
                let item = h.recv().await?;
                sender
                    .send(item)
                    .map_err(|_| StreamError::channel("output queue disconnected"))?;
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::runner::run;
    use crate::stages::pipe;
    use crossbeam::channel;

    #[test]
    fn test_queue_roundtrip_terminates_on_disconnect() {
        let (in_tx, in_rx) = channel::unbounded();
        let (out_tx, out_rx) = channel::unbounded();
        for i in 0..4 {
            in_tx.send(i).unwrap();
        }
        drop(in_tx);

        let line = queue_pull(in_rx) >> pipe(|x: i32| x * x) >> queue_push(out_tx);
        assert_eq!(run(&line).unwrap(), Vec::<i32>::new());
        assert_eq!(out_rx.try_iter().collect::<Vec<_>>(), vec![0, 1, 4, 9]);
    }

    #[test]
    fn test_queue_push_faults_when_output_gone() {
        let (out_tx, out_rx) = channel::bounded(1);
        drop(out_rx);
        let line = flowline_domain::coerce::lift(vec![1]) >> queue_push(out_tx);
        assert_eq!(run(&line).unwrap_err().category(), "channel");
    }
}
