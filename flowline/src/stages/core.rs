// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Core Stage Library
//!
//! The everyday vocabulary of pipeline construction: maps, sinks,
//! producers, prefix windows, accumulators, gates, and filters. Every
//! factory returns an immutable [`Stage`]; flow-strategy stages build a
//! fresh coroutine per run from the captured logic.

use std::fmt::Display;
use std::iter;
use std::rc::Rc;

use serde_json::json;
use tracing::info;

use flowline_domain::feed::{fault_stream, Feed, ItemStream};
use flowline_domain::flow::{Flow, FlowHandle};
use flowline_domain::Stage;

/// One-in/one-out map: applies `f` to every element.
pub fn pipe<I: 'static, O: 'static>(f: impl Fn(I) -> O + 'static) -> Stage<I, O> {
    let f = Rc::new(f);
    Stage::flow("pipe", move || {
        let f = Rc::clone(&f);
        Flow::new("pipe", move |h: FlowHandle<I, O>| async move {
            loop {
                let x = h.recv().await?;
                h.send(f(x)).await?;
            }
        })
    })
}

/// One-in/zero-out sink: applies `f` for its side effect and emits nothing.
pub fn pipe_<I: 'static>(f: impl Fn(I) + 'static) -> Stage<I, ()> {
    let f = Rc::new(f);
    Stage::flow("pipe_", move || {
        let f = Rc::clone(&f);
        Flow::new("pipe_", move |h: FlowHandle<I, ()>| async move {
            loop {
                let x = h.recv().await?;
                f(x);
            }
        })
    })
}

/// Passthrough map that logs every element through the subscriber.
pub fn printer<T: Display + 'static>() -> Stage<T, T> {
    Stage::flow("printer", || {
        Flow::new("printer", |h: FlowHandle<T, T>| async move {
            loop {
                let x = h.recv().await?;
                info!("{}", x);
                h.send(x).await?;
            }
        })
    })
}

/// Sink that logs every element through the subscriber.
pub fn printer_<T: Display + 'static>() -> Stage<T, ()> {
    Stage::flow("printer_", || {
        Flow::new("printer_", |h: FlowHandle<T, ()>| async move {
            loop {
                let x = h.recv().await?;
                info!("{}", x);
            }
        })
    })
}

/// Zero-in/one-out infinite producer of `f()`.
pub fn forever<I: 'static, O: 'static>(f: impl Fn() -> O + 'static) -> Stage<I, O> {
    let f = Rc::new(f);
    Stage::flow("forever", move || {
        let f = Rc::clone(&f);
        Flow::new("forever", move |h: FlowHandle<I, O>| async move {
            loop {
                h.send(f()).await?;
            }
        })
    })
}

/// Lazy-sequence flavor of [`forever`]: an endless pulled stream of `f()`.
pub fn repeat<I: 'static, O: 'static>(f: impl Fn() -> O + 'static) -> Stage<I, O> {
    let f = Rc::new(f);
    Stage::lazy("repeat", move |_feed: Feed<I>| {
        let f = Rc::clone(&f);
        Box::new(iter::repeat_with(move || Ok(f())))
    })
}

/// Emits `f(i)` for `i = start, start + 1, ...` forever.
pub fn for_m<I: 'static, O: 'static>(f: impl Fn(u64) -> O + 'static, start: u64) -> Stage<I, O> {
    let f = Rc::new(f);
    Stage::flow_with_params("for_m", json!({ "start": start }), move || {
        let f = Rc::clone(&f);
        Flow::new("for_m", move |h: FlowHandle<I, O>| async move {
            let mut i = start;
            loop {
                h.send(f(i)).await?;
                i += 1;
            }
        })
    })
}

/// First-`n` passthrough: closes on the `(n + 1)`-th demand.
pub fn take<T: 'static>(n: usize) -> Stage<T, T> {
    Stage::lazy_with_params("take", json!({ "n": n }), move |feed: Feed<T>| {
        Box::new(feed.into_stream().take(n))
    })
}

/// Accumulates exactly `n` inputs, emits them once as an ordered list, and
/// closes.
pub fn collect<T: 'static>(n: usize) -> Stage<T, Vec<T>> {
    Stage::flow_with_params("collect", json!({ "n": n }), move || {
        Flow::new("collect", move |h: FlowHandle<T, Vec<T>>| async move {
            let mut accum = Vec::with_capacity(n);
            while accum.len() < n {
                accum.push(h.recv().await?);
            }
            h.send(accum).await?;
            h.close().await
        })
    })
}

/// Drains its input silently; output is empty.
pub fn consume<T: 'static>() -> Stage<T, T> {
    Stage::strict("consume", |feed: Feed<T>| {
        Box::new(feed.into_stream().filter_map(|item| match item {
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        }))
    })
}

/// Flattens element iterables into a single stream.
pub fn flatten<C, T>() -> Stage<C, T>
where
    C: IntoIterator<Item = T> + 'static,
    <C as IntoIterator>::IntoIter: 'static,
    T: 'static,
{
    Stage::lazy("flatten", |feed: Feed<C>| {
        Box::new(feed.into_stream().flat_map(|item| {
            let inner: ItemStream<T> = match item {
                Ok(container) => Box::new(container.into_iter().map(Ok)),
                Err(err) => fault_stream(err),
            };
            inner
        }))
    })
}

/// Drops inputs until the first one satisfying `p`, then passes everything
/// through. The triggering element itself is retransmitted.
pub fn barrier<T: 'static>(p: impl Fn(&T) -> bool + 'static) -> Stage<T, T> {
    let p = Rc::new(p);
    Stage::flow("barrier", move || {
        let p = Rc::clone(&p);
        Flow::new("barrier", move |h: FlowHandle<T, T>| async move {
            let mut open = false;
            loop {
                let x = h.recv().await?;
                if !open && p(&x) {
                    open = true;
                }
                if open {
                    h.send(x).await?;
                }
            }
        })
    })
}

/// Keeps inputs satisfying `p`.
pub fn filter<T: 'static>(p: impl Fn(&T) -> bool + 'static) -> Stage<T, T> {
    let p = Rc::new(p);
    Stage::flow("filter", move || {
        let p = Rc::clone(&p);
        Flow::new("filter", move |h: FlowHandle<T, T>| async move {
            loop {
                let x = h.recv().await?;
                if p(&x) {
                    h.send(x).await?;
                }
            }
        })
    })
}

/// Lazy identity stage.
pub fn identity_lazy<T: 'static>() -> Stage<T, T> {
    Stage::lazy("identity", |feed: Feed<T>| feed.into_stream())
}

/// Strict identity stage: materializes its input before yielding.
pub fn identity_strict<T: 'static>() -> Stage<T, T> {
    Stage::strict("identity", |feed: Feed<T>| feed.into_stream())
}
