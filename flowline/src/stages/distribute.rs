// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Distribution Stages
//!
//! Tagging and chunking for worker fan-out. `roundrobin` distributes
//! elements across `n` workers over time; `scatter` forces the stream into
//! memory and distributes fixed-size chunks. Both tag with the worker index
//! (`ordinal % n`); the plain positional tagging is exposed separately as
//! [`enumerate`].

use serde_json::json;

use flowline_domain::error::StreamError;
use flowline_domain::feed::{fault_stream, Feed, ItemStream};
use flowline_domain::Stage;

/// Tags every element with its position: `e -> (index, e)`.
pub fn enumerate<T: 'static>() -> Stage<T, (usize, T)> {
    Stage::lazy("enumerate", |feed: Feed<T>| {
        Box::new(
            feed.into_stream()
                .enumerate()
                .map(|(i, item)| item.map(|value| (i, value))),
        )
    })
}

/// Tags every element with a worker index over time:
/// `e -> (index % n, e)`. Does not force the stream.
pub fn roundrobin<T: 'static>(n: usize) -> Stage<T, (usize, T)> {
    Stage::lazy_with_params("roundrobin", json!({ "n": n }), move |feed: Feed<T>| {
        if n == 0 {
            return fault_stream(StreamError::invalid_composition(
                "roundrobin requires at least one worker",
            ));
        }
        Box::new(
            feed.into_stream()
                .enumerate()
                .map(move |(i, item)| item.map(|value| (i % n, value))),
        )
    })
}

/// Splits the stream into size-`n` chunks and tags each with a worker
/// index: `chunk -> (chunk_ordinal % n, chunk)`. Forces the entire stream
/// into memory at the call site.
pub fn scatter<T: 'static>(n: usize) -> Stage<T, (usize, Vec<T>)> {
    Stage::strict("scatter", move |feed: Feed<T>| {
        if n == 0 {
            return fault_stream(StreamError::invalid_composition(
                "scatter requires at least one worker",
            ));
        }
        Box::new(Chunks {
            inner: feed.into_stream(),
            size: n,
            ordinal: 0,
        })
    })
}

struct Chunks<T: 'static> {
    inner: ItemStream<T>,
    size: usize,
    ordinal: usize,
}

impl<T: 'static> Iterator for Chunks<T> {
    type Item = Result<(usize, Vec<T>), StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = Vec::with_capacity(self.size);
        while chunk.len() < self.size {
            match self.inner.next() {
                Some(Ok(value)) => chunk.push(value),
                Some(Err(err)) => return Some(Err(err)),
                None => break,
            }
        }
        if chunk.is_empty() {
            return None;
        }
        let index = self.ordinal % self.size;
        self.ordinal += 1;
        Some(Ok((index, chunk)))
    }
}
