// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Upstream Feeds and the Nothing Sentinel
//!
//! A `Feed` is the upstream handed to a stage's logic. It is either the
//! `Nothing` sentinel that primes the head of every run, a live pulled
//! stream, or a live flow that a downstream flow stage can bind directly.
//!
//! Every element travelling through a pipeline is a `Result`: an `Err` item
//! is a fault that surfaces from the runner after teardown, and
//! end-of-stream is plain iterator exhaustion. The `Nothing` sentinel is
//! the exception that defines the boundary: it is falsy, it equals no user
//! value, and every pull from it yields `BlockedUpstream`. A head stage
//! must therefore either ignore its feed (producers) or demand from it and
//! fault (a consumer with no live producer).

use std::fmt;
use std::iter;
use std::marker::PhantomData;

use crate::error::StreamError;
use crate::flow::{FlowSource, FlowStream};

/// A pulled stream of pipeline items.
pub type ItemStream<T> = Box<dyn Iterator<Item = Result<T, StreamError>>>;

/// Builds a stream that yields a single fault and then ends.
pub fn fault_stream<T: 'static>(err: StreamError) -> ItemStream<T> {
    Box::new(iter::once(Err(err)))
}

/// The upstream of a stage invocation.
pub enum Feed<T: 'static> {
    /// The priming sentinel: no producer exists. Falsy, never equal to a
    /// user value, and every pull yields `BlockedUpstream`.
    Nothing,
    /// A live pulled stream.
    Stream(ItemStream<T>),
    /// A live flow, available for direct binding by a downstream flow stage.
    Flow(Box<dyn FlowSource<T>>),
}

impl<T: 'static> Feed<T> {
    /// The sentinel feed that primes the head of a pipeline run
    pub fn nothing() -> Self {
        Feed::Nothing
    }

    /// Wraps an already-pulled stream
    pub fn from_stream(stream: ItemStream<T>) -> Self {
        Feed::Stream(stream)
    }

    /// Lifts plain values into a live feed
    pub fn from_values<It>(values: It) -> Self
    where
        It: IntoIterator<Item = T>,
        It::IntoIter: 'static,
    {
        Feed::Stream(Box::new(values.into_iter().map(Ok)))
    }

    /// Checks whether this feed is the sentinel (the sentinel is falsy)
    pub fn is_nothing(&self) -> bool {
        matches!(self, Feed::Nothing)
    }

    /// Converts the feed into a pulled stream.
    ///
    /// The sentinel becomes a stream whose every pull is a
    /// `BlockedUpstream` fault; a flow becomes its pull-driven stream view.
    pub fn into_stream(self) -> ItemStream<T> {
        match self {
            Feed::Nothing => Box::new(NothingPulls(PhantomData)),
            Feed::Stream(stream) => stream,
            Feed::Flow(source) => Box::new(FlowStream::new(source)),
        }
    }
}

impl<T: 'static> fmt::Debug for Feed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feed::Nothing => f.write_str("Feed::Nothing"),
            Feed::Stream(_) => f.write_str("Feed::Stream(..)"),
            Feed::Flow(_) => f.write_str("Feed::Flow(..)"),
        }
    }
}

/// Stream view of the sentinel: demanding from it is always a fault.
struct NothingPulls<T>(PhantomData<T>);

impl<T> Iterator for NothingPulls<T> {
    type Item = Result<T, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(Err(StreamError::BlockedUpstream))
    }
}
