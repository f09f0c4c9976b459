// /////////////////////////////////////////////////////////////////////////////
// Flowline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Stage Entity
//!
//! A `Stage` is one step in a pipeline: a named, immutable description of
//! an input-output transformation together with an evaluation strategy.
//! Stages are value objects in the strict sense: once constructed nothing
//! about them ever changes, and running a pipeline any number of times must
//! not be observable through the stage itself.
//!
//! ## Evaluation strategies
//!
//! - **Lazy** stages map their feed to a pulled stream; output exists only
//!   as far as the downstream demands it, so an infinite source behind a
//!   lazy stage is valid.
//! - **Strict** stages materialize their whole output when applied, before
//!   the first element is yielded. A failing strict stage therefore faults
//!   at run entry, and a bounded strict stage retains only the most recent
//!   [`WindowSize`] elements in insertion order.
//! - **Flow** stages hold a coroutine factory; applying one spawns a fresh
//!   [`Flow`], binds the upstream (wrapping non-flow feeds in a synthetic
//!   emitter), and hands the flow downstream for direct binding.
//!
//! ## Source stages
//!
//! Lifted containers and iterators become *source* stages. A source
//! ignores the `Nothing` sentinel (sources are how pipelines start) but
//! drains a live upstream before producing its own elements, propagating
//! any fault the drain surfaces. That drain is what makes a consumer with
//! no live producer fail with `BlockedUpstream` instead of silently
//! producing.
//!
//! ## Serialization
//!
//! Stages are deliberately not serializable; [`Stage::descriptor`] returns
//! the serializable diagnostic view.

use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use serde_json::Value;

use crate::coerce::SourceKind;
use crate::error::StreamError;
use crate::feed::{fault_stream, Feed, ItemStream};
use crate::flow::Flow;
use crate::value_objects::{StageDescriptor, StageId, Strategy, WindowSize};

/// Applies a stage's logic to an upstream feed.
///
/// Crate-internal seam between primitive logic forms and composite fusion.
pub(crate) trait StageLogic<I: 'static, O: 'static> {
    fn open(&self, feed: Feed<I>) -> Feed<O>;
}

/// One step in a pipeline: immutable logic plus composition metadata.
///
/// ```
/// use flowline_domain::entities::Stage;
/// use flowline_domain::feed::Feed;
///
/// let doubler: Stage<i32, i32> = Stage::lazy("doubler", |feed: Feed<i32>| {
///     Box::new(feed.into_stream().map(|item| item.map(|x| x * 2)))
/// });
/// let out: Result<Vec<_>, _> = doubler.stream(Feed::from_values(vec![1, 2])).collect();
/// assert_eq!(out.unwrap(), vec![2, 4]);
/// ```
pub struct Stage<I: 'static, O: 'static> {
    id: StageId,
    name: String,
    strategy: Strategy,
    composite: bool,
    arity: usize,
    params: Value,
    logic: Rc<dyn StageLogic<I, O>>,
}

impl<I: 'static, O: 'static> Clone for Stage<I, O> {
    fn clone(&self) -> Self {
        Stage {
            id: self.id,
            name: self.name.clone(),
            strategy: self.strategy,
            composite: self.composite,
            arity: self.arity,
            params: self.params.clone(),
            logic: self.logic.clone(),
        }
    }
}

impl<I: 'static, O: 'static> fmt::Debug for Stage<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("composite", &self.composite)
            .field("arity", &self.arity)
            .finish()
    }
}

impl<I: 'static, O: 'static> Stage<I, O> {
    fn primitive(
        name: impl Into<String>,
        strategy: Strategy,
        params: Value,
        logic: Rc<dyn StageLogic<I, O>>,
    ) -> Self {
        Stage {
            id: StageId::new(),
            name: name.into(),
            strategy,
            composite: false,
            arity: 1,
            params,
            logic,
        }
    }

    pub(crate) fn fused(name: String, arity: usize, logic: Rc<dyn StageLogic<I, O>>) -> Self {
        Stage {
            id: StageId::new(),
            name,
            strategy: Strategy::Lazy,
            composite: true,
            arity,
            params: Value::Null,
            logic,
        }
    }

    /// Creates a lazy stage from a feed-to-stream mapping
    pub fn lazy<F>(name: impl Into<String>, logic: F) -> Self
    where
        F: Fn(Feed<I>) -> ItemStream<O> + 'static,
    {
        Self::lazy_with_params(name, Value::Null, logic)
    }

    /// Creates a lazy stage carrying a diagnostic parameter map
    pub fn lazy_with_params<F>(name: impl Into<String>, params: Value, logic: F) -> Self
    where
        F: Fn(Feed<I>) -> ItemStream<O> + 'static,
    {
        Self::primitive(
            name,
            Strategy::Lazy,
            params,
            Rc::new(LazyLogic {
                logic: Box::new(logic),
            }),
        )
    }

    /// Creates a strict stage: output fully materialized on apply
    pub fn strict<F>(name: impl Into<String>, logic: F) -> Self
    where
        F: Fn(Feed<I>) -> ItemStream<O> + 'static,
    {
        Self::primitive(
            name,
            Strategy::Strict,
            Value::Null,
            Rc::new(StrictLogic {
                logic: Box::new(logic),
                window: None,
            }),
        )
    }

    /// Creates a bounded strict stage retaining the most recent `window`
    /// elements of its materialized output
    pub fn strict_bounded<F>(name: impl Into<String>, window: WindowSize, logic: F) -> Self
    where
        F: Fn(Feed<I>) -> ItemStream<O> + 'static,
    {
        Self::primitive(
            name,
            Strategy::Strict,
            serde_json::json!({ "window": window.get() }),
            Rc::new(StrictLogic {
                logic: Box::new(logic),
                window: Some(window),
            }),
        )
    }

    /// Creates a flow stage from a coroutine factory
    pub fn flow<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Flow<I, O> + 'static,
    {
        Self::flow_with_params(name, Value::Null, factory)
    }

    /// Creates a flow stage carrying a diagnostic parameter map
    pub fn flow_with_params<F>(name: impl Into<String>, params: Value, factory: F) -> Self
    where
        F: Fn() -> Flow<I, O> + 'static,
    {
        Self::primitive(
            name,
            Strategy::Flow,
            params,
            Rc::new(FlowLogic {
                factory: Box::new(factory),
            }),
        )
    }

    /// Creates an anonymous source stage from a stream maker.
    ///
    /// The stage is named after its strategy; the source kind is recorded
    /// in the parameter map.
    pub fn source<F>(kind: SourceKind, make: F) -> Self
    where
        F: Fn() -> ItemStream<O> + 'static,
    {
        let strategy = kind.strategy();
        Self::primitive(
            strategy.as_str(),
            strategy,
            serde_json::json!({ "kind": kind.as_str() }),
            Rc::new(SourceLogic {
                make: Rc::new(make),
                strict: matches!(strategy, Strategy::Strict),
                window: None,
                _input: PhantomData,
            }),
        )
    }

    /// Gets the stage identifier
    pub fn id(&self) -> StageId {
        self.id
    }

    /// Gets the stage name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the evaluation strategy
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Checks whether this stage is the fusion of other stages
    pub fn is_composite(&self) -> bool {
        self.composite
    }

    /// Gets the count of primitive stages fused into this one
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Gets the construction-time parameter map
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Builds the serializable diagnostic view
    pub fn descriptor(&self) -> StageDescriptor {
        StageDescriptor::new(
            self.id,
            self.name.clone(),
            self.strategy,
            self.composite,
            self.arity,
            self.params.clone(),
        )
    }

    /// Applies the stage's logic to an upstream feed
    pub fn apply(&self, feed: Feed<I>) -> Feed<O> {
        self.logic.open(feed)
    }

    /// Applies the stage and pulls the result as a stream
    pub fn stream(&self, feed: Feed<I>) -> ItemStream<O> {
        self.apply(feed).into_stream()
    }
}

struct LazyLogic<I: 'static, O: 'static> {
    logic: Box<dyn Fn(Feed<I>) -> ItemStream<O>>,
}

impl<I: 'static, O: 'static> StageLogic<I, O> for LazyLogic<I, O> {
    fn open(&self, feed: Feed<I>) -> Feed<O> {
        Feed::from_stream((self.logic)(feed))
    }
}

struct StrictLogic<I: 'static, O: 'static> {
    logic: Box<dyn Fn(Feed<I>) -> ItemStream<O>>,
    window: Option<WindowSize>,
}

impl<I: 'static, O: 'static> StageLogic<I, O> for StrictLogic<I, O> {
    fn open(&self, feed: Feed<I>) -> Feed<O> {
        Feed::from_stream(materialize((self.logic)(feed), self.window))
    }
}

/// Pulls a stream to completion immediately.
///
/// A fault discards the materialized prefix: a failing strict stage yields
/// its fault before any downstream value is produced.
fn materialize<O: 'static>(stream: ItemStream<O>, window: Option<WindowSize>) -> ItemStream<O> {
    let mut buffer: VecDeque<O> = VecDeque::new();
    for item in stream {
        match item {
            Ok(value) => {
                buffer.push_back(value);
                if let Some(window) = window {
                    while buffer.len() > window.get() {
                        buffer.pop_front();
                    }
                }
            }
            Err(err) => return fault_stream(err),
        }
    }
    Box::new(buffer.into_iter().map(Ok))
}

struct FlowLogic<I: 'static, O: 'static> {
    factory: Box<dyn Fn() -> Flow<I, O>>,
}

impl<I: 'static, O: 'static> StageLogic<I, O> for FlowLogic<I, O> {
    fn open(&self, feed: Feed<I>) -> Feed<O> {
        let mut flow = (self.factory)();
        match flow.bind_feed(feed) {
            Ok(()) => Feed::Flow(Box::new(flow)),
            Err(err) => Feed::from_stream(fault_stream(err)),
        }
    }
}

struct SourceLogic<I: 'static, O: 'static> {
    make: Rc<dyn Fn() -> ItemStream<O>>,
    strict: bool,
    window: Option<WindowSize>,
    _input: PhantomData<fn(I)>,
}

impl<I: 'static, O: 'static> StageLogic<I, O> for SourceLogic<I, O> {
    fn open(&self, feed: Feed<I>) -> Feed<O> {
        let stream: ItemStream<O> = match feed {
            Feed::Nothing => (self.make)(),
            live => Box::new(DrainThen {
                upstream: Some(live.into_stream()),
                make: Some(self.make.clone()),
                inner: None,
            }),
        };
        if self.strict {
            Feed::from_stream(materialize(stream, self.window))
        } else {
            Feed::from_stream(stream)
        }
    }
}

/// Drains a live upstream (discarding its values, surfacing its faults),
/// then produces the source's own elements.
struct DrainThen<I: 'static, O: 'static> {
    upstream: Option<ItemStream<I>>,
    make: Option<Rc<dyn Fn() -> ItemStream<O>>>,
    inner: Option<ItemStream<O>>,
}

impl<I: 'static, O: 'static> Iterator for DrainThen<I, O> {
    type Item = Result<O, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.upstream.is_some() {
            let item = self.upstream.as_mut().and_then(|up| up.next());
            match item {
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    self.upstream = None;
                    self.make = None;
                    return Some(Err(err));
                }
                None => self.upstream = None,
            }
        }
        if self.inner.is_none() {
            let make = self.make.take()?;
            self.inner = Some(make());
        }
        self.inner.as_mut()?.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough<T: 'static>() -> Stage<T, T> {
        Stage::lazy("passthrough", |feed: Feed<T>| feed.into_stream())
    }

    #[test]
    fn test_lazy_pulls_on_demand() {
        let stage = passthrough::<i32>();
        let mut stream = stage.stream(Feed::from_values(vec![1, 2, 3]));
        assert_eq!(stream.next(), Some(Ok(1)));
        assert_eq!(stream.next(), Some(Ok(2)));
    }

    #[test]
    fn test_strict_window_keeps_most_recent() {
        let window = WindowSize::new(2).unwrap();
        let stage: Stage<i32, i32> =
            Stage::strict_bounded("tail", window, |feed: Feed<i32>| feed.into_stream());
        let out: Result<Vec<_>, _> = stage
            .stream(Feed::from_values(vec![1, 2, 3, 4, 5]))
            .collect();
        assert_eq!(out.unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_strict_fault_discards_prefix() {
        let stage: Stage<i32, i32> = Stage::strict("boom", |_feed: Feed<i32>| {
            Box::new(
                vec![Ok(1), Ok(2), Err(StreamError::processing("bad element"))].into_iter(),
            )
        });
        let mut stream = stage.stream(Feed::nothing());
        assert_eq!(
            stream.next(),
            Some(Err(StreamError::processing("bad element")))
        );
        assert_eq!(stream.next(), None);
    }

    #[test]
    fn test_source_ignores_nothing_feed() {
        let stage: Stage<(), i32> =
            Stage::source(SourceKind::Sequence, || Box::new(vec![7, 8].into_iter().map(Ok)));
        let out: Result<Vec<_>, _> = stage.stream(Feed::nothing()).collect();
        assert_eq!(out.unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_source_drains_live_upstream() {
        let drained = std::rc::Rc::new(std::cell::Cell::new(0));
        let stage: Stage<i32, i32> =
            Stage::source(SourceKind::Sequence, || Box::new(vec![9].into_iter().map(Ok)));
        let counter = drained.clone();
        let upstream: ItemStream<i32> = Box::new((0..3).map(move |i| {
            counter.set(counter.get() + 1);
            Ok(i)
        }));
        let out: Result<Vec<_>, _> = stage.stream(Feed::from_stream(upstream)).collect();
        assert_eq!(out.unwrap(), vec![9]);
        assert_eq!(drained.get(), 3);
    }

    #[test]
    fn test_descriptor_is_stable_across_runs() {
        let stage = passthrough::<i32>();
        let before = stage.descriptor();
        let _ = stage.stream(Feed::from_values(vec![1])).count();
        assert_eq!(stage.descriptor(), before);
    }
}
