// /////////////////////////////////////////////////////////////////////////////
// Flowline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Tuple Calculus Stages
//!
//! Pair-shaped plumbing: duplicating, merging, and mapping over tuple
//! streams, plus zipping a secondary line's output into either tuple slot.

use std::rc::Rc;

use flowline_domain::feed::Feed;
use flowline_domain::flow::{Flow, FlowHandle};
use flowline_domain::Stage;

/// Duplicates every element into a pair: `x -> (x, x)`.
pub fn split<T: Clone + 'static>() -> Stage<T, (T, T)> {
    Stage::flow("split", || {
        Flow::new("split", |h: FlowHandle<T, (T, T)>| async move {
            loop {
                let x = h.recv().await?;
                h.send((x.clone(), x)).await?;
            }
        })
    })
}

/// Merges pairs with a binary function: `(a, b) -> f(a, b)`.
pub fn unsplit<A: 'static, B: 'static, O: 'static>(
    f: impl Fn(A, B) -> O + 'static,
) -> Stage<(A, B), O> {
    let f = Rc::new(f);
    Stage::flow("unsplit", move || {
        let f = Rc::clone(&f);
        Flow::new("unsplit", move |h: FlowHandle<(A, B), O>| async move {
            loop {
                let (a, b) = h.recv().await?;
                h.send(f(a, b)).await?;
            }
        })
    })
}

/// Fans one element into two views: `x -> (f(x), g(x))`.
pub fn dimap<T, A, B>(
    f: impl Fn(&T) -> A + 'static,
    g: impl Fn(&T) -> B + 'static,
) -> Stage<T, (A, B)>
where
    T: 'static,
    A: 'static,
    B: 'static,
{
    let f = Rc::new(f);
    let g = Rc::new(g);
    Stage::flow("dimap", move || {
        let f = Rc::clone(&f);
        let g = Rc::clone(&g);
        Flow::new("dimap", move |h: FlowHandle<T, (A, B)>| async move {
            loop {
                let x = h.recv().await?;
                h.send((f(&x), g(&x))).await?;
            }
        })
    })
}

/// Maps each pair slot independently: `(x, y) -> (f(x), g(y))`.
pub fn parmap<X, Y, A, B>(
    f: impl Fn(X) -> A + 'static,
    g: impl Fn(Y) -> B + 'static,
) -> Stage<(X, Y), (A, B)>
where
    X: 'static,
    Y: 'static,
    A: 'static,
    B: 'static,
{
    let f = Rc::new(f);
    let g = Rc::new(g);
    Stage::flow("parmap", move || {
        let f = Rc::clone(&f);
        let g = Rc::clone(&g);
        Flow::new("parmap", move |h: FlowHandle<(X, Y), (A, B)>| async move {
            loop {
                let (x, y) = h.recv().await?;
                h.send((f(x), g(y))).await?;
            }
        })
    })
}

/// Zips a secondary line's output in as the first tuple element:
/// `x -> (a, x)` where `a` is pulled from `secondary`.
///
/// The stage closes when the secondary line ends.
pub fn first<X: 'static, A: 'static>(secondary: Stage<(), A>) -> Stage<X, (A, X)> {
    Stage::flow("first", move || {
        let side = secondary.clone();
        Flow::new("first", move |h: FlowHandle<X, (A, X)>| async move {
            let mut side_stream = side.stream(Feed::nothing());
            loop {
                let a = match side_stream.next() {
                    Some(Ok(a)) => a,
                    Some(Err(err)) => return Err(err),
                    None => return h.close().await,
                };
                let x = h.recv().await?;
                h.send((a, x)).await?;
            }
        })
    })
}

/// Zips a secondary line's output in as the second tuple element:
/// `x -> (x, a)` where `a` is pulled from `secondary`.
pub fn second<X: 'static, A: 'static>(secondary: Stage<(), A>) -> Stage<X, (X, A)> {
    Stage::flow("second", move || {
        let side = secondary.clone();
        Flow::new("second", move |h: FlowHandle<X, (X, A)>| async move {
            let mut side_stream = side.stream(Feed::nothing());
            loop {
                let a = match side_stream.next() {
                    Some(Ok(a)) => a,
                    Some(Err(err)) => return Err(err),
                    None => return h.close().await,
                };
                let x = h.recv().await?;
                h.send((x, a)).await?;
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::runner::run;
    use crate::stages::take;
    use flowline_domain::coerce::lift;

    #[test]
    fn test_split_then_unsplit() {
        let line = lift(vec![1, 2, 3]) >> split() >> unsplit(|a: i32, b: i32| a + b);
        assert_eq!(run(&line).unwrap(), vec![2, 4, 6]);
    }

    #[test]
    fn test_dimap_builds_views() {
        let line = lift(vec![2, 3]) >> dimap(|x: &i32| x + 1, |x: &i32| x * x);
        assert_eq!(run(&line).unwrap(), vec![(3, 4), (4, 9)]);
    }

    #[test]
    fn test_parmap_maps_slots() {
        let line =
            lift(vec![(1, 10), (2, 20)]) >> parmap(|x: i32| x * 2, |y: i32| y + 1);
        assert_eq!(run(&line).unwrap(), vec![(2, 11), (4, 21)]);
    }

    #[test]
    fn test_first_zips_secondary() {
        let line = lift(vec!["a", "b"]) >> first(lift(vec![1, 2, 3]));
        assert_eq!(run(&line).unwrap(), vec![(1, "a"), (2, "b")]);
    }

    #[test]
    fn test_second_closes_with_secondary() {
        let line = lift(vec!["a", "b", "c"]) >> second(lift(vec![1]) >> take(1));
        assert_eq!(run(&line).unwrap(), vec![("a", 1)]);
    }
}
