//! # Pipeline Property Tests
//!
//! Universal properties of the composition algebra and the runner:
//! associativity, reverse equivalence, purity, coercion closure,
//! finalization totality, take refinement, lazy prefix demand, strict
//! eagerness, and the blocked-upstream failure mode.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test pipeline_properties
//! ```

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use proptest::prelude::*;

use flowline::stages::{collect, pipe, take};
use flowline::{gen, lift, run, Feed, Flow, FlowHandle, Stage, StreamError};

fn square() -> Stage<i64, i64> {
    pipe(|x: i64| x * x)
}

fn add_one() -> Stage<i64, i64> {
    pipe(|x: i64| x + 1)
}

#[test]
fn test_associativity_concrete() {
    let a = || lift::<(), _>(vec![1i64, 2, 3, 4]);
    let left = (a() >> square()) >> add_one();
    let right = a() >> (square() >> add_one());
    assert_eq!(run(&left).unwrap(), run(&right).unwrap());
    assert_eq!(left.arity(), right.arity());
}

#[test]
fn test_reverse_equivalence() {
    let forward = lift::<(), _>(vec![1i64, 2, 3]) >> square() >> add_one();
    let backward: Stage<(), i64> = add_one() << (square() << vec![1i64, 2, 3]);
    assert_eq!(run(&forward).unwrap(), run(&backward).unwrap());
}

#[test]
fn test_purity_stages_unchanged_by_runs() {
    let source = lift::<(), _>(vec![1i64, 2, 3]);
    let mapper = square();
    let source_before = source.descriptor();
    let mapper_before = mapper.descriptor();

    let line = source.clone() >> mapper.clone();
    let first = run(&line).unwrap();
    let second = run(&line).unwrap();

    assert_eq!(first, second);
    assert_eq!(source.descriptor(), source_before);
    assert_eq!(mapper.descriptor(), mapper_before);
}

#[test]
fn test_coercion_closure_vec() {
    let by_operator = square() >> vec![9i64];
    let by_lift = square() >> lift::<i64, _>(vec![9i64]);
    let direct: Stage<(), i64> = lift(vec![2i64, 3]) >> by_operator;
    let lifted: Stage<(), i64> = lift(vec![2i64, 3]) >> by_lift;
    assert_eq!(run(&direct).unwrap(), run(&lifted).unwrap());
}

#[test]
fn test_coercion_mapping_and_set() {
    let mut map = HashMap::new();
    map.insert("a".to_string(), 2i64);
    let line = lift::<(), _>(map) >> take(2);
    assert_eq!(run(&line).unwrap(), vec![("a".to_string(), 2)]);

    let mut ordered = BTreeMap::new();
    ordered.insert(1i64, "one");
    ordered.insert(2i64, "two");
    let line = lift::<(), _>(ordered) >> take(10);
    assert_eq!(run(&line).unwrap(), vec![(1, "one"), (2, "two")]);

    let set: HashSet<i64> = [3, 1, 2].into_iter().collect();
    let line = lift::<(), _>(set) >> take(10);
    let mut out = run(&line).unwrap();
    out.sort();
    assert_eq!(out, vec![1, 2, 3]);
}

#[test]
fn test_finalization_totality_success_and_short_circuit() {
    let releases = Rc::new(Cell::new(0usize));
    let guarded = |releases: &Rc<Cell<usize>>| {
        let releases = Rc::clone(releases);
        Stage::flow("guarded", move || {
            let releases = Rc::clone(&releases);
            Flow::new("guarded", move |h: FlowHandle<i64, i64>| async move {
                let _guard = scopeguard::guard((), move |_| releases.set(releases.get() + 1));
                loop {
                    let x = h.recv().await?;
                    h.send(x).await?;
                }
            })
        })
    };

    // Success path: upstream ends.
    let line = lift::<(), _>(vec![1i64, 2]) >> guarded(&releases);
    assert_eq!(run(&line).unwrap(), vec![1, 2]);
    assert_eq!(releases.get(), 1);

    // Short-circuit path: downstream take stops demanding.
    let line = lift::<(), _>(vec![1i64, 2, 3, 4]) >> guarded(&releases) >> take(1);
    assert_eq!(run(&line).unwrap(), vec![1]);
    assert_eq!(releases.get(), 2);

    // Stepwise path: the iterate stream is dropped mid-consumption.
    let line = lift::<(), _>(vec![1i64, 2, 3, 4]) >> guarded(&releases);
    let mut stream = flowline::iterate(&line);
    assert_eq!(stream.next(), Some(Ok(1)));
    drop(stream);
    assert_eq!(releases.get(), 3);
}

#[test]
fn test_finalization_on_fault() {
    let releases = Rc::new(Cell::new(0usize));
    let guarded = {
        let releases = Rc::clone(&releases);
        Stage::flow("guarded", move || {
            let releases = Rc::clone(&releases);
            Flow::new("guarded", move |h: FlowHandle<i64, i64>| async move {
                let _guard = scopeguard::guard((), move |_| releases.set(releases.get() + 1));
                loop {
                    let x = h.recv().await?;
                    if x >= 2 {
                        return Err(StreamError::processing("bad element"));
                    }
                    h.send(x).await?;
                }
            })
        })
    };
    let line = lift::<(), _>(vec![0i64, 1, 2, 3]) >> guarded;
    assert_eq!(
        run(&line).unwrap_err(),
        StreamError::processing("bad element")
    );
    assert_eq!(releases.get(), 1);
}

#[test]
fn test_take_refinement_concrete() {
    let stacked = lift::<(), _>(0i64..) >> take(5) >> take(4) >> take(3);
    let min = lift::<(), _>(0i64..) >> take(3);
    assert_eq!(run(&stacked).unwrap(), run(&min).unwrap());
}

#[test]
fn test_lazy_prefix_pulls_exactly_n() {
    let pulls = Rc::new(Cell::new(0usize));
    let counter = {
        let pulls = Rc::clone(&pulls);
        gen::<(), _>((0i64..).inspect(move |_| pulls.set(pulls.get() + 1)))
    };
    let line = counter >> take(4);
    assert_eq!(run(&line).unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(pulls.get(), 4);
}

#[test]
fn test_strict_source_fails_eagerly() {
    let touched = Rc::new(Cell::new(0usize));
    let strict_failing: Stage<(), i64> = {
        let touched = Rc::clone(&touched);
        Stage::strict("failing", move |_feed: Feed<()>| {
            let touched = Rc::clone(&touched);
            Box::new((0..3).map(move |i| {
                touched.set(touched.get() + 1);
                if i < 2 {
                    Ok(i)
                } else {
                    Err(StreamError::processing("bad source"))
                }
            }))
        })
    };
    let err = run(&strict_failing).unwrap_err();
    assert_eq!(err, StreamError::processing("bad source"));
    // The whole source was pulled before anything reached downstream.
    assert_eq!(touched.get(), 3);
}

#[test]
fn test_lazy_source_fails_only_when_demanded() {
    let bad_lazy = || {
        Stage::lazy("bad", |_feed: Feed<()>| {
            Box::new((0i64..).map(|i| {
                if i < 2 {
                    Ok(i)
                } else {
                    Err(StreamError::processing("bad element"))
                }
            }))
        })
    };
    // Exhausting the tail before the bad element keeps the run successful.
    let line = bad_lazy() >> take(0);
    assert_eq!(run(&line).unwrap(), Vec::<i64>::new());
    let line = bad_lazy() >> take(2);
    assert_eq!(run(&line).unwrap(), vec![0, 1]);
    // Demanding past the prefix surfaces the fault.
    let line = bad_lazy() >> take(3);
    assert_eq!(
        run(&line).unwrap_err(),
        StreamError::processing("bad element")
    );
}

#[test]
fn test_blocked_upstream_for_demanding_consumer() {
    // A consumer at the head has no live producer.
    let line = take::<()>(1) >> gen(std::iter::empty::<i64>());
    assert_eq!(run(&line).unwrap_err(), StreamError::BlockedUpstream);

    let alone: Stage<(), Vec<()>> = collect(5);
    assert_eq!(run(&alone).unwrap_err(), StreamError::BlockedUpstream);
}

proptest! {
    #[test]
    fn prop_associativity(values in proptest::collection::vec(-1000i64..1000, 0..32)) {
        let a = || lift::<(), _>(values.clone());
        let left = (a() >> square()) >> add_one();
        let right = a() >> (square() >> add_one());
        prop_assert_eq!(run(&left).unwrap(), run(&right).unwrap());
    }

    #[test]
    fn prop_take_refinement(n in 0usize..20, m in 0usize..20) {
        let stacked = lift::<(), _>(0i64..) >> take(n) >> take(m);
        let refined = lift::<(), _>(0i64..) >> take(n.min(m));
        prop_assert_eq!(run(&stacked).unwrap(), run(&refined).unwrap());
    }

    #[test]
    fn prop_reverse_equivalence(values in proptest::collection::vec(-100i64..100, 0..16)) {
        let forward = lift::<(), _>(values.clone()) >> square() >> add_one();
        let backward: Stage<(), i64> = add_one() << (square() << values.clone());
        prop_assert_eq!(run(&forward).unwrap(), run(&backward).unwrap());
    }
}
