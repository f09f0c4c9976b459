//! # End-to-End Pipeline Scenarios
//!
//! Concrete pipeline runs exercising the whole surface together: arithmetic
//! chains, flow coroutine stages, accumulation, stacked prefix windows,
//! mapping coercion, layered flow conversations, stepwise iteration, queue
//! endpoints driven from a worker thread, and the configured runner.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test scenarios
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use flowline::application::runner::{iterate, run, Runner};
use flowline::infrastructure::adapters::{queue_pull, queue_push};
use flowline::infrastructure::config::{FlowlineConfig, RunnerSettings};
use flowline::stages::{collect, pipe, pipe_, take};
use flowline::{gen, lift, Flow, FlowHandle, Stage};

/// S1: arithmetic map chain.
#[test]
fn test_arithmetic_map_chain() {
    let line = lift(vec![1i64, 2, 3, 4]) >> pipe(|x: i64| x * x) >> pipe(|x: i64| x + 1);
    assert_eq!(run(&line).unwrap(), vec![2, 5, 10, 17]);
}

/// S2: a flow stage that sums input pairs.
#[test]
fn test_flow_pair_sum() {
    let pair_sum = Stage::flow("pair_sum", || {
        Flow::new("pair_sum", |h: FlowHandle<i64, i64>| async move {
            loop {
                let x = h.recv().await?;
                let y = h.recv().await?;
                h.send(x + y).await?;
            }
        })
    });
    let line = lift(vec![1i64, 2, 3, 4]) >> pair_sum >> take(2);
    assert_eq!(run(&line).unwrap(), vec![3, 7]);
}

/// S3: collect accumulates and emits once.
#[test]
fn test_collect_scenario() {
    let line = lift(vec![1i64, 2, 3, 4, 5]) >> collect(5);
    assert_eq!(run(&line).unwrap(), vec![vec![1, 2, 3, 4, 5]]);
}

/// S4: stacked takes refine to the minimum.
#[test]
fn test_stacked_takes_over_counter() {
    let line = lift(0i64..) >> take(5) >> take(4) >> take(3);
    assert_eq!(run(&line).unwrap(), vec![0, 1, 2]);
}

/// S6: a mapping coerces to its key-value pairs.
#[test]
fn test_mapping_coercion_scenario() {
    let mut map = HashMap::new();
    map.insert("a".to_string(), 2i64);
    let line = lift(map) >> take(2);
    assert_eq!(run(&line).unwrap(), vec![("a".to_string(), 2)]);
}

/// A lazy transformer between a counter and a prefix window.
#[test]
fn test_lazy_increment_over_counter() {
    let add_one: Stage<i64, i64> = Stage::lazy("add_one", |feed| {
        Box::new(feed.into_stream().map(|item| item.map(|x: i64| x + 1)))
    });
    let line = lift(0i64..) >> add_one >> take(5);
    assert_eq!(run(&line).unwrap(), vec![1, 2, 3, 4, 5]);
}

/// Three layered flows holding a conversation across suspension points.
#[test]
fn test_layered_flow_conversation() {
    let layer1 = Stage::flow("layer1", || {
        Flow::new("layer1", |h: FlowHandle<(), i64>| async move {
            h.send(1).await?;
            h.send(2).await?;
            h.send(3).await?;
            Ok(())
        })
    });
    let layer2 = Stage::flow("layer2", || {
        Flow::new("layer2", |h: FlowHandle<i64, i64>| async move {
            let x = h.recv().await?;
            let y = h.recv().await?;
            h.send(x + y).await?;
            let z = h.recv().await?;
            h.send(x + y + z).await?;
            Ok(())
        })
    });
    let layer3 = Stage::flow("layer3", || {
        Flow::new("layer3", |h: FlowHandle<i64, i64>| async move {
            let a = h.recv().await?;
            h.send(a).await?;
            let b = h.recv().await?;
            h.send(a + b).await?;
            Ok(())
        })
    });
    let line = layer1 >> layer2 >> layer3;
    assert_eq!(run(&line).unwrap(), vec![3, 9]);
}

/// Stepwise consumption through the identity decomposer.
#[test]
fn test_iterate_stepwise_over_endless_line() {
    let line = lift(0i64..) >> pipe(|x: i64| x * 3);
    let mut stream = iterate(&line);
    assert_eq!(stream.next(), Some(Ok(0)));
    assert_eq!(stream.next(), Some(Ok(3)));
    assert_eq!(stream.next(), Some(Ok(6)));
    // Dropping the stream tears the line down without draining it.
}

/// Sinks observe every element even though they emit nothing.
#[test]
fn test_sink_side_effects_in_order() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = {
        let seen = Rc::clone(&seen);
        pipe_(move |x: i64| seen.borrow_mut().push(x))
    };
    let line = gen(1i64..=3) >> sink;
    assert_eq!(run(&line).unwrap(), Vec::<()>::new());
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
}

/// The worker-layer boundary: a line driven between two queue endpoints
/// terminates when the input queue signals EOF by disconnecting.
#[test]
fn test_queue_driven_worker_terminates_on_eof() {
    let (in_tx, in_rx) = crossbeam::channel::unbounded::<i64>();
    let (out_tx, out_rx) = crossbeam::channel::unbounded::<i64>();

    let worker = std::thread::spawn(move || {
        let line = queue_pull(in_rx) >> pipe(|x: i64| x * x) >> queue_push(out_tx);
        run(&line).map(|values| values.len())
    });

    for i in 1..=4 {
        in_tx.send(i).unwrap();
    }
    drop(in_tx);

    assert_eq!(worker.join().unwrap().unwrap(), 0);
    assert_eq!(out_rx.iter().collect::<Vec<_>>(), vec![1, 4, 9, 16]);
}

/// The configured runner records metrics alongside the values.
#[test]
fn test_configured_runner_reports() {
    let config = FlowlineConfig::from_toml_str(
        r#"
        [runner]
        max_materialized = 100
        "#,
    )
    .unwrap();
    let runner = Runner::new(config.runner.clone());
    let line = lift(vec![1i64, 2, 3]) >> pipe(|x: i64| x + 1);
    let report = runner.run(&line).unwrap();
    assert_eq!(report.values, vec![2, 3, 4]);
    assert_eq!(report.metrics.items_emitted(), 3);
    assert!(report.metrics.succeeded());
    assert_eq!(report.metrics.stage_arity(), 2);
}

/// A byte source wrapping a real file handle is drained and closed.
#[test]
fn test_byte_source_over_file() {
    use flowline::infrastructure::adapters::{byte_source, ByteSource};
    use flowline::StreamError;
    use std::io::{BufRead, BufReader, Write};

    struct FileLines {
        reader: Option<BufReader<std::fs::File>>,
    }

    impl ByteSource for FileLines {
        fn recv(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };
            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .map_err(|err| StreamError::io(err.to_string()))?;
            if read == 0 {
                Ok(None)
            } else {
                Ok(Some(line.trim_end().as_bytes().to_vec()))
            }
        }

        fn close(&mut self) -> Result<(), StreamError> {
            self.reader = None;
            Ok(())
        }
    }

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "alpha").unwrap();
    writeln!(file, "beta").unwrap();
    file.flush().unwrap();

    let handle = FileLines {
        reader: Some(BufReader::new(
            std::fs::File::open(file.path()).unwrap(),
        )),
    };
    let line = byte_source(handle)
        >> pipe(|frame: Vec<u8>| String::from_utf8_lossy(&frame).into_owned());
    assert_eq!(
        run(&line).unwrap(),
        vec!["alpha".to_string(), "beta".to_string()]
    );
}

/// Structured messages decode into records; an undecodable message faults
/// with the coercion error.
#[test]
fn test_message_records_decode() {
    use flowline::infrastructure::adapters::{records, MessageSource};
    use flowline::StreamError;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reading {
        channel: u8,
        value: f64,
    }

    struct Replay {
        messages: Vec<serde_json::Value>,
    }

    impl MessageSource for Replay {
        fn recv(&mut self) -> Result<Option<serde_json::Value>, StreamError> {
            if self.messages.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.messages.remove(0)))
            }
        }

        fn close(&mut self) -> Result<(), StreamError> {
            Ok(())
        }
    }

    let good = Replay {
        messages: vec![
            json!({ "channel": 1, "value": 0.5 }),
            json!({ "channel": 2, "value": 1.25 }),
        ],
    };
    let line = records::<(), Reading, _>(good);
    assert_eq!(
        run(&line).unwrap(),
        vec![
            Reading { channel: 1, value: 0.5 },
            Reading { channel: 2, value: 1.25 },
        ]
    );

    let bad = Replay {
        messages: vec![json!({ "channel": "not-a-number" })],
    };
    let line = records::<(), Reading, _>(bad);
    assert_eq!(run(&line).unwrap_err().category(), "coercion");
}

/// Settings survive the runner construction round trip.
#[test]
fn test_runner_settings_roundtrip() {
    let settings = RunnerSettings {
        max_materialized: Some(5),
        trace_items: true,
    };
    let runner = Runner::new(settings.clone());
    assert_eq!(runner.settings(), &settings);
}
