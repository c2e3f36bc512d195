//! Stress tests for concurrent logging
//!
//! These tests verify:
//! - Logger clones can be shared across threads without losing events
//! - The periodic batcher keeps arrival order and loses nothing under
//!   concurrent appends
//! - The async wrapper applies back-pressure or drops according to its
//!   overflow policy
//! - A rolling file written by many threads contains whole lines only

use lite_logger::config::LoggerConfiguration;
use lite_logger::core::{LogEvent, LogLevel, LoggerMetrics, OverflowPolicy, Result, SelfLog};
use lite_logger::formatting::JsonFormatter;
use lite_logger::sinks::async_wrapper::AsyncSinkOptions;
use lite_logger::sinks::{
    AsyncSink, BatchEmitter, BatchingOptions, PeriodicBatcher, RollingFileSink, Sink,
    SinkRegistration,
};
use lite_logger::info;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 1_000;

#[derive(Clone, Default)]
struct Counting {
    count: Arc<AtomicUsize>,
}

impl Sink for Counting {
    fn emit(&mut self, _event: &LogEvent) -> Result<()> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Sink that stalls on every write
#[derive(Clone, Default)]
struct Slow {
    count: Arc<AtomicUsize>,
}

impl Sink for Slow {
    fn emit(&mut self, _event: &LogEvent) -> Result<()> {
        thread::sleep(Duration::from_millis(1));
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

#[test]
fn test_concurrent_logging_through_clones() {
    let counting = Counting::default();
    let logger = LoggerConfiguration::new()
        .with_self_log(SelfLog::disabled())
        .write_to(counting.clone())
        .create_logger();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.for_context(format!("Worker{}", t));
            thread::spawn(move || {
                for n in 0..PER_THREAD {
                    info!(logger, "message {N}", N = n);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }

    assert_eq!(counting.count.load(Ordering::Relaxed), THREADS * PER_THREAD);
    assert_eq!(logger.metrics().total_logged(), (THREADS * PER_THREAD) as u64);
}

#[derive(Clone, Default)]
struct Collecting {
    batches: Arc<Mutex<Vec<Vec<String>>>>,
}

impl BatchEmitter for Collecting {
    fn emit_batch(&self, events: &[LogEvent]) -> Result<()> {
        self.batches
            .lock()
            .push(events.iter().map(LogEvent::render_message).collect());
        Ok(())
    }
}

#[test]
fn test_batcher_concurrent_appends() {
    let collecting = Collecting::default();
    let batcher = Arc::new(PeriodicBatcher::with_diagnostics(
        collecting.clone(),
        BatchingOptions::default()
            .with_period(Duration::from_millis(5))
            .with_batch_size_limit(50)
            .with_queue_limit(THREADS * PER_THREAD),
        SelfLog::disabled(),
        Arc::new(LoggerMetrics::new()),
    ));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let batcher = Arc::clone(&batcher);
            thread::spawn(move || {
                for n in 0..PER_THREAD {
                    batcher.append(LogEvent::new(LogLevel::Warning, format!("{}:{}", t, n)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("append thread panicked");
    }
    batcher.flush();

    let batches = collecting.batches.lock();
    assert!(batches.iter().all(|batch| !batch.is_empty() && batch.len() <= 50));

    let all: Vec<&String> = batches.iter().flatten().collect();
    assert_eq!(all.len(), THREADS * PER_THREAD);

    // Per-thread order survives batching
    for t in 0..THREADS {
        let prefix = format!("{}:", t);
        let sequence: Vec<usize> = all
            .iter()
            .filter_map(|message| message.strip_prefix(prefix.as_str()))
            .map(|n| n.parse().expect("numeric suffix"))
            .collect();
        assert_eq!(sequence, (0..PER_THREAD).collect::<Vec<_>>());
    }
}

#[test]
fn test_async_block_policy_loses_nothing() {
    let slow = Slow::default();
    let metrics = Arc::new(LoggerMetrics::new());
    let mut sink = AsyncSink::with_options(
        vec![SinkRegistration::new(slow.clone())],
        AsyncSinkOptions::default()
            .with_buffer_size(4)
            .with_overflow_policy(OverflowPolicy::Block)
            .with_diagnostics(SelfLog::disabled(), Arc::clone(&metrics)),
    );

    for n in 0..200 {
        sink.emit(&LogEvent::new(LogLevel::Information, format!("event {}", n)))
            .expect("async sink accepts events while running");
    }
    sink.shutdown(Duration::from_secs(10)).expect("worker drains");

    assert_eq!(slow.count.load(Ordering::Relaxed), 200);
    assert_eq!(metrics.dropped_count(), 0);
    assert!(metrics.block_events() > 0);
}

#[test]
fn test_async_drop_policy_accounts_for_every_event() {
    let slow = Slow::default();
    let metrics = Arc::new(LoggerMetrics::new());
    let overflow_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&overflow_calls);

    let async_sink = AsyncSink::with_options(
        vec![SinkRegistration::new(slow.clone())],
        AsyncSinkOptions::default()
            .with_buffer_size(8)
            .with_overflow_policy(OverflowPolicy::AlertAndDrop)
            .on_overflow(move |_dropped| {
                calls.fetch_add(1, Ordering::Relaxed);
            })
            .with_diagnostics(SelfLog::disabled(), Arc::clone(&metrics)),
    );
    let logger = LoggerConfiguration::new()
        .with_self_log(SelfLog::disabled())
        .write_to(async_sink)
        .create_logger();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let logger = logger.clone();
            thread::spawn(move || {
                for n in 0..250 {
                    logger.write(LogLevel::Information, "burst {N}", [("N", n)].into_iter().collect());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }
    assert!(logger.shutdown(Duration::from_secs(30)));

    let written = slow.count.load(Ordering::Relaxed) as u64;
    assert_eq!(written + metrics.dropped_count(), 1_000);
    assert!(metrics.dropped_count() > 0);
    assert!(overflow_calls.load(Ordering::Relaxed) >= 1);
}

#[test]
fn test_rolling_file_lines_stay_whole() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sink = RollingFileSink::new(temp_dir.path().join("stress-{Date}.log"))
        .expect("Failed to create sink")
        .with_formatter(JsonFormatter::new());
    let logger = LoggerConfiguration::new()
        .with_self_log(SelfLog::disabled())
        .write_to(sink)
        .create_logger();

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let logger = logger.clone();
            thread::spawn(move || {
                for n in 0..250 {
                    logger.write(
                        LogLevel::Information,
                        "thread {T} line {N}",
                        [("T", t), ("N", n)].into_iter().collect(),
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("logging thread panicked");
    }
    assert!(logger.shutdown(Duration::from_secs(5)));

    let mut lines = 0;
    for entry in std::fs::read_dir(temp_dir.path()).expect("Failed to list log dir") {
        let content = std::fs::read_to_string(entry.expect("dir entry").path()).expect("read log");
        for line in content.lines() {
            let parsed: serde_json::Value = serde_json::from_str(line).expect("whole JSON line");
            assert!(parsed["Message"].as_str().is_some_and(|m| m.starts_with("thread ")));
            lines += 1;
        }
    }
    assert_eq!(lines, 1_000);
}
