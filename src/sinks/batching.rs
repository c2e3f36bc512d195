//! Periodic batching buffer
//!
//! Events are appended to a bounded in-memory queue by producers and taken
//! in batches by a dedicated worker thread that wakes once per period:
//!
//! ```text
//! Idle --append--> Accumulating --tick--> Flushing --batch emitted--> Idle
//!                                  shutdown: Draining until empty or deadline
//! ```
//!
//! Producers never block on the emitter and never see its errors. A full
//! queue drops the new event.

use crate::core::overflow_policy::should_alert;
use crate::core::{LogEvent, LoggerMetrics, Result, SelfLog, DEFAULT_SHUTDOWN_TIMEOUT};
use crate::sinks::panic_message;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Receives batches taken from the buffer
pub trait BatchEmitter: Send + Sync + 'static {
    /// Emit events in arrival order
    fn emit_batch(&self, events: &[LogEvent]) -> Result<()>;

    fn name(&self) -> &str {
        "batch"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchingOptions {
    /// Most events handed to the emitter at once
    pub batch_size_limit: usize,
    /// Most events held in the queue; further appends are dropped
    pub queue_limit: usize,
    pub period: Duration,
    /// Flush immediately on the first event appended while idle
    pub eagerly_emit_first_event: bool,
}

impl Default for BatchingOptions {
    fn default() -> Self {
        Self {
            batch_size_limit: 100,
            queue_limit: 10_000,
            period: Duration::from_secs(30),
            eagerly_emit_first_event: false,
        }
    }
}

impl BatchingOptions {
    #[must_use]
    pub fn with_batch_size_limit(mut self, limit: usize) -> Self {
        self.batch_size_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn with_queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = limit;
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    #[must_use]
    pub fn with_eagerly_emit_first_event(mut self, eager: bool) -> Self {
        self.eagerly_emit_first_event = eager;
        self
    }
}

enum Control {
    /// Emit a batch now (eager first event)
    FlushNow,
    /// Drain until empty or `deadline`, then exit
    Shutdown { deadline: Instant },
}

struct Shared<E> {
    queue: Mutex<VecDeque<LogEvent>>,
    /// Held from taking a batch until it is emitted, so batches leave in order
    emitting: Mutex<()>,
    emitter: E,
    options: BatchingOptions,
    self_log: SelfLog,
    metrics: Arc<LoggerMetrics>,
    dropped: AtomicU64,
    /// Set while no event has arrived since the last empty tick
    idle: AtomicBool,
}

impl<E: BatchEmitter> Shared<E> {
    fn take_batch(&self) -> Vec<LogEvent> {
        let mut queue = self.queue.lock();
        let count = queue.len().min(self.options.batch_size_limit.max(1));
        queue.drain(..count).collect()
    }

    /// Emit one batch; returns false when the queue was empty
    fn emit_one(&self) -> bool {
        let _emitting = self.emitting.lock();
        let batch = self.take_batch();
        if batch.is_empty() {
            return false;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.emitter.emit_batch(&batch)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.metrics.record_sink_failure();
                self.self_log.error(format_args!(
                    "Failed to emit batch of {} events to '{}': {}",
                    batch.len(),
                    self.emitter.name(),
                    e
                ));
            }
            Err(payload) => {
                self.metrics.record_sink_failure();
                self.self_log.critical(format_args!(
                    "Batch emitter '{}' panicked: {}",
                    self.emitter.name(),
                    panic_message(payload.as_ref())
                ));
            }
        }
        true
    }

    fn tick(&self) {
        if !self.emit_one() {
            self.idle.store(true, Ordering::Release);
        }
    }

    fn drain(&self, deadline: Instant) {
        while Instant::now() < deadline && self.emit_one() {}
    }
}

/// Bounded queue flushed by a worker thread once per period
///
/// # Example
///
/// ```
/// use lite_logger::sinks::{BatchEmitter, BatchingOptions, PeriodicBatcher};
/// use lite_logger::core::{LogEvent, LogLevel, Result};
/// use std::time::Duration;
///
/// struct Count;
///
/// impl BatchEmitter for Count {
///     fn emit_batch(&self, events: &[LogEvent]) -> Result<()> {
///         println!("{} events", events.len());
///         Ok(())
///     }
/// }
///
/// let mut batcher = PeriodicBatcher::new(Count, BatchingOptions::default());
/// batcher.append(LogEvent::new(LogLevel::Warning, "queued"));
/// batcher.shutdown(Duration::from_secs(1));
/// ```
pub struct PeriodicBatcher<E: BatchEmitter> {
    shared: Arc<Shared<E>>,
    control: Option<Sender<Control>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<E: BatchEmitter> PeriodicBatcher<E> {
    pub fn new(emitter: E, options: BatchingOptions) -> Self {
        Self::with_diagnostics(emitter, options, SelfLog::default(), Arc::new(LoggerMetrics::new()))
    }

    /// Create a batcher reporting to the given self-log and metrics
    pub fn with_diagnostics(
        emitter: E,
        options: BatchingOptions,
        self_log: SelfLog,
        metrics: Arc<LoggerMetrics>,
    ) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::with_capacity(options.batch_size_limit.min(options.queue_limit))),
            idle: AtomicBool::new(options.eagerly_emit_first_event),
            emitting: Mutex::new(()),
            emitter,
            options,
            self_log,
            metrics,
            dropped: AtomicU64::new(0),
        });

        let (control, receiver) = unbounded();
        let worker_shared = Arc::clone(&shared);

        let worker = thread::Builder::new()
            .name("lite-logger-batcher".to_string())
            .spawn(move || {
                let period = worker_shared.options.period;
                let mut next_tick = Instant::now() + period;

                loop {
                    let wait = next_tick.saturating_duration_since(Instant::now());
                    match receiver.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            worker_shared.tick();
                            next_tick = Instant::now() + period;
                        }
                        Ok(Control::FlushNow) => {
                            worker_shared.emit_one();
                        }
                        Ok(Control::Shutdown { deadline }) => {
                            worker_shared.drain(deadline);
                            break;
                        }
                        Err(RecvTimeoutError::Disconnected) => {
                            worker_shared.drain(Instant::now() + DEFAULT_SHUTDOWN_TIMEOUT);
                            break;
                        }
                    }
                }
            });

        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                shared
                    .self_log
                    .error(format_args!("Failed to start batching worker: {}", e));
                None
            }
        };

        Self {
            shared,
            control: Some(control),
            worker,
        }
    }

    /// Queue an event; drops it when the queue is at its limit
    pub fn append(&self, event: LogEvent) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.len() >= self.shared.options.queue_limit {
                drop(queue);
                self.record_drop();
                return;
            }
            queue.push_back(event);
        }

        if self.shared.options.eagerly_emit_first_event && self.shared.idle.swap(false, Ordering::AcqRel) {
            if let Some(control) = &self.control {
                let _ = control.send(Control::FlushNow);
            }
        }
    }

    fn record_drop(&self) {
        let previous = self.shared.dropped.fetch_add(1, Ordering::Relaxed);
        self.shared.metrics.record_dropped();
        self.shared.metrics.record_queue_full();
        if should_alert(previous) {
            self.shared.self_log.warn(format_args!(
                "Batch queue for '{}' full ({} events), {} events dropped",
                self.shared.emitter.name(),
                self.shared.options.queue_limit,
                previous + 1
            ));
        }
    }

    /// Emit the oldest batch on the calling thread, as one tick would
    ///
    /// Returns `false` when the queue was empty.
    pub fn emit_next_batch(&self) -> bool {
        self.shared.emit_one()
    }

    /// Emit every queued batch on the calling thread
    pub fn flush(&self) {
        while self.shared.emit_one() {}
    }

    /// Stop the worker after draining the queue, waiting at most `timeout`
    ///
    /// Returns `true` when the worker finished in time. Events still queued
    /// afterwards are discarded.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        let start = Instant::now();
        if let Some(control) = self.control.take() {
            let _ = control.send(Control::Shutdown {
                deadline: start + timeout,
            });
        }

        let mut completed = true;
        if let Some(handle) = self.worker.take() {
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        self.shared.self_log.error(format_args!(
                            "Batching worker panicked during shutdown: {:?}",
                            e
                        ));
                        completed = false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    self.shared.self_log.warn(format_args!(
                        "Batching worker for '{}' did not finish within {:?}",
                        self.shared.emitter.name(),
                        timeout
                    ));
                    completed = false;
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        let remaining = {
            let mut queue = self.shared.queue.lock();
            let remaining = queue.len();
            queue.clear();
            remaining
        };
        if remaining > 0 {
            self.shared.self_log.warn(format_args!(
                "Discarded {} queued events for '{}' at shutdown",
                remaining,
                self.shared.emitter.name()
            ));
        }

        completed
    }

    pub fn is_running(&self) -> bool {
        self.control.is_some()
    }

    pub fn queued_len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Events dropped because the queue was full
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn options(&self) -> &BatchingOptions {
        &self.shared.options
    }

    pub fn emitter(&self) -> &E {
        &self.shared.emitter
    }
}

impl<E: BatchEmitter> Drop for PeriodicBatcher<E> {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }
    }
}
