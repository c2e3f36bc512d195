//! Background sink wrapper
//!
//! `AsyncSink` owns a set of sink registrations and writes to them from a
//! dedicated worker thread. The producer side only clones the event into a
//! bounded channel; what happens when that channel is full is decided by the
//! configured [`OverflowPolicy`].

use super::{Sink, SinkRegistration};
use crate::core::overflow_policy::{should_alert, OverflowCallback, OverflowPolicy};
use crate::core::{LogEvent, LoggerError, LoggerMetrics, Result, SelfLog, DEFAULT_SHUTDOWN_TIMEOUT};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default capacity of the channel in front of the worker
pub const DEFAULT_BUFFER_SIZE: usize = 10_000;

enum Message {
    Event(LogEvent),
    /// Flush every inner sink, then acknowledge
    Flush(Sender<()>),
}

/// Settings for [`AsyncSink`]
#[derive(Clone)]
pub struct AsyncSinkOptions {
    pub buffer_size: usize,
    pub overflow_policy: OverflowPolicy,
    pub on_overflow: Option<OverflowCallback>,
    pub self_log: SelfLog,
    pub metrics: Arc<LoggerMetrics>,
}

impl Default for AsyncSinkOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
            self_log: SelfLog::default(),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }
}

impl AsyncSinkOptions {
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    #[must_use]
    pub fn with_overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Called with the total drop count when an overflow alert fires
    #[must_use]
    pub fn on_overflow<F>(mut self, callback: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.on_overflow = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, self_log: SelfLog, metrics: Arc<LoggerMetrics>) -> Self {
        self.self_log = self_log;
        self.metrics = metrics;
        self
    }
}

impl fmt::Debug for AsyncSinkOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSinkOptions")
            .field("buffer_size", &self.buffer_size)
            .field("overflow_policy", &self.overflow_policy)
            .field("on_overflow", &self.on_overflow.is_some())
            .finish()
    }
}

/// Writes to wrapped sinks on a background thread
///
/// # Example
///
/// ```
/// use lite_logger::sinks::{AsyncSink, ConsoleSink, SinkRegistration};
/// use lite_logger::sinks::async_wrapper::AsyncSinkOptions;
/// use lite_logger::OverflowPolicy;
///
/// let sink = AsyncSink::with_options(
///     vec![SinkRegistration::new(ConsoleSink::plain())],
///     AsyncSinkOptions::default().with_overflow_policy(OverflowPolicy::Block),
/// );
/// ```
pub struct AsyncSink {
    sinks: Arc<Vec<SinkRegistration>>,
    sender: Option<Sender<Message>>,
    worker: Option<thread::JoinHandle<()>>,
    /// Set when the worker could not be started
    inline: bool,
    options: AsyncSinkOptions,
}

impl AsyncSink {
    pub fn new(sinks: Vec<SinkRegistration>) -> Self {
        Self::with_options(sinks, AsyncSinkOptions::default())
    }

    pub fn with_options(sinks: Vec<SinkRegistration>, options: AsyncSinkOptions) -> Self {
        let sinks = Arc::new(sinks);
        let (sender, receiver) = bounded(options.buffer_size.max(1));

        let worker_sinks = Arc::clone(&sinks);
        let self_log = options.self_log.clone();
        let metrics = Arc::clone(&options.metrics);
        let worker = thread::Builder::new()
            .name("lite-logger-async".to_string())
            .spawn(move || run_worker(&receiver, &worker_sinks, &self_log, &metrics));

        let (sender, worker) = match worker {
            Ok(handle) => (Some(sender), Some(handle)),
            // Without a worker every emit is written inline
            Err(e) => {
                options
                    .self_log
                    .error(format_args!("Failed to start async sink worker: {}", e));
                (None, None)
            }
        };

        Self {
            sinks,
            inline: worker.is_none(),
            sender,
            worker,
            options,
        }
    }

    pub fn options(&self) -> &AsyncSinkOptions {
        &self.options
    }

    /// Events currently waiting for the worker
    pub fn pending(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    fn write_inline(&self, event: &LogEvent) {
        for registration in self.sinks.iter() {
            registration.dispatch(event, &self.options.self_log, &self.options.metrics);
        }
    }

    /// Handle a full channel according to the overflow policy
    fn handle_overflow(&self, sender: &Sender<Message>, message: Message) {
        let metrics = &self.options.metrics;
        metrics.record_queue_full();

        match &self.options.overflow_policy {
            OverflowPolicy::DropNewest => {
                metrics.record_dropped();
            }

            OverflowPolicy::Block => {
                metrics.record_block();
                // Only fails when the worker has gone away
                let _ = sender.send(message);
            }

            OverflowPolicy::BlockWithTimeout(timeout) => {
                metrics.record_block();
                if let Err(SendTimeoutError::Timeout(_)) = sender.send_timeout(message, *timeout) {
                    self.alert_and_drop();
                }
            }

            OverflowPolicy::AlertAndDrop => {
                self.alert_and_drop();
            }
        }
    }

    fn alert_and_drop(&self) {
        let previous = self.options.metrics.record_dropped();
        if should_alert(previous) {
            self.options.self_log.warn(format_args!(
                "Async sink queue full, {} events dropped. \
                 Consider increasing buffer size or using a different overflow policy.",
                previous + 1
            ));

            if let Some(callback) = &self.options.on_overflow {
                callback(previous + 1);
            }
        }
    }

    fn flush_inline(&self) -> Result<()> {
        let mut failed = 0;
        for registration in self.sinks.iter() {
            if !registration.flush(&self.options.self_log, &self.options.metrics) {
                failed += 1;
            }
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(LoggerError::writer(format!("{} wrapped sinks failed to flush", failed)))
        }
    }
}

fn run_worker(
    receiver: &Receiver<Message>,
    sinks: &[SinkRegistration],
    self_log: &SelfLog,
    metrics: &LoggerMetrics,
) {
    // Returns the remaining messages before reporting disconnection
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Event(event) => {
                for registration in sinks {
                    registration.dispatch(&event, self_log, metrics);
                }
                // Flush once the burst is written
                if receiver.is_empty() {
                    for registration in sinks {
                        registration.flush(self_log, metrics);
                    }
                }
            }
            Message::Flush(ack) => {
                for registration in sinks {
                    registration.flush(self_log, metrics);
                }
                let _ = ack.send(());
            }
        }
    }
}

impl Sink for AsyncSink {
    fn emit(&mut self, event: &LogEvent) -> Result<()> {
        let Some(sender) = &self.sender else {
            if self.inline {
                self.write_inline(event);
                return Ok(());
            }
            return Err(LoggerError::LoggerStopped);
        };

        match sender.try_send(Message::Event(event.clone())) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                self.handle_overflow(sender, message);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::LoggerStopped),
        }
    }

    /// Wait until everything queued so far is written and flushed
    fn flush(&mut self) -> Result<()> {
        let Some(sender) = &self.sender else {
            return self.flush_inline();
        };

        let (ack, done) = bounded(1);
        sender
            .send_timeout(Message::Flush(ack), DEFAULT_SHUTDOWN_TIMEOUT)
            .map_err(|_| LoggerError::other("Async sink worker is not accepting flush requests"))?;
        done.recv_timeout(DEFAULT_SHUTDOWN_TIMEOUT)
            .map_err(|_| LoggerError::other("Async sink flush timed out"))
    }

    fn shutdown(&mut self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        // Closing the channel lets the worker drain and exit
        drop(self.sender.take());

        if let Some(handle) = self.worker.take() {
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        return Err(LoggerError::other(format!(
                            "Async sink worker panicked during shutdown: {:?}",
                            e
                        )));
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    return Err(LoggerError::other(format!(
                        "Async sink worker did not finish within {:?}; some events may be lost",
                        timeout
                    )));
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        let remaining = timeout.saturating_sub(start.elapsed());
        let mut failed = 0;
        for registration in self.sinks.iter() {
            if !registration.shutdown(remaining, &self.options.self_log, &self.options.metrics) {
                failed += 1;
            }
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(LoggerError::writer(format!("{} wrapped sinks failed to shut down", failed)))
        }
    }

    fn name(&self) -> &str {
        "async"
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT) {
                self.options.self_log.warn(e);
            }
        }
    }
}
