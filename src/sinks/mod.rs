//! Sinks and sink registration
//!
//! A sink receives every event that passed the pipeline and whose level meets
//! the sink's own minimum. Console and file sinks write inline; the email sink
//! and the async wrapper enqueue and return.

pub mod async_wrapper;
pub mod batching;
pub mod console;
pub mod email;
pub mod rolling_file;

pub use async_wrapper::AsyncSink;
pub use batching::{BatchEmitter, BatchingOptions, PeriodicBatcher};
pub use console::ConsoleSink;
pub use email::{
    EmailBatchEmitter, EmailConfig, EmailMessage, EmailSink, EmailSinkOptions, EmailTransport,
    SmtpTransport,
};
pub use rolling_file::{RollingFileSink, RollingInterval};

use crate::core::{LogEvent, LogLevel, LoggerMetrics, Result, SelfLog};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Destination for log events
pub trait Sink: Send {
    fn emit(&mut self, event: &LogEvent) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    /// Stop background work, waiting at most `timeout`
    fn shutdown(&mut self, _timeout: Duration) -> Result<()> {
        self.flush()
    }

    fn name(&self) -> &str;
}

/// A sink together with its minimum level
///
/// Each registration guards its sink with its own mutex, so a slow sink only
/// serializes writers of that sink.
pub struct SinkRegistration {
    name: String,
    minimum_level: LogLevel,
    sink: Mutex<Box<dyn Sink>>,
}

impl SinkRegistration {
    pub fn new<S: Sink + 'static>(sink: S) -> Self {
        Self::from_boxed(Box::new(sink))
    }

    pub fn from_boxed(sink: Box<dyn Sink>) -> Self {
        Self {
            name: sink.name().to_string(),
            minimum_level: LogLevel::Verbose,
            sink: Mutex::new(sink),
        }
    }

    /// Only deliver events at or above `level`
    #[must_use]
    pub fn restricted_to(mut self, level: LogLevel) -> Self {
        self.minimum_level = level;
        self
    }

    pub fn restricted_to_minimum_level(&self) -> LogLevel {
        self.minimum_level
    }

    #[inline]
    pub fn accepts(&self, level: LogLevel) -> bool {
        level >= self.minimum_level
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deliver an event if the level is accepted
    ///
    /// Returns `false` only when the sink failed. Errors and panics are
    /// reported to `self_log` and never propagate.
    pub(crate) fn dispatch(&self, event: &LogEvent, self_log: &SelfLog, metrics: &LoggerMetrics) -> bool {
        if !self.accepts(event.level()) {
            return true;
        }
        let mut sink = self.sink.lock();
        guarded(&self.name, "emit", self_log, metrics, || sink.emit(event))
    }

    pub(crate) fn flush(&self, self_log: &SelfLog, metrics: &LoggerMetrics) -> bool {
        let mut sink = self.sink.lock();
        guarded(&self.name, "flush", self_log, metrics, || sink.flush())
    }

    pub(crate) fn shutdown(&self, timeout: Duration, self_log: &SelfLog, metrics: &LoggerMetrics) -> bool {
        let mut sink = self.sink.lock();
        guarded(&self.name, "shutdown", self_log, metrics, || sink.shutdown(timeout))
    }
}

impl fmt::Debug for SinkRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistration")
            .field("name", &self.name)
            .field("minimum_level", &self.minimum_level)
            .finish()
    }
}

/// Run a sink operation with error and panic isolation
pub(crate) fn guarded<F>(
    sink_name: &str,
    operation: &str,
    self_log: &SelfLog,
    metrics: &LoggerMetrics,
    f: F,
) -> bool
where
    F: FnOnce() -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            metrics.record_sink_failure();
            self_log.error(format_args!("Sink '{}' {} failed: {}", sink_name, operation, e));
            false
        }
        Err(payload) => {
            metrics.record_sink_failure();
            self_log.critical(format_args!(
                "Sink '{}' panicked during {}: {}. Other sinks continue to function.",
                sink_name,
                operation,
                panic_message(payload.as_ref())
            ));
            false
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
