//! Main logger implementation
//!
//! A [`Logger`] is a cheap, cloneable handle to a shared pipeline:
//!
//! ```text
//! bound properties -> enrichers -> level gate -> filters -> sink fan-out
//! ```
//!
//! Every sink registration is visited in registration order and guarded on
//! its own, so a failing or panicking sink never reaches the call site and
//! never stops the other sinks.

use super::{
    error::{LoggerError, Result},
    log_event::{ExceptionInfo, LogEvent, SOURCE_CONTEXT_PROPERTY},
    log_level::LogLevel,
    message_template::MessageTemplate,
    metrics::LoggerMetrics,
    property::{Properties, PropertyValue},
    self_log::SelfLog,
};
use crate::config::LoggerConfiguration;
use crate::enrichers::{Enricher, LogContextEnricher};
use crate::filters::{Filter, LevelFilter};
use crate::sinks::{ConsoleSink, SinkRegistration};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// This timeout is used when the last logger handle is dropped without an
/// explicit shutdown. For custom timeout control, use [`Logger::shutdown`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

struct Pipeline {
    level: LevelFilter,
    enrichers: Vec<Box<dyn Enricher>>,
    filters: Vec<Box<dyn Filter>>,
    sinks: Vec<SinkRegistration>,
    self_log: SelfLog,
    metrics: Arc<LoggerMetrics>,
    log_context: Option<LogContextEnricher>,
    stopped: AtomicBool,
}

impl Pipeline {
    fn process(&self, mut event: LogEvent) {
        for enricher in &self.enrichers {
            enricher.enrich(&mut event);
        }

        if !self.filters.iter().all(|filter| filter.is_enabled(&event)) {
            self.metrics.record_filtered();
            return;
        }

        for registration in &self.sinks {
            registration.dispatch(&event, &self.self_log, &self.metrics);
        }
        self.metrics.record_logged();
    }

    fn flush(&self) -> usize {
        self.sinks
            .iter()
            .filter(|registration| !registration.flush(&self.self_log, &self.metrics))
            .count()
    }

    /// Returns `false` when a sink failed to stop or the deadline passed
    fn shutdown(&self, timeout: Duration) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return true;
        }

        let deadline = Instant::now() + timeout;
        let mut completed = true;
        for registration in &self.sinks {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !registration.shutdown(remaining, &self.self_log, &self.metrics) {
                completed = false;
            }
        }

        if Instant::now() > deadline {
            self.self_log.warn(format_args!(
                "Logger shutdown did not finish within {:?}. Some events may be lost.",
                timeout
            ));
            completed = false;
        }
        completed
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

/// Handle to a logging pipeline
///
/// Clones share the same pipeline. Handles created by [`Logger::for_context`]
/// or [`Logger::with_property`] additionally carry bound properties that are
/// added to every event they write.
///
/// # Example
///
/// ```
/// use lite_logger::config::LoggerConfiguration;
/// use lite_logger::core::{LogLevel, Properties};
/// use lite_logger::sinks::ConsoleSink;
///
/// let logger = LoggerConfiguration::new()
///     .minimum_level(LogLevel::Information)
///     .write_to(ConsoleSink::plain())
///     .create_logger();
///
/// let orders = logger.for_context("Shop.Orders");
/// orders.write(
///     LogLevel::Information,
///     "Order {OrderId} placed",
///     [("OrderId", 42)].into_iter().collect(),
/// );
/// orders.warning("Payment retry scheduled");
/// ```
#[derive(Clone)]
pub struct Logger {
    pipeline: Arc<Pipeline>,
    bound: Arc<Properties>,
}

impl Logger {
    /// Assemble a pipeline from an explicit configuration
    pub fn new(config: LoggerConfiguration) -> Self {
        let parts = config.into_parts();
        Self {
            pipeline: Arc::new(Pipeline {
                level: LevelFilter::new(parts.minimum_level),
                enrichers: parts.enrichers,
                filters: parts.filters,
                sinks: parts.sinks,
                self_log: parts.self_log,
                metrics: parts.metrics,
                log_context: parts.log_context,
                stopped: AtomicBool::new(false),
            }),
            bound: Arc::new(Properties::new()),
        }
    }

    /// Debug level, coloured console output and nothing else
    pub fn default_console() -> Self {
        LoggerConfiguration::new()
            .minimum_level(LogLevel::Debug)
            .write_to(ConsoleSink::new())
            .create_logger()
    }

    /// Handle whose events carry `SourceContext = name`
    #[must_use]
    pub fn for_context(&self, name: impl Into<String>) -> Self {
        self.with_property(SOURCE_CONTEXT_PROPERTY, name.into())
    }

    /// Handle whose events carry an extra property
    #[must_use]
    pub fn with_property(&self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        let mut bound = (*self.bound).clone();
        bound.add_or_update(name, value);
        Self {
            pipeline: Arc::clone(&self.pipeline),
            bound: Arc::new(bound),
        }
    }

    pub fn minimum_level(&self) -> LogLevel {
        self.pipeline.level.minimum()
    }

    /// Whether an event at `level` would pass the global level gate
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.pipeline.level.allows(level) && !self.pipeline.stopped.load(Ordering::Acquire)
    }

    /// Level gate for the write paths; counts rejected events
    fn admits(&self, level: LogLevel) -> bool {
        if self.pipeline.stopped.load(Ordering::Acquire) {
            return false;
        }
        if !self.pipeline.level.allows(level) {
            self.pipeline.metrics.record_filtered();
            return false;
        }
        true
    }

    /// Run a prepared event through the pipeline
    pub fn write_event(&self, mut event: LogEvent) {
        // The level gate does not look at properties, so it runs before
        // any enrichment work
        if !self.admits(event.level()) {
            return;
        }

        for (name, value) in self.bound.iter() {
            event.add_property_if_absent(name, value.clone());
        }
        self.pipeline.process(event);
    }

    pub fn write(&self, level: LogLevel, template: impl Into<MessageTemplate>, properties: Properties) {
        if self.admits(level) {
            self.write_event(LogEvent::new(level, template).with_properties(properties));
        }
    }

    /// Write an event that carries error details
    pub fn write_exception(
        &self,
        level: LogLevel,
        exception: ExceptionInfo,
        template: impl Into<MessageTemplate>,
        properties: Properties,
    ) {
        if !self.admits(level) {
            return;
        }
        self.write_event(
            LogEvent::new(level, template)
                .with_properties(properties)
                .with_exception(exception),
        );
    }

    #[inline]
    pub fn verbose(&self, template: &str) {
        self.write(LogLevel::Verbose, template, Properties::new());
    }

    #[inline]
    pub fn debug(&self, template: &str) {
        self.write(LogLevel::Debug, template, Properties::new());
    }

    #[inline]
    pub fn information(&self, template: &str) {
        self.write(LogLevel::Information, template, Properties::new());
    }

    #[inline]
    pub fn warning(&self, template: &str) {
        self.write(LogLevel::Warning, template, Properties::new());
    }

    #[inline]
    pub fn error(&self, template: &str) {
        self.write(LogLevel::Error, template, Properties::new());
    }

    #[inline]
    pub fn fatal(&self, template: &str) {
        self.write(LogLevel::Fatal, template, Properties::new());
    }

    /// Flush every sink
    ///
    /// Queued sinks (email, async) hand over everything buffered so far.
    /// Individual failures are reported to the self-log; the error only
    /// summarizes how many sinks failed.
    pub fn flush(&self) -> Result<()> {
        match self.pipeline.flush() {
            0 => Ok(()),
            failed => Err(LoggerError::writer(format!("{} sinks failed to flush", failed))),
        }
    }

    /// Gracefully shut down the pipeline with a custom timeout
    ///
    /// Background workers drain what they hold and stop; synchronous sinks
    /// are flushed. Later writes through any handle are ignored.
    ///
    /// **Note**: when the last handle is dropped without an explicit
    /// shutdown, [`DEFAULT_SHUTDOWN_TIMEOUT`] is used.
    ///
    /// # Returns
    ///
    /// `true` if every sink stopped cleanly within `timeout`
    ///
    /// # Example
    ///
    /// ```no_run
    /// use lite_logger::core::Logger;
    /// use std::time::Duration;
    ///
    /// let logger = Logger::default_console();
    /// logger.information("Important message");
    ///
    /// if !logger.shutdown(Duration::from_secs(10)) {
    ///     eprintln!("Warning: logger shutdown timed out");
    /// }
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.pipeline.shutdown(timeout)
    }

    pub fn is_stopped(&self) -> bool {
        self.pipeline.stopped.load(Ordering::Acquire)
    }

    /// Get the pipeline metrics
    ///
    /// # Example
    ///
    /// ```
    /// use lite_logger::core::Logger;
    ///
    /// let logger = Logger::default_console();
    /// logger.verbose("below the Debug minimum");
    ///
    /// let metrics = logger.metrics();
    /// assert_eq!(metrics.filtered_count(), 1);
    /// println!("Drop rate: {:.2}%", metrics.drop_rate());
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.pipeline.metrics
    }

    pub fn self_log(&self) -> &SelfLog {
        &self.pipeline.self_log
    }

    /// Ambient property stack installed with
    /// [`LoggerConfiguration::enrich_from_log_context`]
    ///
    /// ```
    /// use lite_logger::config::{build_logger, LoggerOptions};
    ///
    /// let logger = build_logger(&LoggerOptions::default(), None).expect("valid options");
    /// if let Some(context) = logger.log_context() {
    ///     let _request = context.push("RequestId", "c0ffee");
    ///     logger.information("handled");
    /// }
    /// ```
    pub fn log_context(&self) -> Option<&LogContextEnricher> {
        self.pipeline.log_context.as_ref()
    }

    pub fn sink_count(&self) -> usize {
        self.pipeline.sinks.len()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("minimum_level", &self.minimum_level())
            .field("enrichers", &self.pipeline.enrichers.len())
            .field("filters", &self.pipeline.filters.len())
            .field("sinks", &self.pipeline.sinks)
            .field("bound", &*self.bound)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichers::{LoggerNameEnricher, LOGGER_PROPERTY};
    use crate::sinks::Sink;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Capture {
        events: Arc<Mutex<Vec<LogEvent>>>,
    }

    impl Sink for Capture {
        fn emit(&mut self, event: &LogEvent) -> Result<()> {
            self.events.lock().push(event.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    struct Panicking;

    impl Sink for Panicking {
        fn emit(&mut self, _event: &LogEvent) -> Result<()> {
            panic!("sink exploded")
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn configuration() -> LoggerConfiguration {
        LoggerConfiguration::new().with_self_log(SelfLog::disabled())
    }

    #[test]
    fn test_level_gate_is_inclusive() {
        let capture = Capture::default();
        let logger = configuration()
            .minimum_level(LogLevel::Warning)
            .write_to(capture.clone())
            .create_logger();

        logger.information("dropped");
        logger.warning("kept");
        logger.error("kept too");

        assert_eq!(capture.events.lock().len(), 2);
        assert_eq!(logger.metrics().filtered_count(), 1);
        assert_eq!(logger.metrics().total_logged(), 2);
    }

    #[test]
    fn test_bound_properties_and_enrichers() {
        let capture = Capture::default();
        let logger = configuration()
            .enrich_with(LoggerNameEnricher)
            .write_to(capture.clone())
            .create_logger();

        logger.for_context("Shop.Orders").with_property("Tenant", "acme").information("placed");
        logger.information("no context");

        let events = capture.events.lock();
        assert_eq!(events[0].source_context(), Some("Shop.Orders"));
        assert_eq!(events[0].properties().get("Tenant").and_then(|v| v.as_str()), Some("acme"));
        assert_eq!(
            events[0].properties().get(LOGGER_PROPERTY).and_then(|v| v.as_str()),
            Some("Shop.Orders")
        );
        assert_eq!(
            events[1].properties().get(LOGGER_PROPERTY).and_then(|v| v.as_str()),
            Some("Default")
        );
    }

    #[test]
    fn test_event_properties_win_over_bound_ones() {
        let capture = Capture::default();
        let logger = configuration().write_to(capture.clone()).create_logger();

        logger.with_property("Attempt", 1).write(
            LogLevel::Information,
            "Attempt {Attempt}",
            [("Attempt", 2)].into_iter().collect(),
        );
        assert_eq!(capture.events.lock()[0].render_message(), "Attempt 2");
    }

    #[test]
    fn test_filters_must_all_pass() {
        let capture = Capture::default();
        let logger = configuration()
            .filter_with(|event: &LogEvent| event.source_context() != Some("Noisy"))
            .write_to(capture.clone())
            .create_logger();

        logger.for_context("Noisy").error("hidden");
        logger.for_context("Quiet").error("shown");

        let events = capture.events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].render_message(), "shown");
    }

    #[test]
    fn test_per_sink_minimum_levels() {
        let everything = Capture::default();
        let warnings = Capture::default();
        let logger = configuration()
            .write_to(everything.clone())
            .write_to_restricted(warnings.clone(), LogLevel::Warning)
            .create_logger();

        logger.debug("debug");
        logger.warning("warning");

        assert_eq!(everything.events.lock().len(), 2);
        assert_eq!(warnings.events.lock().len(), 1);
    }

    #[test]
    fn test_panicking_sink_does_not_stop_others() {
        let capture = Capture::default();
        let logger = configuration()
            .write_to(Panicking)
            .write_to(capture.clone())
            .create_logger();

        logger.error("still delivered");
        assert_eq!(capture.events.lock().len(), 1);
        assert_eq!(logger.metrics().sink_failures(), 1);
    }

    #[test]
    fn test_writes_after_shutdown_are_ignored() {
        let capture = Capture::default();
        let logger = configuration().write_to(capture.clone()).create_logger();
        let clone = logger.clone();

        assert!(logger.shutdown(Duration::from_secs(1)));
        assert!(clone.is_stopped());
        assert!(!clone.is_enabled(LogLevel::Fatal));
        clone.fatal("late");
        assert!(capture.events.lock().is_empty());
        assert!(logger.shutdown(Duration::from_secs(1)), "second shutdown is a no-op");
    }

    #[test]
    fn test_exception_is_attached() {
        let capture = Capture::default();
        let logger = configuration().write_to(capture.clone()).create_logger();
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.cfg");

        logger.write_exception(
            LogLevel::Error,
            ExceptionInfo::from_error(&error),
            "Cannot load {File}",
            [("File", "missing.cfg")].into_iter().collect(),
        );
        let events = capture.events.lock();
        assert_eq!(events[0].exception().map(|e| e.message.as_str()), Some("missing.cfg"));
    }
}
