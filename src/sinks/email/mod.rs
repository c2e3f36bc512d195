//! Batched email sink
//!
//! Events are queued by a [`PeriodicBatcher`]. Each batch becomes one email:
//! the body is every event rendered with the body formatter, the subject is
//! the most severe event rendered with the subject template. Delivery is
//! at-most-once; a failed send is reported to the self-log and the batch is
//! discarded.

pub mod config;
pub mod transport;

pub use config::EmailConfig;
pub use transport::{EmailMessage, EmailTransport, SmtpTransport};

use super::batching::{BatchEmitter, BatchingOptions, PeriodicBatcher};
use super::Sink;
use crate::core::{LogEvent, LoggerError, LoggerMetrics, Result, SelfLog};
use crate::formatting::{OutputTemplateFormatter, TextFormatter};
use std::sync::Arc;
use std::time::Duration;

/// Turns a batch of events into an email and hands it to a transport
pub struct EmailBatchEmitter {
    from: String,
    to: Vec<String>,
    is_body_html: bool,
    body_formatter: Box<dyn TextFormatter>,
    subject_formatter: Box<dyn TextFormatter>,
    transport: Box<dyn EmailTransport>,
}

impl EmailBatchEmitter {
    /// # Errors
    ///
    /// `MissingArgument` when the config has no sender or recipients
    pub fn new<T: EmailTransport + 'static>(config: &EmailConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            from: config.from_email.trim().to_string(),
            to: config.recipients(),
            is_body_html: config.is_body_html,
            body_formatter: Box::new(OutputTemplateFormatter::default()),
            subject_formatter: Box::new(OutputTemplateFormatter::new(config.subject_template())),
            transport: Box::new(transport),
        })
    }

    #[must_use]
    pub fn with_body_formatter<F: TextFormatter + 'static>(mut self, formatter: F) -> Self {
        self.body_formatter = Box::new(formatter);
        self
    }

    #[must_use]
    pub fn with_subject_formatter<F: TextFormatter + 'static>(mut self, formatter: F) -> Self {
        self.subject_formatter = Box::new(formatter);
        self
    }

    /// Render the email for a batch; `None` for an empty batch
    pub fn render(&self, events: &[LogEvent]) -> Option<EmailMessage> {
        // max_by_key returns the last maximum, so search from the back to
        // pick the earliest of equally severe events
        let most_severe = events.iter().rev().max_by_key(|event| event.level())?;

        let mut body = String::new();
        for event in events {
            self.body_formatter.format(event, &mut body);
        }

        Some(EmailMessage {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: self.subject_formatter.format_to_string(most_severe),
            body,
            is_body_html: self.is_body_html,
        })
    }
}

impl BatchEmitter for EmailBatchEmitter {
    fn emit_batch(&self, events: &[LogEvent]) -> Result<()> {
        match self.render(events) {
            Some(message) => self
                .transport
                .send(&message)
                .map_err(|e| LoggerError::email(format!("Failed to send email: {}", e))),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "email"
    }
}

/// Tuning for [`EmailSink`]
#[derive(Clone)]
pub struct EmailSinkOptions {
    pub batching: BatchingOptions,
    pub self_log: SelfLog,
    pub metrics: Arc<LoggerMetrics>,
}

impl Default for EmailSinkOptions {
    fn default() -> Self {
        Self {
            batching: BatchingOptions::default(),
            self_log: SelfLog::default(),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }
}

impl EmailSinkOptions {
    #[must_use]
    pub fn with_batching(mut self, batching: BatchingOptions) -> Self {
        self.batching = batching;
        self
    }

    #[must_use]
    pub fn with_self_log(mut self, self_log: SelfLog) -> Self {
        self.self_log = self_log;
        self
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<LoggerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Sink that batches events and sends them by email
///
/// # Example
///
/// ```no_run
/// use lite_logger::sinks::{EmailConfig, EmailSink, SmtpTransport};
///
/// let config = EmailConfig::new("app@example.com", "ops@example.com; oncall@example.com")
///     .with_mail_server("smtp.example.com", 25)
///     .with_subject("[{Level:u3}] {Message:lj}");
/// let transport = SmtpTransport::from_config(&config).expect("valid SMTP settings");
/// let sink = EmailSink::new(&config, transport).expect("valid addresses");
/// ```
pub struct EmailSink {
    batcher: PeriodicBatcher<EmailBatchEmitter>,
}

impl EmailSink {
    /// Email sink with default batching (100 events per 30 s, queue of 10000)
    ///
    /// # Errors
    ///
    /// `MissingArgument` when the config has no sender or recipients
    pub fn new<T: EmailTransport + 'static>(config: &EmailConfig, transport: T) -> Result<Self> {
        Self::with_options(config, transport, EmailSinkOptions::default())
    }

    /// # Errors
    ///
    /// `MissingArgument` when the config has no sender or recipients
    pub fn with_options<T: EmailTransport + 'static>(
        config: &EmailConfig,
        transport: T,
        options: EmailSinkOptions,
    ) -> Result<Self> {
        let emitter = EmailBatchEmitter::new(config, transport)?;
        Ok(Self::from_emitter(emitter, options))
    }

    /// Use a preconfigured emitter (custom formatters)
    pub fn from_emitter(emitter: EmailBatchEmitter, options: EmailSinkOptions) -> Self {
        Self {
            batcher: PeriodicBatcher::with_diagnostics(
                emitter,
                options.batching,
                options.self_log,
                options.metrics,
            ),
        }
    }

    /// Send the oldest batch now; `false` when nothing was queued
    pub fn emit_next_batch(&self) -> bool {
        self.batcher.emit_next_batch()
    }

    pub fn queued_len(&self) -> usize {
        self.batcher.queued_len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.batcher.dropped_count()
    }
}

impl Sink for EmailSink {
    fn emit(&mut self, event: &LogEvent) -> Result<()> {
        self.batcher.append(event.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.batcher.flush();
        Ok(())
    }

    fn shutdown(&mut self, timeout: Duration) -> Result<()> {
        if self.batcher.shutdown(timeout) {
            Ok(())
        } else {
            Err(LoggerError::other(format!(
                "Email batching worker did not stop within {:?}",
                timeout
            )))
        }
    }

    fn name(&self) -> &str {
        "email"
    }
}
