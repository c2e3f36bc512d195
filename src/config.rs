//! Logger configuration
//!
//! [`LoggerConfiguration`] is the explicit builder behind every [`Logger`]:
//! minimum level, enrichers, filters, sink registrations and the self-log.
//! [`LoggerOptions`] is the declarative, serde-bound surface on top of it;
//! [`build_logger`] turns options into a ready pipeline with the standard
//! enrichers and sinks.

use crate::core::{LogLevel, Logger, LoggerError, LoggerMetrics, Result, SelfLog};
use crate::enrichers::{
    Enricher, LogContextEnricher, LoggerNameEnricher, MachineNameEnricher,
};
use crate::filters::{ExcludingFilter, Filter, SourceContextFilter, SourceContextFilterOptions};
use crate::formatting::{JsonFormatter, OutputTemplateFormatter, DEFAULT_OUTPUT_TEMPLATE};
use crate::sinks::async_wrapper::AsyncSinkOptions;
use crate::sinks::{
    AsyncSink, ConsoleSink, EmailBatchEmitter, EmailConfig, EmailSink, EmailSinkOptions,
    RollingFileSink, Sink, SinkRegistration, SmtpTransport,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name used when no path format is configured
pub const DEFAULT_PATH_FORMAT: &str = "{Date}.log";

/// Directory, below the executable's directory, for the default log path
pub const DEFAULT_LOG_DIRECTORY: &str = "logs";

/// Builder for a logging pipeline
///
/// Sinks that report their own failures (email, async) should be created
/// with [`LoggerConfiguration::self_log`] and [`LoggerConfiguration::metrics`]
/// so that all diagnostics end up in one place.
pub struct LoggerConfiguration {
    minimum_level: LogLevel,
    enrichers: Vec<Box<dyn Enricher>>,
    filters: Vec<Box<dyn Filter>>,
    sinks: Vec<SinkRegistration>,
    self_log: SelfLog,
    metrics: Arc<LoggerMetrics>,
    log_context: Option<LogContextEnricher>,
}

/// Everything a pipeline is assembled from
pub(crate) struct PipelineParts {
    pub minimum_level: LogLevel,
    pub enrichers: Vec<Box<dyn Enricher>>,
    pub filters: Vec<Box<dyn Filter>>,
    pub sinks: Vec<SinkRegistration>,
    pub self_log: SelfLog,
    pub metrics: Arc<LoggerMetrics>,
    pub log_context: Option<LogContextEnricher>,
}

impl LoggerConfiguration {
    pub fn new() -> Self {
        Self {
            minimum_level: LogLevel::Verbose,
            enrichers: Vec::new(),
            filters: Vec::new(),
            sinks: Vec::new(),
            self_log: SelfLog::default(),
            metrics: Arc::new(LoggerMetrics::new()),
            log_context: None,
        }
    }

    #[must_use]
    pub fn minimum_level(mut self, level: LogLevel) -> Self {
        self.minimum_level = level;
        self
    }

    /// Enrichers run in the order they are added
    #[must_use]
    pub fn enrich_with<E: Enricher + 'static>(mut self, enricher: E) -> Self {
        self.enrichers.push(Box::new(enricher));
        self
    }

    /// Add properties pushed on `context` to every event
    ///
    /// The logger keeps a handle, see [`Logger::log_context`].
    #[must_use]
    pub fn enrich_from_log_context(mut self, context: LogContextEnricher) -> Self {
        self.log_context = Some(context.clone());
        self.enrich_with(context)
    }

    /// Events must pass every filter
    #[must_use]
    pub fn filter_with<F: Filter + 'static>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    #[must_use]
    pub fn write_to<S: Sink + 'static>(self, sink: S) -> Self {
        self.write_to_registration(SinkRegistration::new(sink))
    }

    /// Register a sink that only receives events at or above `level`
    #[must_use]
    pub fn write_to_restricted<S: Sink + 'static>(self, sink: S, level: LogLevel) -> Self {
        self.write_to_registration(SinkRegistration::new(sink).restricted_to(level))
    }

    #[must_use]
    pub fn write_to_registration(mut self, registration: SinkRegistration) -> Self {
        self.sinks.push(registration);
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

    pub fn self_log(&self) -> &SelfLog {
        &self.self_log
    }

    pub fn metrics(&self) -> Arc<LoggerMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn create_logger(self) -> Logger {
        Logger::new(self)
    }

    pub(crate) fn into_parts(self) -> PipelineParts {
        PipelineParts {
            minimum_level: self.minimum_level,
            enrichers: self.enrichers,
            filters: self.filters,
            sinks: self.sinks,
            self_log: self.self_log,
            metrics: self.metrics,
            log_context: self.log_context,
        }
    }
}

impl Default for LoggerConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarative logger settings
///
/// Field names bind in camelCase and PascalCase.
///
/// # Example
///
/// ```
/// use lite_logger::config::LoggerOptions;
///
/// let options = LoggerOptions::from_json(r#"{
///     "StdOut": true,
///     "FormatJson": false,
///     "LogMinLevel": "Information",
///     "SourceContextFilter": {
///         "MinLevel": "Warning",
///         "Rules": [{ "SourceContextName": "Shop.Orders", "LogLevel": "Error" }]
///     }
/// }"#).expect("valid options");
///
/// assert!(options.std_out);
/// assert_eq!(options.min_level.as_deref(), Some("Information"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerOptions {
    /// Write to the console
    #[serde(default, alias = "StdOut")]
    pub std_out: bool,

    /// Use the JSON formatter for console and file output
    #[serde(default, alias = "FormatJson")]
    pub format_json: bool,

    /// Drop events whose source context starts with `Microsoft`
    #[serde(default, alias = "SkipMicrosoftLog")]
    pub skip_microsoft_log: bool,

    /// Write to rolling files
    #[serde(default, alias = "RollingFile")]
    pub rolling_file: bool,

    /// Write console and file output from a background thread
    #[serde(default, alias = "Async", alias = "async")]
    pub async_mode: bool,

    /// Rolling file path; relative paths are rooted at the executable's directory
    #[serde(default, alias = "PathFormat")]
    pub path_format: Option<String>,

    #[serde(default, alias = "OutputTemplate")]
    pub output_template: Option<String>,

    /// Level name; unparsable values fall back to `Verbose`
    #[serde(default, alias = "MinLevel", alias = "LogMinLevel", alias = "logMinLevel")]
    pub min_level: Option<String>,

    /// Batched email sink, restricted to `Warning` and above
    #[serde(default, alias = "Email")]
    pub email: Option<EmailConfig>,

    #[serde(default, alias = "SourceContextFilter")]
    pub source_context_filter: Option<SourceContextFilterOptions>,
}

impl LoggerOptions {
    /// Parse options from JSON
    ///
    /// # Errors
    ///
    /// Returns `JsonError` for malformed input
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Minimum level: explicit setting, else the environment default when an
    /// environment is given, else `Verbose`
    pub fn resolve_min_level(&self, environment: Option<&str>) -> LogLevel {
        match self.min_level.as_deref().map(str::trim).filter(|level| !level.is_empty()) {
            Some(level) => level.parse().unwrap_or(LogLevel::Verbose),
            None => environment.map_or(LogLevel::Verbose, LogLevel::for_environment),
        }
    }

    /// Rolling file path, rooted at the executable's directory when relative
    pub fn resolve_path_format(&self) -> PathBuf {
        let base = base_directory();
        match self.path_format.as_deref().map(str::trim).filter(|path| !path.is_empty()) {
            Some(path) if Path::new(path).is_absolute() => PathBuf::from(path),
            Some(path) => base.join(path),
            None => base.join(DEFAULT_LOG_DIRECTORY).join(DEFAULT_PATH_FORMAT),
        }
    }

    pub fn resolve_output_template(&self) -> &str {
        self.output_template
            .as_deref()
            .filter(|template| !template.trim().is_empty())
            .unwrap_or(DEFAULT_OUTPUT_TEMPLATE)
    }

    /// Build a logger, see [`build_logger`]
    ///
    /// # Errors
    ///
    /// See [`build_logger`]
    pub fn build(&self, environment: Option<&str>) -> Result<Logger> {
        build_logger(self, environment)
    }
}

/// Directory of the running executable, falling back to the working directory
fn base_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Assemble a logger from options
///
/// Installs the `MachineName`, log-context and `Logger` enrichers, the
/// source-context filter and the Microsoft exclusion when configured, and
/// the console, rolling file and email sinks that are enabled. Console and
/// file sinks are moved behind an [`AsyncSink`] when `async_mode` is set.
///
/// # Errors
///
/// - `FileSinkError` / `IoOperation` when the log directory cannot be created
/// - `InvalidConfiguration` for a bad path format or unsupported SMTP settings
/// - `MissingArgument` when the email config lacks addresses
///
/// # Example
///
/// ```no_run
/// use lite_logger::config::{build_logger, LoggerOptions};
///
/// let options = LoggerOptions {
///     std_out: true,
///     rolling_file: true,
///     ..LoggerOptions::default()
/// };
/// let logger = build_logger(&options, Some("Production")).expect("valid options");
/// logger.for_context("Startup").information("Service started");
/// ```
pub fn build_logger(options: &LoggerOptions, environment: Option<&str>) -> Result<Logger> {
    let mut config = LoggerConfiguration::new()
        .minimum_level(options.resolve_min_level(environment))
        .enrich_with(MachineNameEnricher::new())
        .enrich_from_log_context(LogContextEnricher::new())
        .enrich_with(LoggerNameEnricher::new());

    if let Some(filter) = &options.source_context_filter {
        config = config.filter_with(SourceContextFilter::new(filter.clone()));
    }
    if options.skip_microsoft_log {
        config = config.filter_with(ExcludingFilter::microsoft());
    }

    let template = options.resolve_output_template();
    let mut local = Vec::new();

    if options.std_out {
        let console = if options.format_json {
            ConsoleSink::with_formatter(JsonFormatter::new())
        } else {
            ConsoleSink::with_template(template, true)
        };
        local.push(SinkRegistration::new(console));
    }

    if options.rolling_file {
        let file = RollingFileSink::new(options.resolve_path_format())?;
        let file = if options.format_json {
            file.with_formatter(JsonFormatter::new())
        } else {
            file.with_formatter(OutputTemplateFormatter::new(template))
        };
        local.push(SinkRegistration::new(file));
    }

    if options.async_mode && !local.is_empty() {
        let async_options =
            AsyncSinkOptions::default().with_diagnostics(config.self_log().clone(), config.metrics());
        config = config.write_to(AsyncSink::with_options(local, async_options));
    } else {
        for registration in local {
            config = config.write_to_registration(registration);
        }
    }

    if let Some(email) = &options.email {
        let sink = email_sink(email, template, &config)?;
        config = config.write_to_restricted(sink, LogLevel::Warning);
    }

    Ok(config.create_logger())
}

fn email_sink(email: &EmailConfig, template: &str, config: &LoggerConfiguration) -> Result<EmailSink> {
    email.validate()?;
    let transport = SmtpTransport::from_config(email)?;
    let emitter = EmailBatchEmitter::new(email, transport)?
        .with_body_formatter(OutputTemplateFormatter::new(template));
    let options = EmailSinkOptions::default()
        .with_self_log(config.self_log().clone())
        .with_metrics(config.metrics());
    Ok(EmailSink::from_emitter(emitter, options))
}

impl std::str::FromStr for LoggerOptions {
    type Err = LoggerError;

    fn from_str(json: &str) -> Result<Self> {
        Self::from_json(json)
    }
}
