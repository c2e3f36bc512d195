//! # lite_logger
//!
//! Structured logging with per-subsystem filtering and console, rolling file
//! and batched email output.
//!
//! An event is created from a message template and named properties, enriched
//! (`MachineName`, `Logger`, ambient log-context properties), checked against
//! the global minimum level and the source-context rules, and then fanned out
//! to every sink whose own minimum level it meets.
//!
//! ## Features
//!
//! - **Message templates**: `"Order {OrderId} shipped"` keeps `OrderId` as a
//!   structured property
//! - **Source-context rules**: raise the threshold for noisy subsystems
//! - **Sinks**: console, rolling file, batched email, and a background wrapper
//! - **Isolation**: a failing sink never reaches the call site; failures go to
//!   the self-log and the metrics
//!
//! ```
//! use lite_logger::prelude::*;
//! use lite_logger::info;
//!
//! let logger = LoggerConfiguration::new()
//!     .minimum_level(LogLevel::Information)
//!     .enrich_with(LoggerNameEnricher::new())
//!     .write_to(ConsoleSink::plain())
//!     .create_logger();
//!
//! let orders = logger.for_context("Shop.Orders");
//! info!(orders, "Order {OrderId} shipped to {City}", OrderId = 1042, City = "Oslo");
//! ```

pub mod config;
pub mod core;
pub mod enrichers;
pub mod filters;
pub mod formatting;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{build_logger, LoggerConfiguration, LoggerOptions};
    pub use crate::core::{
        ExceptionInfo, LogEvent, LogLevel, Logger, LoggerError, LoggerMetrics, OverflowPolicy,
        Properties, PropertyValue, Result, SelfLog, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::enrichers::{
        Enricher, LogContextEnricher, LoggerNameEnricher, MachineNameEnricher, PropertyEnricher,
    };
    pub use crate::filters::{
        ExcludingFilter, Filter, SourceContextFilter, SourceContextFilterOptions,
        SourceContextFilterRule,
    };
    pub use crate::formatting::{JsonFormatter, OutputTemplateFormatter, TextFormatter};
    pub use crate::sinks::{
        AsyncSink, ConsoleSink, EmailConfig, EmailSink, RollingFileSink, Sink, SinkRegistration,
    };
}

pub use config::{build_logger, LoggerConfiguration, LoggerOptions};
pub use core::{
    LogEvent, LogLevel, Logger, LoggerError, LoggerMetrics, MetricsSnapshot, OverflowCallback,
    OverflowPolicy, Properties, PropertyValue, Result, SelfLog, DEFAULT_SHUTDOWN_TIMEOUT,
};
