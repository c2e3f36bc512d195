//! Core logger types and traits

pub mod error;
pub mod log_event;
pub mod log_level;
pub mod logger;
pub mod message_template;
pub mod metrics;
pub mod overflow_policy;
pub mod property;
pub mod self_log;
pub mod timestamp;

pub use error::{LoggerError, Result};
pub use log_event::{ExceptionInfo, LogEvent, SOURCE_CONTEXT_PROPERTY};
pub use log_level::LogLevel;
pub use logger::{Logger, DEFAULT_SHUTDOWN_TIMEOUT};
pub use message_template::{Destructuring, MessageTemplate, TemplateToken};
pub use metrics::{LoggerMetrics, MetricsSnapshot};
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use property::{Properties, PropertyValue, ScalarValue};
pub use self_log::SelfLog;
pub use timestamp::{TimestampFormat, DEFAULT_TIMESTAMP_PATTERN};
