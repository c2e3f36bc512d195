//! Log event structure

use super::log_level::LogLevel;
use super::message_template::MessageTemplate;
use super::property::{Properties, PropertyValue};
use chrono::{DateTime, Local};
use std::fmt;

/// Property holding the name of the subsystem that produced an event
pub const SOURCE_CONTEXT_PROPERTY: &str = "SourceContext";

/// Error information attached to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    pub message: String,
    pub stack_trace: Option<String>,
}

impl ExceptionInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: None,
        }
    }

    #[must_use]
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    /// Capture an error and its chain of sources
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(format!("  caused by: {}", cause));
            source = cause.source();
        }

        Self {
            message: error.to_string(),
            stack_trace: (!causes.is_empty()).then(|| causes.join("\n")),
        }
    }
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stack_trace {
            Some(trace) => write!(f, "{}\n{}", self.message, trace),
            None => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    timestamp: DateTime<Local>,
    level: LogLevel,
    message_template: MessageTemplate,
    properties: Properties,
    exception: Option<ExceptionInfo>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message_template: impl Into<MessageTemplate>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message_template: message_template.into(),
            properties: Properties::new(),
            exception: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.add_or_update(name, value);
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        for (name, value) in properties.iter() {
            self.properties.add_or_update(name, value.clone());
        }
        self
    }

    #[must_use]
    pub fn with_exception(mut self, exception: ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message_template(&self) -> &MessageTemplate {
        &self.message_template
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }

    /// Add a property unless it is already present
    pub fn add_property_if_absent(
        &mut self,
        name: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> bool {
        self.properties.add_if_absent(name, value)
    }

    pub fn add_or_update_property(&mut self, name: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.add_or_update(name, value);
    }

    /// The `SourceContext` property, when present as a string
    pub fn source_context(&self) -> Option<&str> {
        self.properties
            .get(SOURCE_CONTEXT_PROPERTY)
            .and_then(PropertyValue::as_str)
    }

    /// Render the message template against the event's properties
    pub fn render_message(&self) -> String {
        self.message_template.render(&self.properties)
    }
}
