//! `Logger` property derived from the source context

use super::Enricher;
use crate::core::LogEvent;

/// Name of the property added by [`LoggerNameEnricher`]
pub const LOGGER_PROPERTY: &str = "Logger";

/// Value used when an event carries no string `SourceContext`
pub const DEFAULT_LOGGER_NAME: &str = "Default";

/// Copies `SourceContext` into `Logger`, or `"Default"` when it is absent
/// or not a string
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerNameEnricher;

impl LoggerNameEnricher {
    pub fn new() -> Self {
        Self
    }
}

impl Enricher for LoggerNameEnricher {
    fn enrich(&self, event: &mut LogEvent) {
        let name = event
            .source_context()
            .unwrap_or(DEFAULT_LOGGER_NAME)
            .to_string();
        event.add_property_if_absent(LOGGER_PROPERTY, name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, SOURCE_CONTEXT_PROPERTY};

    fn logger_of(event: &LogEvent) -> Option<&str> {
        event.properties().get(LOGGER_PROPERTY).and_then(|v| v.as_str())
    }

    #[test]
    fn test_copies_source_context() {
        let mut event = LogEvent::new(LogLevel::Information, "x")
            .with_property(SOURCE_CONTEXT_PROPERTY, "Orders.Api");
        LoggerNameEnricher.enrich(&mut event);
        assert_eq!(logger_of(&event), Some("Orders.Api"));
    }

    #[test]
    fn test_defaults_without_string_context() {
        let mut bare = LogEvent::new(LogLevel::Information, "x");
        LoggerNameEnricher.enrich(&mut bare);
        assert_eq!(logger_of(&bare), Some(DEFAULT_LOGGER_NAME));

        let mut numeric = LogEvent::new(LogLevel::Information, "x").with_property(SOURCE_CONTEXT_PROPERTY, 3);
        LoggerNameEnricher.enrich(&mut numeric);
        assert_eq!(logger_of(&numeric), Some(DEFAULT_LOGGER_NAME));
    }

    #[test]
    fn test_existing_logger_property_is_kept() {
        let mut event = LogEvent::new(LogLevel::Information, "x")
            .with_property(LOGGER_PROPERTY, "Explicit")
            .with_property(SOURCE_CONTEXT_PROPERTY, "Orders.Api");
        LoggerNameEnricher.enrich(&mut event);
        assert_eq!(logger_of(&event), Some("Explicit"));
    }
}
