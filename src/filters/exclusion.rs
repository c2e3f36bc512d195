//! Exclusion filter

use super::Filter;
use crate::core::LogEvent;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&LogEvent) -> bool + Send + Sync>;

/// Suppresses every event matching a predicate
///
/// # Example
///
/// ```
/// use lite_logger::filters::{ExcludingFilter, Filter};
/// use lite_logger::core::{LogEvent, LogLevel};
///
/// let filter = ExcludingFilter::microsoft();
/// let event = LogEvent::new(LogLevel::Error, "boom")
///     .with_property("SourceContext", "Microsoft.AspNetCore.Hosting");
/// assert!(!filter.is_enabled(&event));
/// ```
#[derive(Clone)]
pub struct ExcludingFilter {
    description: String,
    predicate: Predicate,
}

impl ExcludingFilter {
    /// Exclude events whose source context starts with `prefix`
    pub fn source_context_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let description = format!("SourceContext starts with '{}'", prefix);
        Self {
            description,
            predicate: Arc::new(move |event: &LogEvent| {
                event
                    .source_context()
                    .is_some_and(|ctx| ctx.starts_with(prefix.as_str()))
            }),
        }
    }

    /// Exclude framework events from the `Microsoft` namespace
    pub fn microsoft() -> Self {
        Self::source_context_prefix("Microsoft")
    }

    /// Exclude events for which `predicate` returns true
    pub fn by<F>(predicate: F) -> Self
    where
        F: Fn(&LogEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            description: "custom predicate".to_string(),
            predicate: Arc::new(predicate),
        }
    }
}

impl Filter for ExcludingFilter {
    fn is_enabled(&self, event: &LogEvent) -> bool {
        !(self.predicate)(event)
    }
}

impl fmt::Debug for ExcludingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludingFilter")
            .field("description", &self.description)
            .finish()
    }
}
