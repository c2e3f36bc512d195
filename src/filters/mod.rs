//! Event filters
//!
//! A filter sees every event that passed the global level gate. All filters
//! must allow an event for it to reach the sinks.

pub mod exclusion;
pub mod level;
pub mod source_context;

pub use exclusion::ExcludingFilter;
pub use level::LevelFilter;
pub use source_context::{SourceContextFilter, SourceContextFilterOptions, SourceContextFilterRule};

use crate::core::LogEvent;

pub trait Filter: Send + Sync {
    /// `true` when the event may be emitted
    fn is_enabled(&self, event: &LogEvent) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&LogEvent) -> bool + Send + Sync,
{
    fn is_enabled(&self, event: &LogEvent) -> bool {
        self(event)
    }
}
