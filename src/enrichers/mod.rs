//! Enrichers add properties to an event before it is filtered
//!
//! Enrichers only ever add properties that are absent; a property set at the
//! call site always wins.

pub mod log_context;
pub mod logger_name;
pub mod machine_name;
pub mod property;

pub use log_context::{ContextGuard, LogContextEnricher};
pub use logger_name::{LoggerNameEnricher, DEFAULT_LOGGER_NAME, LOGGER_PROPERTY};
pub use machine_name::{MachineNameEnricher, MACHINE_NAME_PROPERTY};
pub use property::PropertyEnricher;

use crate::core::LogEvent;

pub trait Enricher: Send + Sync {
    fn enrich(&self, event: &mut LogEvent);
}

impl<F> Enricher for F
where
    F: Fn(&mut LogEvent) + Send + Sync,
{
    fn enrich(&self, event: &mut LogEvent) {
        self(event)
    }
}
