//! Global minimum-level gate

use super::Filter;
use crate::core::{LogEvent, LogLevel};

/// Suppresses events below a minimum level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LevelFilter {
    minimum: LogLevel,
}

impl LevelFilter {
    pub fn new(minimum: LogLevel) -> Self {
        Self { minimum }
    }

    /// Minimum level for a hosting environment, see [`LogLevel::for_environment`]
    pub fn for_environment(environment: &str) -> Self {
        Self::new(LogLevel::for_environment(environment))
    }

    pub fn minimum(&self) -> LogLevel {
        self.minimum
    }

    #[inline]
    pub fn allows(&self, level: LogLevel) -> bool {
        level >= self.minimum
    }
}

impl Filter for LevelFilter {
    fn is_enabled(&self, event: &LogEvent) -> bool {
        self.allows(event.level())
    }
}
