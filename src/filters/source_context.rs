//! Per-subsystem overrides keyed on the `SourceContext` property
//!
//! Rules are matched by case-sensitive prefix. Thresholds are inclusive: an
//! event *at* `min_level` (or at a rule's `log_level`) is suppressed, not only
//! events below it. Existing configurations depend on this, so it must not be
//! tightened to a strict comparison.

use super::Filter;
use crate::core::{LogEvent, LogLevel};
use serde::{Deserialize, Serialize};

/// One override rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContextFilterRule {
    /// Events at or below this level are suppressed for matching contexts
    #[serde(default, alias = "LogLevel")]
    pub log_level: Option<LogLevel>,

    /// Prefix matched against the event's source context
    #[serde(alias = "SourceContextName")]
    pub source_context_name: String,
}

impl SourceContextFilterRule {
    pub fn new(source_context_name: impl Into<String>) -> Self {
        Self {
            log_level: None,
            source_context_name: source_context_name.into(),
        }
    }

    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceContextFilterOptions {
    /// Baseline: matching events at or below this level are always suppressed
    #[serde(default, alias = "MinLevel")]
    pub min_level: LogLevel,

    #[serde(default, alias = "Rules")]
    pub rules: Vec<SourceContextFilterRule>,
}

impl SourceContextFilterOptions {
    pub fn new(min_level: LogLevel) -> Self {
        Self {
            min_level,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: SourceContextFilterRule) -> Self {
        self.rules.push(rule);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SourceContextFilter {
    options: SourceContextFilterOptions,
}

impl SourceContextFilter {
    pub fn new(options: SourceContextFilterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SourceContextFilterOptions {
        &self.options
    }
}

impl Filter for SourceContextFilter {
    fn is_enabled(&self, event: &LogEvent) -> bool {
        if self.options.rules.is_empty() {
            return true;
        }

        let Some(source_context) = event.source_context() else {
            return true;
        };

        let level = event.level();
        for rule in &self.options.rules {
            if !source_context.starts_with(rule.source_context_name.as_str()) {
                continue;
            }

            if level <= self.options.min_level {
                return false;
            }

            if rule.log_level.is_some_and(|rule_level| level <= rule_level) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SOURCE_CONTEXT_PROPERTY;

    fn event(level: LogLevel, source_context: &str) -> LogEvent {
        LogEvent::new(level, "test").with_property(SOURCE_CONTEXT_PROPERTY, source_context)
    }

    #[test]
    fn test_empty_rules_allow_everything() {
        let filter = SourceContextFilter::new(SourceContextFilterOptions::new(LogLevel::Fatal));
        for level in LogLevel::ALL {
            assert!(filter.is_enabled(&event(level, "Microsoft.AspNetCore")));
        }
    }

    #[test]
    fn test_baseline_suppression_is_inclusive() {
        let filter = SourceContextFilter::new(
            SourceContextFilterOptions::new(LogLevel::Warning)
                .with_rule(SourceContextFilterRule::new("Microsoft")),
        );

        assert!(!filter.is_enabled(&event(LogLevel::Information, "Microsoft.Hosting")));
        assert!(!filter.is_enabled(&event(LogLevel::Warning, "Microsoft.Hosting")));
        assert!(filter.is_enabled(&event(LogLevel::Error, "Microsoft.Hosting")));
        assert!(filter.is_enabled(&event(LogLevel::Verbose, "MyApp.Service")));
    }

    #[test]
    fn test_rule_level_suppression_is_inclusive() {
        let filter = SourceContextFilter::new(
            SourceContextFilterOptions::new(LogLevel::Verbose).with_rule(
                SourceContextFilterRule::new("System.Net").with_log_level(LogLevel::Warning),
            ),
        );

        assert!(!filter.is_enabled(&event(LogLevel::Warning, "System.Net.Http")));
        assert!(filter.is_enabled(&event(LogLevel::Error, "System.Net.Http")));
        assert!(!filter.is_enabled(&event(LogLevel::Verbose, "System.Net")));
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let filter = SourceContextFilter::new(
            SourceContextFilterOptions::new(LogLevel::Fatal)
                .with_rule(SourceContextFilterRule::new("Microsoft")),
        );
        assert!(filter.is_enabled(&event(LogLevel::Debug, "microsoft.hosting")));
    }

    #[test]
    fn test_missing_or_non_string_context_is_allowed() {
        let filter = SourceContextFilter::new(
            SourceContextFilterOptions::new(LogLevel::Fatal)
                .with_rule(SourceContextFilterRule::new("")),
        );
        assert!(filter.is_enabled(&LogEvent::new(LogLevel::Verbose, "no context")));

        let numeric = LogEvent::new(LogLevel::Verbose, "x").with_property(SOURCE_CONTEXT_PROPERTY, 7);
        assert!(filter.is_enabled(&numeric));
    }

    #[test]
    fn test_later_rule_can_suppress() {
        let filter = SourceContextFilter::new(
            SourceContextFilterOptions::new(LogLevel::Verbose)
                .with_rule(SourceContextFilterRule::new("App"))
                .with_rule(SourceContextFilterRule::new("App.Db").with_log_level(LogLevel::Information)),
        );
        assert!(filter.is_enabled(&event(LogLevel::Debug, "App.Web")));
        assert!(!filter.is_enabled(&event(LogLevel::Debug, "App.Db.Pool")));
    }

    #[test]
    fn test_deserialize_options() {
        let json = r#"{"minLevel":"Warning","rules":[{"sourceContextName":"Microsoft"},{"logLevel":"Error","sourceContextName":"System"}]}"#;
        let options: SourceContextFilterOptions = serde_json::from_str(json).expect("valid options");
        assert_eq!(options.min_level, LogLevel::Warning);
        assert_eq!(options.rules.len(), 2);
        assert_eq!(options.rules[1].log_level, Some(LogLevel::Error));
    }
}
