//! Fixed-value enricher

use super::Enricher;
use crate::core::{LogEvent, PropertyValue};

/// Adds the same property to every event
#[derive(Debug, Clone)]
pub struct PropertyEnricher {
    name: String,
    value: PropertyValue,
}

impl PropertyEnricher {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Enricher for PropertyEnricher {
    fn enrich(&self, event: &mut LogEvent) {
        event.add_property_if_absent(self.name.as_str(), self.value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    #[test]
    fn test_does_not_overwrite() {
        let enricher = PropertyEnricher::new("Application", "orders");
        let mut event = LogEvent::new(LogLevel::Debug, "x").with_property("Application", "billing");
        enricher.enrich(&mut event);
        assert_eq!(
            event.properties().get("Application").and_then(|v| v.as_str()),
            Some("billing")
        );
    }
}
