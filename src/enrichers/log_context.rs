//! Ambient properties pushed for the duration of a scope
//!
//! This module provides:
//! - `LogContextEnricher`: a shared, thread-safe stack of pushed properties
//! - `ContextGuard`: RAII guard that pops its property when dropped

use super::Enricher;
use crate::core::{LogEvent, PropertyValue};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Entry {
    id: u64,
    name: String,
    value: PropertyValue,
}

#[derive(Debug, Default)]
struct Stack {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

/// Properties pushed here are added to every event enriched while they are
/// in scope
///
/// Cloning yields another handle to the same stack. When the same name is
/// pushed more than once, the most recent push wins.
///
/// # Example
///
/// ```
/// use lite_logger::enrichers::{Enricher, LogContextEnricher};
/// use lite_logger::core::{LogEvent, LogLevel};
///
/// let context = LogContextEnricher::new();
/// {
///     let _guard = context.push("RequestId", "abc-123");
///     let mut event = LogEvent::new(LogLevel::Information, "Processing request");
///     context.enrich(&mut event);
///     assert!(event.properties().contains("RequestId"));
/// }
/// assert!(context.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogContextEnricher {
    stack: Arc<Stack>,
}

impl LogContextEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a property; it is removed again when the guard drops
    #[must_use = "the property is removed as soon as the guard is dropped"]
    pub fn push(&self, name: impl Into<String>, value: impl Into<PropertyValue>) -> ContextGuard {
        let id = self.stack.next_id.fetch_add(1, Ordering::Relaxed);
        self.stack.entries.write().push(Entry {
            id,
            name: name.into(),
            value: value.into(),
        });
        ContextGuard {
            stack: Arc::clone(&self.stack),
            id,
        }
    }

    pub fn len(&self) -> usize {
        self.stack.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.entries.read().is_empty()
    }
}

impl Enricher for LogContextEnricher {
    fn enrich(&self, event: &mut LogEvent) {
        let entries = self.stack.entries.read();
        for entry in entries.iter().rev() {
            event.add_property_if_absent(entry.name.as_str(), entry.value.clone());
        }
    }
}

/// RAII guard for a pushed context property
pub struct ContextGuard {
    stack: Arc<Stack>,
    id: u64,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let mut entries = self.stack.entries.write();
        if let Some(pos) = entries.iter().rposition(|entry| entry.id == self.id) {
            entries.remove(pos);
        }
    }
}

impl fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextGuard").field("id", &self.id).finish()
    }
}
