//! Text formatters used by sinks
//!
//! Every sink owns its formatter. Two are provided:
//! - `JsonFormatter`: one compact JSON object per event
//! - `OutputTemplateFormatter`: a human-readable line described by a template

pub mod json;
pub mod output_template;

pub use json::JsonFormatter;
pub use output_template::{OutputTemplateFormatter, DEFAULT_OUTPUT_TEMPLATE};

use crate::core::LogEvent;
use std::sync::Arc;

pub trait TextFormatter: Send + Sync {
    /// Append the rendering of `event` to `output`
    fn format(&self, event: &LogEvent, output: &mut String);

    /// Convenience wrapper returning a new string
    fn format_to_string(&self, event: &LogEvent) -> String {
        let mut output = String::new();
        self.format(event, &mut output);
        output
    }
}

impl<T: TextFormatter + ?Sized> TextFormatter for Box<T> {
    fn format(&self, event: &LogEvent, output: &mut String) {
        (**self).format(event, output)
    }
}

impl<T: TextFormatter + ?Sized> TextFormatter for Arc<T> {
    fn format(&self, event: &LogEvent, output: &mut String) {
        (**self).format(event, output)
    }
}
