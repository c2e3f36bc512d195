//! Compact JSON formatter
//!
//! Shape of a formatted event (one line, newline-terminated):
//!
//! ```text
//! {"AppTime":"2025-01-08 10:30:45,123","Message":"...","Level":"info","Exception":"...","Logger":"..."}
//! ```
//!
//! `Exception` appears only when the event carries one. Properties consumed
//! by the message template are not repeated after `Level`.

use super::TextFormatter;
use crate::core::{LogEvent, PropertyValue, ScalarValue, TimestampFormat};

/// Pattern of the `AppTime` member
pub const APP_TIME_PATTERN: &str = "yyyy-MM-dd HH:mm:ss,fff";

/// Member naming the type of a tagged structure
pub const TYPE_TAG_MEMBER: &str = "$type";

#[derive(Debug, Clone)]
pub struct JsonFormatter {
    app_time: TimestampFormat,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            app_time: TimestampFormat::from_pattern(APP_TIME_PATTERN),
        }
    }

    /// Write the event object without the trailing newline
    pub fn format_event(&self, event: &LogEvent, output: &mut String) {
        output.push_str("{\"AppTime\":\"");
        output.push_str(&self.app_time.format(event.timestamp()));
        output.push_str("\",\"Message\":");
        write_quoted(&event.render_message(), output);

        output.push_str(",\"Level\":\"");
        output.push_str(event.level().json_name());
        output.push('"');

        if let Some(exception) = event.exception() {
            output.push_str(",\"Exception\":");
            write_quoted(&exception.to_string(), output);
        }

        let template = event.message_template();
        for (name, value) in event.properties().iter() {
            if template.has_property(name) {
                continue;
            }

            output.push(',');
            if name.starts_with('@') {
                let escaped = format!("@{}", name);
                write_quoted(&escaped, output);
            } else {
                write_quoted(name, output);
            }
            output.push(':');
            write_value(value, output);
        }

        output.push('}');
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl TextFormatter for JsonFormatter {
    fn format(&self, event: &LogEvent, output: &mut String) {
        self.format_event(event, output);
        output.push('\n');
    }
}

fn write_quoted(text: &str, output: &mut String) {
    output.push_str(&serde_json::Value::from(text).to_string());
}

fn write_value(value: &PropertyValue, output: &mut String) {
    match value {
        PropertyValue::Scalar(scalar) => write_scalar(scalar, output),
        PropertyValue::Sequence(items) => {
            output.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    output.push(',');
                }
                write_value(item, output);
            }
            output.push(']');
        }
        PropertyValue::Structure {
            type_tag,
            properties,
        } => {
            output.push('{');
            let mut first = true;
            if let Some(tag) = type_tag {
                write_quoted(TYPE_TAG_MEMBER, output);
                output.push(':');
                write_quoted(tag, output);
                first = false;
            }
            for (name, member) in properties {
                if !first {
                    output.push(',');
                }
                first = false;
                write_quoted(name, output);
                output.push(':');
                write_value(member, output);
            }
            output.push('}');
        }
    }
}

fn write_scalar(scalar: &ScalarValue, output: &mut String) {
    match scalar {
        ScalarValue::Null => output.push_str("null"),
        ScalarValue::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        ScalarValue::Int(i) => output.push_str(&i.to_string()),
        ScalarValue::UInt(u) => output.push_str(&u.to_string()),
        ScalarValue::Float(f) => match serde_json::Number::from_f64(*f) {
            Some(number) => output.push_str(&number.to_string()),
            None => output.push_str("null"),
        },
        ScalarValue::String(s) => write_quoted(s, output),
    }
}
