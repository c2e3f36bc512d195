//! Human-readable output templates
//!
//! An output template uses the message-template syntax with a few
//! well-known names:
//!
//! | Token | Rendering |
//! |---|---|
//! | `{Timestamp:fmt}` | event time, `fmt` is a .NET-style date pattern |
//! | `{Level}` | `Information`; `:w` lowercase, `:u` uppercase, `:u3`/`:w3` three letters |
//! | `{Message}` | rendered message; `:l`/`:lj` leaves strings unquoted |
//! | `{Exception}` | exception text followed by a newline, or nothing |
//! | `{NewLine}` | `\n` |
//! | `{Properties}` | properties not used by the message or the template |
//!
//! Any other name renders that property (strings unquoted), or nothing when
//! the event lacks it.

use super::TextFormatter;
use crate::core::{
    LogEvent, LogLevel, MessageTemplate, PropertyValue, TemplateToken, TimestampFormat,
    DEFAULT_TIMESTAMP_PATTERN,
};
use std::collections::HashSet;

pub const DEFAULT_OUTPUT_TEMPLATE: &str =
    "{Timestamp:yyyy-MM-dd HH:mm:ss.fff} {Level:w} {SourceContext} {Message}{NewLine}{Exception}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelCase {
    Full,
    Lower,
    Upper,
    Short,
    ShortLower,
}

impl LevelCase {
    fn from_format(format: Option<&str>) -> Self {
        match format {
            Some("w") => LevelCase::Lower,
            Some("u") => LevelCase::Upper,
            Some("u3") => LevelCase::Short,
            Some("w3") => LevelCase::ShortLower,
            _ => LevelCase::Full,
        }
    }

    fn apply(self, level: LogLevel) -> String {
        match self {
            LevelCase::Full => level.to_str().to_string(),
            LevelCase::Lower => level.to_str().to_lowercase(),
            LevelCase::Upper => level.to_str().to_uppercase(),
            LevelCase::Short => level.short_name().to_string(),
            LevelCase::ShortLower => level.short_name().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone)]
enum OutputToken {
    Text(String),
    Timestamp(TimestampFormat),
    Level(LevelCase),
    Message { literal: bool },
    Exception,
    NewLine,
    Properties,
    Property { name: String, format: Option<String> },
}

/// Formatter driven by an output template
///
/// # Example
///
/// ```
/// use lite_logger::formatting::{OutputTemplateFormatter, TextFormatter};
/// use lite_logger::core::{LogEvent, LogLevel};
///
/// let formatter = OutputTemplateFormatter::new("[{Level:u3}] {Message:lj}");
/// let event = LogEvent::new(LogLevel::Warning, "Disk {Drive} low").with_property("Drive", "C");
/// assert_eq!(formatter.format_to_string(&event), "[WRN] Disk C low");
/// ```
#[derive(Debug, Clone)]
pub struct OutputTemplateFormatter {
    template: String,
    tokens: Vec<OutputToken>,
    /// Property names the template renders by name
    named: HashSet<String>,
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    colored: bool,
}

impl OutputTemplateFormatter {
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let parsed = MessageTemplate::parse(template.as_str());
        let mut named = HashSet::new();

        let tokens = parsed
            .tokens()
            .iter()
            .map(|token| match token {
                TemplateToken::Text(text) => OutputToken::Text(text.clone()),
                TemplateToken::Property { name, format, .. } => {
                    let format = format.as_deref();
                    match name.as_str() {
                        "Timestamp" => OutputToken::Timestamp(TimestampFormat::from_pattern(
                            format.unwrap_or(DEFAULT_TIMESTAMP_PATTERN),
                        )),
                        "Level" => OutputToken::Level(LevelCase::from_format(format)),
                        "Message" => OutputToken::Message {
                            literal: format.is_some_and(|f| f.contains('l')),
                        },
                        "Exception" => OutputToken::Exception,
                        "NewLine" => OutputToken::NewLine,
                        "Properties" => OutputToken::Properties,
                        other => {
                            named.insert(other.to_string());
                            OutputToken::Property {
                                name: other.to_string(),
                                format: format.map(str::to_string),
                            }
                        }
                    }
                }
            })
            .collect();

        Self {
            template,
            tokens,
            named,
            colored: false,
        }
    }

    /// Colour the level token by severity (console theme)
    #[must_use]
    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn push_level(&self, level: LogLevel, case: LevelCase, output: &mut String) {
        let text = case.apply(level);
        #[cfg(feature = "console")]
        {
            if self.colored {
                use colored::Colorize;
                output.push_str(&text.as_str().color(level.color()).to_string());
                return;
            }
        }
        output.push_str(&text);
    }

    fn push_properties(&self, event: &LogEvent, output: &mut String) {
        let template = event.message_template();
        let remaining: Vec<(String, PropertyValue)> = event
            .properties()
            .iter()
            .filter(|(name, _)| !template.has_property(name) && !self.named.contains(*name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        if remaining.is_empty() {
            output.push_str("{}");
            return;
        }

        PropertyValue::Structure {
            type_tag: None,
            properties: remaining,
        }
        .render(None, output);
    }
}

impl Default for OutputTemplateFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_TEMPLATE)
    }
}

impl TextFormatter for OutputTemplateFormatter {
    fn format(&self, event: &LogEvent, output: &mut String) {
        for token in &self.tokens {
            match token {
                OutputToken::Text(text) => output.push_str(text),
                OutputToken::Timestamp(format) => output.push_str(&format.format(event.timestamp())),
                OutputToken::Level(case) => self.push_level(event.level(), *case, output),
                OutputToken::Message { literal } => event.message_template().render_into(
                    event.properties(),
                    literal.then_some("l"),
                    output,
                ),
                OutputToken::Exception => {
                    if let Some(exception) = event.exception() {
                        output.push_str(&exception.to_string());
                        output.push('\n');
                    }
                }
                OutputToken::NewLine => output.push('\n'),
                OutputToken::Properties => self.push_properties(event, output),
                OutputToken::Property { name, format } => {
                    if let Some(value) = event.properties().get(name) {
                        match value.as_str() {
                            Some(text) => output.push_str(text),
                            None => value.render(format.as_deref(), output),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExceptionInfo, SOURCE_CONTEXT_PROPERTY};
    use chrono::{Local, TimeZone};

    fn fixed(event: LogEvent) -> LogEvent {
        let time = Local
            .with_ymd_and_hms(2025, 3, 1, 8, 5, 9)
            .single()
            .expect("unambiguous local time")
            + chrono::Duration::milliseconds(42);
        event.with_timestamp(time)
    }

    #[test]
    fn test_default_template() {
        let event = fixed(
            LogEvent::new(LogLevel::Information, "Order {Id} placed")
                .with_property("Id", 17)
                .with_property(SOURCE_CONTEXT_PROPERTY, "Shop.Orders"),
        );
        let line = OutputTemplateFormatter::default().format_to_string(&event);
        assert_eq!(line, "2025-03-01 08:05:09.042 information Shop.Orders Order 17 placed\n");
    }

    #[test]
    fn test_exception_follows_newline() {
        let event = fixed(
            LogEvent::new(LogLevel::Error, "Boom").with_exception(ExceptionInfo::new("stack overflow")),
        );
        let line = OutputTemplateFormatter::new("{Message}{NewLine}{Exception}").format_to_string(&event);
        assert_eq!(line, "Boom\nstack overflow\n");
    }

    #[test]
    fn test_level_formats() {
        let event = LogEvent::new(LogLevel::Warning, "x");
        let render = |template: &str| OutputTemplateFormatter::new(template).format_to_string(&event);
        assert_eq!(render("{Level}"), "Warning");
        assert_eq!(render("{Level:u}"), "WARNING");
        assert_eq!(render("{Level:u3}"), "WRN");
        assert_eq!(render("{Level:w3}"), "wrn");
    }

    #[test]
    fn test_message_quoting() {
        let event = LogEvent::new(LogLevel::Information, "User {Name}").with_property("Name", "ann");
        let quoted = OutputTemplateFormatter::new("{Message}").format_to_string(&event);
        let literal = OutputTemplateFormatter::new("{Message:lj}").format_to_string(&event);
        assert_eq!(quoted, "User \"ann\"");
        assert_eq!(literal, "User ann");
    }

    #[test]
    fn test_properties_token_skips_used_properties() {
        let event = LogEvent::new(LogLevel::Information, "Hit {Path}")
            .with_property("Path", "/home")
            .with_property("Status", 200)
            .with_property(SOURCE_CONTEXT_PROPERTY, "Web");
        let line = OutputTemplateFormatter::new("{SourceContext} {Properties}").format_to_string(&event);
        assert_eq!(line, "Web { Status: 200 }");
    }

    #[test]
    fn test_missing_property_renders_nothing() {
        let event = LogEvent::new(LogLevel::Information, "x");
        let line = OutputTemplateFormatter::new("[{SourceContext}] {Message}").format_to_string(&event);
        assert_eq!(line, "[] x");
    }
}
