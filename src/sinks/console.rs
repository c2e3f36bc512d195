//! Console sink

use super::Sink;
use crate::core::{LogEvent, LogLevel, Result};
use crate::formatting::{OutputTemplateFormatter, TextFormatter};
use std::io::Write;

/// Writes formatted events to stdout, or stderr from a configured level
///
/// # Example
///
/// ```
/// use lite_logger::sinks::ConsoleSink;
/// use lite_logger::formatting::JsonFormatter;
/// use lite_logger::core::LogLevel;
///
/// let sink = ConsoleSink::new()
///     .with_std_error_from_level(LogLevel::Error);
/// let json = ConsoleSink::with_formatter(JsonFormatter::new());
/// ```
pub struct ConsoleSink {
    formatter: Box<dyn TextFormatter>,
    std_error_from_level: Option<LogLevel>,
    buffer: String,
}

impl ConsoleSink {
    /// Default output template with the level-coloured theme
    pub fn new() -> Self {
        Self::with_formatter(OutputTemplateFormatter::default().with_colors(true))
    }

    /// Output template without colours
    pub fn plain() -> Self {
        Self::with_formatter(OutputTemplateFormatter::default())
    }

    pub fn with_template(template: &str, colors: bool) -> Self {
        Self::with_formatter(OutputTemplateFormatter::new(template).with_colors(colors))
    }

    pub fn with_formatter<F: TextFormatter + 'static>(formatter: F) -> Self {
        Self {
            formatter: Box::new(formatter),
            std_error_from_level: None,
            buffer: String::with_capacity(256),
        }
    }

    /// Route events at or above `level` to stderr
    #[must_use]
    pub fn with_std_error_from_level(mut self, level: LogLevel) -> Self {
        self.std_error_from_level = Some(level);
        self
    }

    fn use_stderr(&self, level: LogLevel) -> bool {
        self.std_error_from_level.is_some_and(|from| level >= from)
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn emit(&mut self, event: &LogEvent) -> Result<()> {
        self.buffer.clear();
        self.formatter.format(event, &mut self.buffer);

        if self.use_stderr(event.level()) {
            std::io::stderr().lock().write_all(self.buffer.as_bytes())?;
        } else {
            std::io::stdout().lock().write_all(self.buffer.as_bytes())?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
