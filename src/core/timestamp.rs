//! Timestamp formatting utilities
//!
//! Output templates and the JSON formatter describe timestamps with
//! .NET-style date patterns (`yyyy-MM-dd HH:mm:ss.fff`). `TimestampFormat`
//! translates such patterns to chrono's strftime syntax once, at setup.

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Pattern used by the default output template
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "yyyy-MM-dd HH:mm:ss.fff";

/// Stands in for a fraction width strftime cannot express; followed by the
/// digit count and expanded after chrono has formatted the rest
const FRACTION_MARKER: char = '\u{1}';

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use lite_logger::core::TimestampFormat;
/// use chrono::{Local, TimeZone};
///
/// let format = TimestampFormat::from_pattern("yyyy-MM-dd HH:mm:ss,fff");
/// let time = Local.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).single().unwrap();
/// assert_eq!(format.format(&time), "2025-01-08 10:30:45,000");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// RFC 3339 with milliseconds and offset: `2025-01-08T10:30:45.123+01:00`
    Rfc3339,

    /// strftime format string
    Custom(String),
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::from_pattern(DEFAULT_TIMESTAMP_PATTERN)
    }
}

impl TimestampFormat {
    /// Translate a .NET-style date pattern
    ///
    /// Supported specifiers: `yyyy yy MMMM MMM MM M dddd ddd dd d HH H hh h
    /// mm m ss s f..fffffffff tt zzz zz K`. Text in single quotes and
    /// characters escaped with `\` are copied literally.
    #[must_use]
    pub fn from_pattern(pattern: &str) -> Self {
        TimestampFormat::Custom(translate_pattern(pattern))
    }

    #[must_use]
    pub fn format<Tz>(&self, datetime: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match self {
            TimestampFormat::Rfc3339 => datetime.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string(),
            TimestampFormat::Custom(format_str) => {
                let formatted = datetime.format(format_str).to_string();
                if formatted.contains(FRACTION_MARKER) {
                    expand_fractions(&formatted, datetime.nanosecond())
                } else {
                    formatted
                }
            }
        }
    }
}

fn translate_pattern(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();

        match c {
            '\'' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j] != '\'' {
                    push_literal(&mut out, chars[j]);
                    j += 1;
                }
                i = j + 1;
                continue;
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    push_literal(&mut out, next);
                }
                i += 2;
                continue;
            }
            'y' => out.push_str(if run >= 3 { "%Y" } else { "%y" }),
            'M' => out.push_str(match run {
                1 => "%-m",
                2 => "%m",
                3 => "%b",
                _ => "%B",
            }),
            'd' => out.push_str(match run {
                1 => "%-d",
                2 => "%d",
                3 => "%a",
                _ => "%A",
            }),
            'H' => out.push_str(if run == 1 { "%-H" } else { "%H" }),
            'h' => out.push_str(if run == 1 { "%-I" } else { "%I" }),
            'm' => out.push_str(if run == 1 { "%-M" } else { "%M" }),
            's' => out.push_str(if run == 1 { "%-S" } else { "%S" }),
            'f' | 'F' => match run.min(9) {
                3 => out.push_str("%3f"),
                6 => out.push_str("%6f"),
                9 => out.push_str("%9f"),
                digits => {
                    out.push(FRACTION_MARKER);
                    out.push(char::from(b'0' + digits as u8));
                }
            },
            't' => out.push_str("%p"),
            'z' => out.push_str(if run >= 3 { "%:z" } else { "%z" }),
            'K' => out.push_str("%:z"),
            other => {
                for _ in 0..run {
                    push_literal(&mut out, other);
                }
            }
        }
        i += run;
    }

    out
}

/// Replace each marker with the leading digits of the second's fraction,
/// truncated as .NET does
fn expand_fractions(formatted: &str, nanosecond: u32) -> String {
    let fraction = format!("{:09}", nanosecond % 1_000_000_000);
    let mut out = String::with_capacity(formatted.len() + 8);
    let mut chars = formatted.chars();

    while let Some(c) = chars.next() {
        if c != FRACTION_MARKER {
            out.push(c);
            continue;
        }
        let digits = chars
            .next()
            .and_then(|d| d.to_digit(10))
            .map_or(0, |d| d as usize);
        out.push_str(&fraction[..digits.min(9)]);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_default_pattern() {
        let result = TimestampFormat::default().format(&fixed_datetime());
        assert_eq!(result, "2025-01-08 10:30:45.123");
    }

    #[test]
    fn test_json_app_time_pattern() {
        let format = TimestampFormat::from_pattern("yyyy-MM-dd HH:mm:ss,fff");
        assert_eq!(format.format(&fixed_datetime()), "2025-01-08 10:30:45,123");
    }

    #[test]
    fn test_short_fractions_truncate() {
        let time = fixed_datetime();
        assert_eq!(TimestampFormat::from_pattern("ss.f").format(&time), "45.1");
        assert_eq!(TimestampFormat::from_pattern("ss.ff").format(&time), "45.12");
        assert_eq!(TimestampFormat::from_pattern("ss.ffff").format(&time), "45.1234");

        let late = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).single().expect("valid datetime")
            + chrono::Duration::milliseconds(999);
        assert_eq!(TimestampFormat::from_pattern("ss.f").format(&late), "45.9");
    }

    #[test]
    fn test_quoted_and_escaped_literals() {
        let format = TimestampFormat::from_pattern("'day' d\\h HH'%'");
        assert_eq!(format.format(&fixed_datetime()), "day 8h 10%");
    }

    #[test]
    fn test_offset_specifier() {
        let offset = FixedOffset::east_opt(2 * 3600).expect("valid offset");
        let time = fixed_datetime().with_timezone(&offset);
        let format = TimestampFormat::from_pattern("HH:mm zzz");
        assert_eq!(format.format(&time), "12:30 +02:00");
    }

    #[test]
    fn test_rfc3339_format() {
        let result = TimestampFormat::Rfc3339.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123+00:00");
    }

    #[test]
    fn test_deserialization() {
        let format: TimestampFormat =
            serde_json::from_str(r#"{"Custom":"%Y-%m-%d"}"#).expect("deserialize Custom");
        assert_eq!(format, TimestampFormat::Custom("%Y-%m-%d".to_string()));
    }
}
