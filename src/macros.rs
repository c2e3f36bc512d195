//! Logging macros for message templates with named properties.
//!
//! Each `Name = value` pair becomes an event property; the template refers to
//! it as `{Name}`. Nothing is evaluated when the logger's minimum level
//! rejects the event.
//!
//! # Examples
//!
//! ```
//! use lite_logger::prelude::*;
//! use lite_logger::{info, warn};
//!
//! let logger = Logger::default_console();
//!
//! // Plain message
//! info!(logger, "Server started");
//!
//! // Named properties
//! let port = 8080;
//! info!(logger, "Server listening on port {Port}", Port = port);
//!
//! // Properties not used by the template are kept on the event
//! warn!(logger, "Retry {Attempt} of {Max}", Attempt = 3, Max = 5, Endpoint = "/orders");
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use lite_logger::prelude::*;
/// # let logger = Logger::default_console();
/// use lite_logger::log;
/// log!(logger, LogLevel::Information, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {Code}", Code = 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $template:expr $(, $name:ident = $value:expr)* $(,)?) => {{
        let logger = &$logger;
        let level: $crate::core::LogLevel = $level;
        if logger.is_enabled(level) {
            #[allow(unused_mut)]
            let mut properties = $crate::core::Properties::new();
            $(properties.add_or_update(stringify!($name), $value);)*
            logger.write(level, $template, properties);
        }
    }};
}

/// Log a verbose-level message.
///
/// # Examples
///
/// ```
/// # use lite_logger::prelude::*;
/// # let logger = LoggerConfiguration::new().write_to(ConsoleSink::plain()).create_logger();
/// use lite_logger::verbose;
/// verbose!(logger, "Entering function: calculate()");
/// verbose!(logger, "Variable value: {Value}", Value = 42);
/// ```
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Verbose, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Debug, $($arg)+)
    };
}

/// Log an information-level message.
///
/// # Examples
///
/// ```
/// # use lite_logger::prelude::*;
/// # let logger = Logger::default_console();
/// use lite_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {Count} items", Count = 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Information, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use lite_logger::prelude::*;
/// # let logger = Logger::default_console();
/// use lite_logger::error;
/// error!(logger, "Failed to connect to {Database}", Database = "orders");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::core::LogLevel::Fatal, $($arg)+)
    };
}
