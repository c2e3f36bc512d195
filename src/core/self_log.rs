//! Internal diagnostic channel
//!
//! Failures inside the pipeline (a sink that errors or panics, an email batch
//! that cannot be sent, a full queue) are never raised to the code that wrote
//! the log statement. They are reported here instead.

use std::fmt;
use std::sync::Arc;

type Output = Arc<dyn Fn(&str) + Send + Sync>;

/// Cloneable handle to the diagnostic output
///
/// # Example
///
/// ```
/// use lite_logger::SelfLog;
/// use std::sync::{Arc, Mutex};
///
/// let captured = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&captured);
/// let self_log = SelfLog::to_fn(move |line| sink.lock().unwrap().push(line.to_string()));
///
/// self_log.error("Failed to send email");
/// assert_eq!(captured.lock().unwrap().len(), 1);
/// ```
#[derive(Clone)]
pub struct SelfLog {
    output: Option<Output>,
}

impl SelfLog {
    /// Write diagnostics to stderr
    pub fn stderr() -> Self {
        Self {
            output: Some(Arc::new(|line| eprintln!("{}", line))),
        }
    }

    /// Route diagnostics to a closure
    pub fn to_fn<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            output: Some(Arc::new(f)),
        }
    }

    /// Discard all diagnostics
    pub fn disabled() -> Self {
        Self { output: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.output.is_some()
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.write("[LOGGER ERROR]", message);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.write("[LOGGER WARNING]", message);
    }

    pub fn critical(&self, message: impl fmt::Display) {
        self.write("[LOGGER CRITICAL]", message);
    }

    fn write(&self, prefix: &str, message: impl fmt::Display) {
        if let Some(output) = &self.output {
            output(&format!("{} {}", prefix, message));
        }
    }
}

impl Default for SelfLog {
    fn default() -> Self {
        Self::stderr()
    }
}

impl fmt::Debug for SelfLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelfLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
