//! Overflow policies for bounded event queues
//!
//! When the queue in front of a background sink worker is full, the policy
//! decides what happens to new events. Producers are never handed an error.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy for handling queue overflow in the async sink wrapper
///
/// # Example
///
/// ```
/// use lite_logger::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: alert and drop
/// let policy = OverflowPolicy::default();
///
/// // Block with timeout
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Drop new events silently; only metrics record the loss
    DropNewest,

    /// Block until space is available
    ///
    /// Applies back-pressure to the code that writes log statements.
    Block,

    /// Block with timeout, then drop
    BlockWithTimeout(Duration),

    /// Drop new events and alert through the self-log and callback
    #[default]
    AlertAndDrop,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::AlertAndDrop => write!(f, "AlertAndDrop"),
        }
    }
}

/// Callback type for overflow notifications
///
/// The parameter is the total count of dropped events so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Whether a drop with the given zero-based index should raise an alert
///
/// Alerts fire on the first drop and on every thousandth after it.
pub(crate) fn should_alert(previous_drops: u64) -> bool {
    previous_drops == 0 || (previous_drops + 1) % 1000 == 0
}
