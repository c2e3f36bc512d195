//! Pipeline counters
//!
//! One `LoggerMetrics` is shared (behind an `Arc`) by the logger, its
//! batching and async sinks. `snapshot()` copies the counters into a plain
//! serializable struct for reporting.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic event counters
///
/// # Example
///
/// ```
/// use lite_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_logged();
/// metrics.record_dropped();
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.logged, 1);
/// assert_eq!(snapshot.dropped, 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    logged: AtomicU64,
    filtered: AtomicU64,
    dropped: AtomicU64,
    sink_failures: AtomicU64,
    queue_full: AtomicU64,
    blocked: AtomicU64,
}

/// Point-in-time copy of [`LoggerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Events handed to the sink fan-out
    pub logged: u64,
    /// Events rejected by the level gate or a filter
    pub filtered: u64,
    /// Events discarded by a full queue
    pub dropped: u64,
    /// Sink calls that returned an error or panicked
    pub sink_failures: u64,
    /// Times an append found its queue full
    pub queue_full: u64,
    /// Times a producer waited for queue space
    pub blocked: u64,
}

impl MetricsSnapshot {
    /// Share of events lost to full queues, in percent
    pub fn drop_rate(&self) -> f64 {
        let seen = self.logged + self.dropped;
        if seen == 0 {
            return 0.0;
        }
        self.dropped as f64 * 100.0 / seen as f64
    }
}

macro_rules! counter {
    ($field:ident, $read:ident, $record:ident) => {
        #[inline]
        pub fn $read(&self) -> u64 {
            self.$field.load(Ordering::Relaxed)
        }

        /// Increment, returning the previous value
        #[inline]
        pub fn $record(&self) -> u64 {
            self.$field.fetch_add(1, Ordering::Relaxed)
        }
    };
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            logged: AtomicU64::new(0),
            filtered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            queue_full: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
        }
    }

    counter!(logged, total_logged, record_logged);
    counter!(filtered, filtered_count, record_filtered);
    counter!(dropped, dropped_count, record_dropped);
    counter!(sink_failures, sink_failures, record_sink_failure);
    counter!(queue_full, queue_full_events, record_queue_full);
    counter!(blocked, block_events, record_block);

    pub fn drop_rate(&self) -> f64 {
        self.snapshot().drop_rate()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            logged: self.total_logged(),
            filtered: self.filtered_count(),
            dropped: self.dropped_count(),
            sink_failures: self.sink_failures(),
            queue_full: self.queue_full_events(),
            blocked: self.block_events(),
        }
    }
}
