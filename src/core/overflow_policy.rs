//! Overflow policies for the async job queue
//!
//! When the thread pool's queue is full, the policy of the logger that is
//! enqueueing decides what happens. The decision is made per enqueue; the
//! queue itself holds no policy state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy for handling queue overflow in async logging
///
/// # Example
///
/// ```
/// use rust_async_logger::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: wait for space, never lose a message
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::Block);
///
/// // Wait at most 100ms, then discard the new message
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Block the producer until space is available
    ///
    /// No message is ever lost. A sink that stops draining stalls every
    /// producer of every logger sharing the pool: this is backpressure,
    /// not a hang.
    #[default]
    Block,

    /// Block for at most the given duration, then discard the new job
    ///
    /// The discard is counted and reported to the logger's error handler
    /// as [`LoggerError::QueueFull`](crate::LoggerError::QueueFull).
    BlockWithTimeout(Duration),

    /// Evict the oldest queued log job to make room for the new one
    ///
    /// Producers never wait. Eviction is silent towards the producer; it is
    /// visible only through the pool's overrun counter and the optional
    /// overflow callback. Flush jobs are never evicted: when the queue holds
    /// nothing but flushes, a new record is dropped instead, and a new flush
    /// merges into a queued flush of the same logger or takes one slot past
    /// capacity.
    OverrunOldest,
}

impl OverflowPolicy {
    /// Whether an enqueue under this policy may suspend the producer
    #[must_use]
    pub fn may_block(&self) -> bool {
        !matches!(self, OverflowPolicy::OverrunOldest)
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::OverrunOldest => write!(f, "OverrunOldest"),
        }
    }
}

/// Callback type for overflow notifications
///
/// Called when an enqueue evicts or discards a job.
/// The parameter is the pool's total count of lost jobs so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
