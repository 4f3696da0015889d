//! Thread pool metrics for observability
//!
//! Counters for monitoring queue pressure: overrun evictions, bounded-wait
//! discards, blocking events and throughput.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for thread pool observability
///
/// # Example
///
/// ```
/// use rust_async_logger::PoolMetrics;
///
/// let metrics = PoolMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_overrun();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.overrun_count(), 1);
/// assert_eq!(metrics.lost_count(), 1);
/// ```
#[derive(Debug)]
pub struct PoolMetrics {
    /// Jobs accepted into the queue
    enqueued: AtomicU64,

    /// Jobs executed by workers
    processed: AtomicU64,

    /// Log jobs evicted under `OverrunOldest`
    overrun_count: AtomicU64,

    /// Log jobs discarded after a bounded wait expired
    discard_count: AtomicU64,

    /// Number of enqueues that found the queue full
    queue_full_events: AtomicU64,

    /// Number of enqueues that had to wait for space
    block_events: AtomicU64,
}

impl PoolMetrics {
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            overrun_count: AtomicU64::new(0),
            discard_count: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn overrun_count(&self) -> u64 {
        self.overrun_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn discard_count(&self) -> u64 {
        self.discard_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    /// Total jobs lost to eviction or discard
    #[inline]
    pub fn lost_count(&self) -> u64 {
        self.overrun_count() + self.discard_count()
    }

    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_overrun(&self) -> u64 {
        self.overrun_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_discard(&self) -> u64 {
        self.discard_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    pub fn reset_overrun_count(&self) {
        self.overrun_count.store(0, Ordering::Relaxed);
    }

    pub fn reset_discard_count(&self) {
        self.discard_count.store(0, Ordering::Relaxed);
    }

    /// Loss rate as a percentage (0.0 - 100.0) of all jobs offered
    ///
    /// Returns 0.0 if nothing has been enqueued.
    pub fn loss_rate(&self) -> f64 {
        let lost = self.lost_count() as f64;
        let total = self.enqueued() as f64 + self.discard_count() as f64;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.processed.store(0, Ordering::Relaxed);
        self.overrun_count.store(0, Ordering::Relaxed);
        self.discard_count.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PoolMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            processed: AtomicU64::new(self.processed()),
            overrun_count: AtomicU64::new(self.overrun_count()),
            discard_count: AtomicU64::new(self.discard_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
        }
    }
}
