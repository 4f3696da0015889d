//! Worker pool draining the async log queue
//!
//! A fixed set of worker threads pops [`Job`]s from one shared
//! [`BoundedQueue`] and performs sink I/O off the producer's thread.
//! Shutdown appends one terminate job per worker to the tail of the queue,
//! so everything enqueued before shutdown is delivered before workers exit.

use super::{
    error::{LoggerError, Result},
    log_record::LogRecord,
    logger::LoggerBackend,
    metrics::PoolMetrics,
    overflow_policy::OverflowPolicy,
    queue::{BoundedQueue, PushError},
};
use crossbeam_channel::Sender;
use parking_lot::{Mutex, MutexGuard};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default queue capacity for pools created without explicit configuration
pub const DEFAULT_QUEUE_CAPACITY: usize = 8192;

/// Default number of worker threads
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// Default shutdown timeout used when a pool is dropped (5 seconds)
///
/// For custom timeout control, use [`ThreadPool::shutdown_timeout`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Callback run on each worker thread as it starts or stops
pub type ThreadCallback = Arc<dyn Fn() + Send + Sync>;

/// Unit of work owned by the queue until a worker takes it.
pub(crate) enum Job {
    Log {
        backend: Arc<LoggerBackend>,
        record: LogRecord,
    },
    Flush {
        backend: Arc<LoggerBackend>,
        /// Waiters to notify once the sinks are flushed
        acks: Vec<Sender<()>>,
    },
    Terminate,
}

impl Job {
    /// Only log jobs may be evicted by `OverrunOldest`
    fn is_evictable(&self) -> bool {
        matches!(self, Job::Log { .. })
    }

    /// Fold an incoming flush into this queued flush of the same logger.
    ///
    /// Only called when no log job is queued, so the queued flush already
    /// covers every record the incoming one was meant to flush.
    fn absorb_flush(&mut self, incoming: &mut Job) -> bool {
        match (self, incoming) {
            (
                Job::Flush { backend, acks },
                Job::Flush {
                    backend: other,
                    acks: other_acks,
                },
            ) if Arc::ptr_eq(backend, other) => {
                acks.append(other_acks);
                true
            }
            _ => false,
        }
    }

    fn execute(self) -> bool {
        match self {
            Job::Log { backend, record } => backend.sink_it(&record),
            Job::Flush { backend, acks } => {
                backend.flush_sinks();
                for ack in acks {
                    // The waiter may have given up already
                    let _ = ack.send(());
                }
            }
            Job::Terminate => return false,
        }
        true
    }
}

/// Fixed-size worker pool with a bounded FIFO job queue
///
/// Jobs leave the queue in arrival order. With more than one worker,
/// consecutive jobs from one producer may run concurrently, so strict
/// per-producer delivery order requires a single worker.
///
/// # Example
///
/// ```
/// use rust_async_logger::prelude::*;
/// use std::sync::Arc;
///
/// let pool = Arc::new(ThreadPool::new(1024, 2).unwrap());
/// let logger = Logger::builder("svc")
///     .sink(NullSink::new())
///     .thread_pool(Arc::clone(&pool))
///     .overflow_policy(OverflowPolicy::OverrunOldest)
///     .build();
///
/// logger.info("handled request");
/// assert!(pool.shutdown());
/// ```
pub struct ThreadPool {
    queue: Arc<BoundedQueue<Job>>,
    metrics: Arc<PoolMetrics>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    /// Terminate jobs already queued by a shutdown in progress
    terminates_sent: Mutex<usize>,
}

impl ThreadPool {
    /// Create a pool with `worker_count` workers draining a queue of
    /// `queue_capacity` jobs. Both must be at least 1.
    pub fn new(queue_capacity: usize, worker_count: usize) -> Result<Self> {
        Self::builder()
            .queue_capacity(queue_capacity)
            .worker_count(worker_count)
            .build()
    }

    #[must_use]
    pub fn builder() -> ThreadPoolBuilder {
        ThreadPoolBuilder::new()
    }

    /// Enqueue a job, resolving a full queue with `policy`.
    ///
    /// Returns `Ok(true)` when a log job was lost to `OverrunOldest`: either a
    /// queued one evicted to make room, or `job` itself when the queue holds
    /// only flushes. A flush arriving at such a queue merges into a queued
    /// flush of the same logger, or else takes one slot past capacity.
    pub(crate) fn enqueue(&self, job: Job, policy: OverflowPolicy) -> Result<bool> {
        let result = match policy {
            OverflowPolicy::Block => self.queue.push_blocking(job),
            OverflowPolicy::BlockWithTimeout(timeout) => self.queue.push_timeout(job, timeout),
            OverflowPolicy::OverrunOldest => {
                self.queue
                    .push_overrun(job, Job::is_evictable, Job::absorb_flush)
            }
        };

        match result {
            Ok(outcome) => {
                self.metrics.record_enqueued();
                if outcome.full {
                    self.metrics.record_queue_full();
                }
                if outcome.waited {
                    self.metrics.record_block();
                }
                // The evicted job is dropped here, outside the queue lock
                let evicted = outcome.evicted.is_some();
                if evicted {
                    self.metrics.record_overrun();
                }
                Ok(evicted)
            }
            Err(PushError::Closed(_)) => Err(LoggerError::shutdown("ThreadPool")),
            Err(PushError::Timeout(_)) => {
                self.metrics.record_queue_full();
                self.metrics.record_block();
                self.metrics.record_discard();
                Err(LoggerError::queue_full(self.queue.capacity()))
            }
        }
    }

    /// Stop accepting jobs, drain the queue and wait for every worker to exit.
    ///
    /// Jobs enqueued before this call are all executed; enqueues after it
    /// fail with [`LoggerError::Shutdown`]. Calling it again is a no-op.
    /// Returns false if a worker panicked.
    pub fn shutdown(&self) -> bool {
        self.send_terminates(None);

        let handles = std::mem::take(&mut *self.workers.lock());
        let mut clean = true;
        for handle in handles {
            if let Err(e) = handle.join() {
                eprintln!("[LOGGER ERROR] Thread pool worker panicked during shutdown: {:?}", e);
                clean = false;
            }
        }
        clean
    }

    /// Like [`shutdown`](Self::shutdown), but gives up after `timeout`.
    ///
    /// # Returns
    ///
    /// `true` if every worker exited within the timeout, `false` otherwise.
    /// Workers still running keep draining; a later `shutdown()` waits for them.
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        if !self.send_terminates(Some(deadline)) {
            eprintln!(
                "[LOGGER WARNING] Thread pool queue did not drain within {:?} timeout. \
                 Some logs may be lost.",
                timeout
            );
            return false;
        }

        let mut handles = self.workers.lock();
        let mut clean = true;
        loop {
            let mut i = 0;
            while i < handles.len() {
                if handles[i].is_finished() {
                    if let Err(e) = handles.swap_remove(i).join() {
                        eprintln!(
                            "[LOGGER ERROR] Thread pool worker panicked during shutdown: {:?}",
                            e
                        );
                        clean = false;
                    }
                } else {
                    i += 1;
                }
            }

            if handles.is_empty() {
                return clean;
            }

            if Instant::now() >= deadline {
                eprintln!(
                    "[LOGGER WARNING] {} thread pool worker(s) did not finish within {:?} timeout. \
                     Some logs may be lost.",
                    handles.len(),
                    timeout
                );
                return false;
            }

            // Small sleep to avoid busy-waiting
            MutexGuard::unlocked(&mut handles, || thread::sleep(Duration::from_millis(10)));
        }
    }

    fn send_terminates(&self, deadline: Option<Instant>) -> bool {
        self.queue.close();
        let mut sent = self.terminates_sent.lock();
        while *sent < self.worker_count {
            if !self.queue.force_push(Job::Terminate, deadline) {
                return false;
            }
            *sent += 1;
        }
        true
    }

    pub fn is_shut_down(&self) -> bool {
        self.queue.is_closed()
    }

    /// Number of jobs currently waiting in the queue
    pub fn queue_size(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of log jobs evicted under `OverrunOldest`
    pub fn overrun_counter(&self) -> u64 {
        self.metrics.overrun_count()
    }

    pub fn reset_overrun_counter(&self) {
        self.metrics.reset_overrun_count();
    }

    /// Number of jobs discarded because a bounded wait expired
    pub fn discard_counter(&self) -> u64 {
        self.metrics.discard_count()
    }

    pub fn reset_discard_counter(&self) {
        self.metrics.reset_discard_count();
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown_timeout(DEFAULT_SHUTDOWN_TIMEOUT);

        let lost = self.metrics.lost_count();
        if lost > 0 {
            eprintln!(
                "[LOGGER WARNING] Thread pool shutting down with {} lost logs (loss rate: {:.2}%)",
                lost,
                self.metrics.loss_rate()
            );
        }
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("queue_capacity", &self.queue.capacity())
            .field("queue_size", &self.queue.len())
            .field("worker_count", &self.worker_count)
            .field("shut_down", &self.queue.is_closed())
            .finish()
    }
}

fn worker_loop(queue: &BoundedQueue<Job>, metrics: &PoolMetrics) {
    loop {
        let job = queue.pop();
        match catch_unwind(AssertUnwindSafe(|| job.execute())) {
            Ok(true) => {
                metrics.record_processed();
            }
            Ok(false) => break,
            Err(panic_info) => {
                metrics.record_processed();
                eprintln!(
                    "[LOGGER CRITICAL] Thread pool worker caught a panic: {}. \
                     Worker continues to drain the queue.",
                    panic_message(&*panic_info)
                );
            }
        }
    }
}

pub(crate) fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Builder for [`ThreadPool`]
///
/// # Example
///
/// ```
/// use rust_async_logger::ThreadPool;
/// use std::sync::Arc;
///
/// let pool = ThreadPool::builder()
///     .queue_capacity(4096)
///     .worker_count(2)
///     .thread_name("log-worker")
///     .on_thread_start(Arc::new(|| {}))
///     .build()
///     .unwrap();
/// assert_eq!(pool.worker_count(), 2);
/// ```
pub struct ThreadPoolBuilder {
    queue_capacity: usize,
    worker_count: usize,
    thread_name: String,
    on_thread_start: Option<ThreadCallback>,
    on_thread_stop: Option<ThreadCallback>,
}

impl ThreadPoolBuilder {
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_count: DEFAULT_WORKER_COUNT,
            thread_name: "logger-worker".to_string(),
            on_thread_start: None,
            on_thread_stop: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Prefix for worker thread names; workers are named `<prefix>-<n>`
    #[must_use = "builder methods return a new value"]
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_thread_start(mut self, callback: ThreadCallback) -> Self {
        self.on_thread_start = Some(callback);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_thread_stop(mut self, callback: ThreadCallback) -> Self {
        self.on_thread_stop = Some(callback);
        self
    }

    /// Validate the configuration and start the workers
    ///
    /// # Errors
    ///
    /// `Configuration` if capacity or worker count is zero, `IoOperation` if
    /// a worker thread cannot be spawned.
    pub fn build(self) -> Result<ThreadPool> {
        if self.queue_capacity == 0 {
            return Err(LoggerError::config(
                "ThreadPool",
                "queue_capacity must be at least 1",
            ));
        }
        if self.worker_count == 0 {
            return Err(LoggerError::config(
                "ThreadPool",
                "worker_count must be at least 1",
            ));
        }

        let queue = Arc::new(BoundedQueue::new(self.queue_capacity));
        let metrics = Arc::new(PoolMetrics::new());
        let mut handles = Vec::with_capacity(self.worker_count);

        for index in 0..self.worker_count {
            let queue_clone = Arc::clone(&queue);
            let metrics_clone = Arc::clone(&metrics);
            let on_start = self.on_thread_start.clone();
            let on_stop = self.on_thread_stop.clone();

            let spawned = thread::Builder::new()
                .name(format!("{}-{}", self.thread_name, index))
                .spawn(move || {
                    if let Some(on_start) = on_start {
                        on_start();
                    }
                    worker_loop(&queue_clone, &metrics_clone);
                    if let Some(on_stop) = on_stop {
                        on_stop();
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Stop the workers that did start before reporting
                    queue.close();
                    for _ in 0..handles.len() {
                        queue.force_push(Job::Terminate, None);
                    }
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(LoggerError::io_operation(
                        "starting thread pool",
                        format!("Failed to spawn worker {}", index),
                        e,
                    ));
                }
            }
        }

        Ok(ThreadPool {
            queue,
            metrics,
            workers: Mutex::new(handles),
            worker_count: self.worker_count,
            terminates_sent: Mutex::new(0),
        })
    }
}

impl Default for ThreadPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
