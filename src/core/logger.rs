//! Main logger implementation
//!
//! A [`Logger`] filters by level, builds a [`LogRecord`] and either fans it
//! out to its sinks on the calling thread (sync) or hands it to a
//! [`ThreadPool`] (async). The sink list, flush level and error handler live
//! in a shared [`LoggerBackend`] so queued jobs can reach them after the
//! producer's call has returned.

use super::{
    error::{LoggerError, Result},
    log_level::{AtomicLevel, LogLevel},
    log_record::{LogRecord, SourceLocation},
    overflow_policy::{OverflowCallback, OverflowPolicy},
    pattern::{PatternFormatter, PatternTimeType},
    sink::{Sink, SinkPtr},
    thread_pool::{panic_message, Job, ThreadPool},
};
use parking_lot::RwLock;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Callback receiving errors raised while dispatching records.
///
/// Arguments are the logger name and the error. Runs on whichever thread hit
/// the error: the producer for sync loggers, a pool worker for async ones.
pub type ErrorHandler = Arc<dyn Fn(&str, &LoggerError) + Send + Sync>;

/// Sink fan-out shared between a logger and its queued jobs
pub(crate) struct LoggerBackend {
    name: Arc<str>,
    sinks: Vec<SinkPtr>,
    flush_level: AtomicLevel,
    error_handler: RwLock<Option<ErrorHandler>>,
    error_count: AtomicU64,
}

impl LoggerBackend {
    fn new(name: Arc<str>, sinks: Vec<SinkPtr>) -> Self {
        Self {
            name,
            sinks,
            flush_level: AtomicLevel::new(LogLevel::Off),
            error_handler: RwLock::new(None),
            error_count: AtomicU64::new(0),
        }
    }

    /// Deliver a record to every sink that accepts its level, in attachment
    /// order. A failing or panicking sink does not stop the others.
    pub(crate) fn sink_it(&self, record: &LogRecord) {
        for sink in &self.sinks {
            if !sink.should_log(record.level) {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| sink.log(record))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.handle_error(&e),
                Err(panic_info) => self.handle_error(&LoggerError::sink_panicked(
                    sink.name(),
                    panic_message(&*panic_info),
                )),
            }
        }

        if self.should_flush(record.level) {
            self.flush_sinks();
        }
    }

    pub(crate) fn flush_sinks(&self) {
        for sink in &self.sinks {
            match catch_unwind(AssertUnwindSafe(|| sink.flush())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => self.handle_error(&e),
                Err(panic_info) => self.handle_error(&LoggerError::sink_panicked(
                    sink.name(),
                    panic_message(&*panic_info),
                )),
            }
        }
    }

    fn should_flush(&self, level: LogLevel) -> bool {
        let flush_level = self.flush_level.load();
        flush_level != LogLevel::Off && level >= flush_level
    }

    pub(crate) fn handle_error(&self, err: &LoggerError) {
        let handler = self.error_handler.read().clone();
        match handler {
            Some(handler) => handler(&self.name, err),
            None => {
                let previous = self.error_count.fetch_add(1, Ordering::Relaxed);
                // Report the first error and periodically thereafter
                if previous == 0 || (previous + 1) % 1000 == 0 {
                    eprintln!(
                        "[LOGGER ERROR] [{}] {} ({} error(s) so far)",
                        self.name,
                        err,
                        previous + 1
                    );
                }
            }
        }
    }
}

#[derive(Clone)]
enum Dispatch {
    Sync,
    Async {
        pool: Arc<ThreadPool>,
        policy: OverflowPolicy,
        on_overflow: Option<OverflowCallback>,
    },
}

/// Named dispatcher owning an ordered list of sinks and a minimum level.
///
/// Share it as `Arc<Logger>`; every method takes `&self`.
pub struct Logger {
    backend: Arc<LoggerBackend>,
    level: AtomicLevel,
    dispatch: Dispatch,
}

impl Logger {
    /// Create a synchronous logger: records are written on the calling thread
    pub fn new(name: impl Into<String>, sinks: impl IntoIterator<Item = SinkPtr>) -> Self {
        Self::with_dispatch(name, sinks.into_iter().collect(), Dispatch::Sync)
    }

    /// Create an asynchronous logger: records are queued on `pool` and written
    /// by its workers, with `policy` deciding what a full queue does
    pub fn new_async(
        name: impl Into<String>,
        sinks: impl IntoIterator<Item = SinkPtr>,
        pool: Arc<ThreadPool>,
        policy: OverflowPolicy,
    ) -> Self {
        Self::with_dispatch(
            name,
            sinks.into_iter().collect(),
            Dispatch::Async {
                pool,
                policy,
                on_overflow: None,
            },
        )
    }

    fn with_dispatch(name: impl Into<String>, sinks: Vec<SinkPtr>, dispatch: Dispatch) -> Self {
        let name: String = name.into();
        Self {
            backend: Arc::new(LoggerBackend::new(name.into(), sinks)),
            level: AtomicLevel::new(LogLevel::Info),
            dispatch,
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_async_logger::prelude::*;
    ///
    /// let logger = Logger::builder("svc")
    ///     .sink(NullSink::new())
    ///     .level(LogLevel::Debug)
    ///     .build();
    /// assert_eq!(logger.level(), LogLevel::Debug);
    /// ```
    #[must_use]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.backend.name
    }

    pub fn level(&self) -> LogLevel {
        self.level.load()
    }

    /// Change the minimum level. Safe to call while other threads log.
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level);
    }

    #[inline]
    pub fn should_log(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level.load()
    }

    /// Flush the sinks automatically after any record at or above `level`.
    /// `LogLevel::Off` (the default) disables automatic flushing.
    pub fn flush_on(&self, level: LogLevel) {
        self.backend.flush_level.store(level);
    }

    pub fn flush_level(&self) -> LogLevel {
        self.backend.flush_level.load()
    }

    /// Sinks in attachment order
    pub fn sinks(&self) -> &[SinkPtr] {
        &self.backend.sinks
    }

    /// Apply the same pattern to every sink of this logger
    pub fn set_pattern(&self, pattern: &str, time_type: PatternTimeType) {
        for sink in &self.backend.sinks {
            sink.set_formatter(PatternFormatter::with_time_type(pattern, time_type));
        }
    }

    pub fn set_error_handler(&self, handler: ErrorHandler) {
        *self.backend.error_handler.write() = Some(handler);
    }

    pub fn is_async(&self) -> bool {
        matches!(self.dispatch, Dispatch::Async { .. })
    }

    /// Overflow policy for async loggers, `None` for sync ones
    pub fn overflow_policy(&self) -> Option<OverflowPolicy> {
        match &self.dispatch {
            Dispatch::Sync => None,
            Dispatch::Async { policy, .. } => Some(*policy),
        }
    }

    pub fn thread_pool(&self) -> Option<&Arc<ThreadPool>> {
        match &self.dispatch {
            Dispatch::Sync => None,
            Dispatch::Async { pool, .. } => Some(pool),
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.should_log(level) {
            return;
        }
        let record = LogRecord::new(Arc::clone(&self.backend.name), level, message.into());
        self.dispatch_record(record);
    }

    /// Log with the call site attached (used by the logging macros)
    pub fn log_with_location(
        &self,
        source: SourceLocation,
        level: LogLevel,
        message: impl Into<String>,
    ) {
        if !self.should_log(level) {
            return;
        }
        let record = LogRecord::new(Arc::clone(&self.backend.name), level, message.into())
            .with_source(source);
        self.dispatch_record(record);
    }

    fn dispatch_record(&self, record: LogRecord) {
        match &self.dispatch {
            Dispatch::Sync => self.backend.sink_it(&record),
            Dispatch::Async { .. } => {
                let job = Job::Log {
                    backend: Arc::clone(&self.backend),
                    record,
                };
                if let Err(e) = self.enqueue(job) {
                    self.backend.handle_error(&e);
                }
            }
        }
    }

    fn enqueue(&self, job: Job) -> Result<()> {
        let Dispatch::Async {
            pool,
            policy,
            on_overflow,
        } = &self.dispatch
        else {
            return Ok(());
        };

        let result = pool.enqueue(job, *policy);
        let lost = match &result {
            Ok(evicted) => *evicted,
            Err(e) => matches!(e, LoggerError::QueueFull { .. }),
        };
        if lost {
            if let Some(callback) = on_overflow {
                callback(pool.metrics().lost_count());
            }
        }
        result.map(|_| ())
    }

    /// Flush every sink.
    ///
    /// Sync loggers flush on the calling thread. Async loggers enqueue a
    /// flush job and return without waiting for it; the job is never evicted
    /// by `OverrunOldest` and never makes the producer wait under it. Use
    /// [`flush_and_wait`](Self::flush_and_wait) to wait for completion.
    ///
    /// # Errors
    ///
    /// `Shutdown` if the pool no longer accepts jobs, `QueueFull` if a
    /// `BlockWithTimeout` wait expired. Sink failures go to the error handler.
    pub fn flush(&self) -> Result<()> {
        match &self.dispatch {
            Dispatch::Sync => {
                self.backend.flush_sinks();
                Ok(())
            }
            Dispatch::Async { .. } => self.enqueue(Job::Flush {
                backend: Arc::clone(&self.backend),
                acks: Vec::new(),
            }),
        }
    }

    /// Flush and wait until a worker has flushed every sink.
    ///
    /// Everything this thread logged before the call has been written when it
    /// returns `Ok` (given a single-worker pool, or no concurrent workers
    /// still holding earlier records).
    pub fn flush_and_wait(&self, timeout: Duration) -> Result<()> {
        match &self.dispatch {
            Dispatch::Sync => {
                self.backend.flush_sinks();
                Ok(())
            }
            Dispatch::Async { .. } => {
                let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
                self.enqueue(Job::Flush {
                    backend: Arc::clone(&self.backend),
                    acks: vec![ack_tx],
                })?;
                ack_rx.recv_timeout(timeout).map_err(|e| match e {
                    crossbeam_channel::RecvTimeoutError::Timeout => {
                        LoggerError::FlushTimeout { timeout }
                    }
                    crossbeam_channel::RecvTimeoutError::Disconnected => {
                        LoggerError::shutdown("ThreadPool")
                    }
                })
            }
        }
    }

    /// Report an error through this logger's error handler
    pub fn report_error(&self, err: &LoggerError) {
        self.backend.handle_error(err);
    }

    /// New logger with another name, sharing this one's sinks and dispatch mode
    #[must_use]
    pub fn clone_with_name(&self, name: impl Into<String>) -> Logger {
        let clone = Self::with_dispatch(name, self.backend.sinks.clone(), self.dispatch.clone());
        clone.set_level(self.level());
        clone.flush_on(self.flush_level());
        if let Some(handler) = self.backend.error_handler.read().clone() {
            clone.set_error_handler(handler);
        }
        clone
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(LogLevel::Critical, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.level())
            .field("sinks", &self.backend.sinks.len())
            .field("overflow_policy", &self.overflow_policy())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_async_logger::prelude::*;
/// use std::sync::Arc;
///
/// let pool = Arc::new(ThreadPool::new(1000, 1).unwrap());
/// let logger = Logger::builder("svc")
///     .level(LogLevel::Debug)
///     .sink(NullSink::new())
///     .thread_pool(pool)
///     .overflow_policy(OverflowPolicy::OverrunOldest)
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} logs lost", count);
///     }))
///     .build();
/// assert!(logger.is_async());
/// ```
pub struct LoggerBuilder {
    name: String,
    sinks: Vec<SinkPtr>,
    level: LogLevel,
    flush_level: LogLevel,
    pool: Option<Arc<ThreadPool>>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    error_handler: Option<ErrorHandler>,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sinks: Vec::new(),
            level: LogLevel::Info,
            flush_level: LogLevel::Off,
            pool: None,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
            error_handler: None,
        }
    }

    /// Attach a sink owned by this logger only
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Attach a sink that may also be attached to other loggers
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: SinkPtr) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sinks(mut self, sinks: impl IntoIterator<Item = SinkPtr>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_on(mut self, level: LogLevel) -> Self {
        self.flush_level = level;
        self
    }

    /// Make the logger asynchronous, queueing records on `pool`
    ///
    /// If not called, the logger dispatches synchronously.
    #[must_use = "builder methods return a new value"]
    pub fn thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Set the overflow policy for async logging
    ///
    /// Determines what happens when the pool's queue is full.
    /// Default is `Block`. Ignored by synchronous loggers.
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Set a callback for overflow notifications
    ///
    /// Invoked when an enqueue by this logger evicts or discards a job.
    /// The parameter is the pool's total count of lost jobs.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let dispatch = match self.pool {
            Some(pool) => Dispatch::Async {
                pool,
                policy: self.overflow_policy,
                on_overflow: self.on_overflow,
            },
            None => Dispatch::Sync,
        };

        let logger = Logger::with_dispatch(self.name, self.sinks, dispatch);
        logger.set_level(self.level);
        logger.flush_on(self.flush_level);
        if let Some(handler) = self.error_handler {
            logger.set_error_handler(handler);
        }
        logger
    }
}
