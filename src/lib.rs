//! # Rust Async Logger
//!
//! A logging core that decouples log producers from slow sink I/O.
//!
//! ## Features
//!
//! - **Sync and async loggers**: one [`Logger`] type, dispatching either on
//!   the calling thread or through a shared [`ThreadPool`]
//! - **Bounded queue with overflow policies**: `Block`, `BlockWithTimeout`
//!   and `OverrunOldest`; flush requests are never evicted
//! - **Sinks**: console, basic file, rotating file, daily file and null,
//!   shareable between loggers
//! - **Registry**: named loggers plus a default logger, file and console
//!   factories, and free functions ([`info`], [`warn`], ...) that log through
//!   the [`global()`] default logger
//!
//! ## Example
//!
//! ```
//! use rust_async_logger::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let pool = Arc::new(ThreadPool::new(1024, 1).unwrap());
//! let logger = Logger::builder("app")
//!     .sink(NullSink::new())
//!     .thread_pool(pool)
//!     .overflow_policy(OverflowPolicy::Block)
//!     .build();
//!
//! rust_async_logger::info!(logger, "listening on port {}", 8080);
//! logger.flush_and_wait(Duration::from_secs(1)).unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::{ColorMode, ConsoleSink, ConsoleTarget};
    pub use crate::sinks::{BasicFileSink, DailyFileSink, NullSink, RotatingFileSink};
    pub use crate::core::{
        ErrorHandler, LevelConfig, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerError,
        OverflowCallback, OverflowPolicy, PatternFormatter, PatternTimeType, PoolMetrics,
        RegistrationPolicy, Registry, Result, Sink, SinkBase, SinkPtr, SourceLocation,
        ThreadPool, ThreadPoolBuilder,
    };
}

#[cfg(feature = "console")]
pub use crate::sinks::{ColorMode, ConsoleSink, ConsoleTarget};
pub use crate::sinks::{BasicFileSink, DailyFileSink, NullSink, RotatingFileSink};
pub use crate::core::{
    global, AtomicLevel, ErrorHandler, LevelConfig, LogLevel, LogRecord, Logger, LoggerBuilder,
    LoggerError, OverflowCallback, OverflowPolicy, PatternFormatter, PatternTimeType,
    PoolMetrics, RegistrationPolicy, Registry, Result, Sink, SinkBase, SinkPtr, SourceLocation,
    ThreadCallback, ThreadPool, ThreadPoolBuilder, DEFAULT_PATTERN, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_COUNT, LEVEL_ENV_VAR,
};
pub use crate::core::registry::{critical, debug, error, info, log, trace, warn};
