//! Core logger types and traits

pub mod error;
pub mod level_config;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod pattern;
mod periodic;
mod queue;
pub mod registry;
pub mod sink;
pub mod thread_pool;

pub use error::{LoggerError, Result};
pub use level_config::{LevelConfig, LEVEL_ENV_VAR};
pub use log_level::{AtomicLevel, LogLevel};
pub use log_record::{LogRecord, SourceLocation};
pub use logger::{ErrorHandler, Logger, LoggerBuilder};
pub use metrics::PoolMetrics;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use pattern::{PatternFormatter, PatternTimeType, DEFAULT_PATTERN};
pub use registry::{global, RegistrationPolicy, Registry};
pub use sink::{Sink, SinkBase, SinkPtr};
pub use thread_pool::{
    ThreadCallback, ThreadPool, ThreadPoolBuilder, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WORKER_COUNT,
};
