//! Sink trait for log output destinations

use super::{
    error::Result,
    log_level::{AtomicLevel, LogLevel},
    log_record::LogRecord,
    pattern::PatternFormatter,
};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared handle to a sink. A sink may be attached to several loggers and
/// lives as long as its longest holder.
pub type SinkPtr = Arc<dyn Sink>;

/// Output target consuming log records.
///
/// Every method takes `&self`: sinks are shared between loggers and worker
/// threads, so implementations guard their own mutable state.
pub trait Sink: Send + Sync {
    /// Write one record. Called only for records that pass [`Sink::should_log`].
    fn log(&self, record: &LogRecord) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn level(&self) -> LogLevel;

    fn set_level(&self, level: LogLevel);

    fn set_formatter(&self, formatter: PatternFormatter);

    fn name(&self) -> &str;

    fn set_pattern(&self, pattern: &str) {
        self.set_formatter(PatternFormatter::new(pattern));
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }
}

/// Level and formatter state shared by the built-in sinks.
///
/// The two fields are guarded independently; reconfiguring either while a
/// record is being written is last-writer-wins.
#[derive(Debug)]
pub struct SinkBase {
    level: AtomicLevel,
    formatter: RwLock<PatternFormatter>,
}

impl SinkBase {
    pub fn new() -> Self {
        Self {
            level: AtomicLevel::new(LogLevel::Trace),
            formatter: RwLock::new(PatternFormatter::default()),
        }
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        self.level.load()
    }

    #[inline]
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level);
    }

    pub fn set_formatter(&self, formatter: PatternFormatter) {
        *self.formatter.write() = formatter;
    }

    pub fn pattern(&self) -> String {
        self.formatter.read().pattern().to_string()
    }

    /// Render a record followed by a newline
    pub fn format_line(&self, record: &LogRecord) -> String {
        let mut line = String::with_capacity(record.message.len() + 64);
        self.formatter.read().format_into(record, &mut line);
        line.push('\n');
        line
    }
}

impl Default for SinkBase {
    fn default() -> Self {
        Self::new()
    }
}
