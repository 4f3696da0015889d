//! Sink that discards everything

use crate::core::{LogLevel, LogRecord, PatternFormatter, Result, Sink, SinkBase};

/// Accepts every record and writes nothing. Useful for benchmarks and as a
/// placeholder target.
#[derive(Debug, Default)]
pub struct NullSink {
    base: SinkBase,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for NullSink {
    fn log(&self, _record: &LogRecord) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn level(&self) -> LogLevel {
        self.base.level()
    }

    fn set_level(&self, level: LogLevel) {
        self.base.set_level(level);
    }

    fn set_formatter(&self, formatter: PatternFormatter) {
        self.base.set_formatter(formatter);
    }

    fn name(&self) -> &str {
        "null"
    }
}
