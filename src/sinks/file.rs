//! Basic file sink

use super::open_log_file;
use crate::core::{LogLevel, LogRecord, LoggerError, PatternFormatter, Result, Sink, SinkBase};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends formatted records to one file
pub struct BasicFileSink {
    base: SinkBase,
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl BasicFileSink {
    /// Open `path`, creating it and its parent directories if needed.
    /// With `truncate` an existing file is emptied first.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or opened
    pub fn new(path: impl Into<PathBuf>, truncate: bool) -> Result<Self> {
        let path = path.into();
        let file = open_log_file(&path, truncate)?;

        Ok(Self {
            base: SinkBase::new(),
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn filename(&self) -> &Path {
        &self.path
    }
}

impl Sink for BasicFileSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let line = self.base.format_line(record);
        self.writer
            .lock()
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::sink_io(self.name(), e))
    }

    fn flush(&self) -> Result<()> {
        self.writer
            .lock()
            .flush()
            .map_err(|e| LoggerError::sink_io(self.name(), e))
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
        "basic_file"
    }
}

impl std::fmt::Debug for BasicFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicFileSink")
            .field("path", &self.path)
            .field("level", &self.base.level())
            .finish()
    }
}

impl Drop for BasicFileSink {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.writer.get_mut().flush();
    }
}
