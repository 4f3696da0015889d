//! Size-based rotating file sink
//!
//! `app.log` is the active file. When a write would push it past `max_size`
//! it becomes `app.log.1`, the previous `app.log.1` becomes `app.log.2`, and
//! so on up to `app.log.<max_files>`; the oldest backup is deleted.

use super::open_log_file;
use crate::core::{LogLevel, LogRecord, LoggerError, PatternFormatter, Result, Sink, SinkBase};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Upper bound on retained backups
pub const MAX_ROTATING_FILES: usize = 200_000;

struct RotationState {
    writer: BufWriter<File>,
    current_size: u64,
}

pub struct RotatingFileSink {
    base: SinkBase,
    base_path: PathBuf,
    max_size: u64,
    max_files: usize,
    state: Mutex<RotationState>,
}

impl RotatingFileSink {
    /// Create a rotating sink writing to `path`.
    ///
    /// `max_files == 0` keeps no backups: the active file is truncated when
    /// it fills up.
    ///
    /// # Errors
    ///
    /// `Configuration` if `max_size` is zero or `max_files` exceeds
    /// [`MAX_ROTATING_FILES`]; `IoOperation` if the file cannot be opened.
    pub fn new(path: impl Into<PathBuf>, max_size: u64, max_files: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(LoggerError::config(
                "RotatingFileSink",
                "max_size must be greater than zero",
            ));
        }
        if max_files > MAX_ROTATING_FILES {
            return Err(LoggerError::config(
                "RotatingFileSink",
                format!("max_files must not exceed {}", MAX_ROTATING_FILES),
            ));
        }

        let base_path = path.into();
        let file = open_log_file(&base_path, false)?;
        // Resume size tracking for an existing file
        let current_size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            base: SinkBase::new(),
            base_path,
            max_size,
            max_files,
            state: Mutex::new(RotationState {
                writer: BufWriter::new(file),
                current_size,
            }),
        })
    }

    pub fn filename(&self) -> &Path {
        &self.base_path
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    /// Bytes written to the active file
    pub fn current_size(&self) -> u64 {
        self.state.lock().current_size
    }

    /// Path of backup number `index`; index 0 is the active file
    pub fn backup_path(&self, index: usize) -> PathBuf {
        if index == 0 {
            return self.base_path.clone();
        }
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn rotate(&self, state: &mut RotationState) -> Result<()> {
        state
            .writer
            .flush()
            .map_err(|e| LoggerError::sink_io(self.name(), e))?;

        if self.max_files > 0 {
            let oldest = self.backup_path(self.max_files);
            if oldest.exists() {
                fs::remove_file(&oldest).map_err(|e| {
                    LoggerError::io_operation(
                        "rotating log file",
                        format!("Failed to remove oldest backup '{}'", oldest.display()),
                        e,
                    )
                })?;
            }

            for i in (1..=self.max_files).rev() {
                let from = self.backup_path(i - 1);
                if from.exists() {
                    rename_replacing(&from, &self.backup_path(i))?;
                }
            }
        }

        let file = open_log_file(&self.base_path, true)?;
        state.writer = BufWriter::new(file);
        state.current_size = 0;
        Ok(())
    }
}

/// Rename, replacing `to` on platforms where rename refuses to overwrite
fn rename_replacing(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if to.exists() {
        // Best effort; the retried rename reports the real failure
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to).map_err(|e| {
        LoggerError::io_operation(
            "rotating log file",
            format!("Failed to rename '{}' to '{}'", from.display(), to.display()),
            e,
        )
    })
}

impl Sink for RotatingFileSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let line = self.base.format_line(record);
        let len = line.len() as u64;
        let mut state = self.state.lock();

        let mut rotation_error = None;
        if state.current_size > 0 && state.current_size + len > self.max_size {
            if let Err(e) = self.rotate(&mut state) {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed for '{}': {}. Continuing with current file.",
                    self.base_path.display(),
                    e
                );
                // Write to the active path again; keep the old handle if even that fails
                if let Ok(file) = open_log_file(&self.base_path, false) {
                    state.writer = BufWriter::new(file);
                }
                // Allow the file to grow past the limit instead of retrying every write
                state.current_size = 0;
                rotation_error = Some(e);
            }
        }

        state
            .writer
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::sink_io(self.name(), e))?;
        state.current_size += len;

        match rotation_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn flush(&self) -> Result<()> {
        self.state
            .lock()
            .writer
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
        "rotating_file"
    }
}

impl std::fmt::Debug for RotatingFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileSink")
            .field("path", &self.base_path)
            .field("max_size", &self.max_size)
            .field("max_files", &self.max_files)
            .field("level", &self.base.level())
            .finish()
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        let _ = self.state.get_mut().writer.flush();
    }
}
