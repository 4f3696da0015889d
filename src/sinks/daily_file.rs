//! Daily file sink
//!
//! Writes to `<stem>_<YYYY-MM-DD>.<ext>` and switches to a new file at a
//! fixed local time of day. Optionally keeps only the newest `max_files`.

use super::open_log_file;
use crate::core::{LogLevel, LogRecord, LoggerError, PatternFormatter, Result, Sink, SinkBase};
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDate, TimeZone, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

struct DailyState {
    writer: BufWriter<File>,
    current_path: PathBuf,
    next_rotation: DateTime<Utc>,
    /// Files written by this sink, oldest first
    history: VecDeque<PathBuf>,
}

pub struct DailyFileSink {
    base: SinkBase,
    base_path: PathBuf,
    rotation_hour: u32,
    rotation_minute: u32,
    max_files: u16,
    state: Mutex<DailyState>,
}

impl DailyFileSink {
    /// Create a sink that rolls over every day at `hour:minute` local time
    /// and keeps every file.
    pub fn new(path: impl Into<PathBuf>, hour: u32, minute: u32) -> Result<Self> {
        Self::with_max_files(path, hour, minute, 0)
    }

    /// Like [`new`](Self::new), deleting the oldest files so that at most
    /// `max_files` remain. Zero keeps everything.
    ///
    /// # Errors
    ///
    /// `Configuration` if `hour > 23` or `minute > 59`; `IoOperation` if the
    /// first file cannot be opened.
    pub fn with_max_files(
        path: impl Into<PathBuf>,
        hour: u32,
        minute: u32,
        max_files: u16,
    ) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(LoggerError::config(
                "DailyFileSink",
                format!("invalid rotation time {:02}:{:02}", hour, minute),
            ));
        }

        let base_path = path.into();
        let now = Local::now();
        let current_path = dated_filename(&base_path, now.date_naive());
        let file = open_log_file(&current_path, false)?;

        let mut history = VecDeque::new();
        if max_files > 0 {
            // Pick up files from earlier days so retention covers them too
            for days_back in (1..u64::from(max_files)).rev() {
                if let Some(date) = now.date_naive().checked_sub_days(chrono::Days::new(days_back)) {
                    let previous = dated_filename(&base_path, date);
                    if previous.exists() {
                        history.push_back(previous);
                    }
                }
            }
        }
        history.push_back(current_path.clone());

        let next_rotation = next_rotation_after(now, hour, minute);

        Ok(Self {
            base: SinkBase::new(),
            base_path,
            rotation_hour: hour,
            rotation_minute: minute,
            max_files,
            state: Mutex::new(DailyState {
                writer: BufWriter::new(file),
                current_path,
                next_rotation,
                history,
            }),
        })
    }

    /// File currently being written
    pub fn filename(&self) -> PathBuf {
        self.state.lock().current_path.clone()
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn rotation_time(&self) -> (u32, u32) {
        (self.rotation_hour, self.rotation_minute)
    }

    pub fn max_files(&self) -> u16 {
        self.max_files
    }

    fn rotate(&self, state: &mut DailyState, at: DateTime<Local>) -> Result<()> {
        state
            .writer
            .flush()
            .map_err(|e| LoggerError::sink_io(self.name(), e))?;

        let path = dated_filename(&self.base_path, at.date_naive());
        let file = open_log_file(&path, false)?;
        state.writer = BufWriter::new(file);
        state.current_path = path.clone();
        if state.history.back() != Some(&path) {
            state.history.push_back(path);
        }

        if self.max_files > 0 {
            while state.history.len() > usize::from(self.max_files) {
                if let Some(old) = state.history.pop_front() {
                    if let Err(e) = fs::remove_file(&old) {
                        if e.kind() != std::io::ErrorKind::NotFound {
                            eprintln!(
                                "[LOGGER WARNING] Failed to remove old log file {}: {}",
                                old.display(),
                                e
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// `<stem>_<YYYY-MM-DD>.<ext>`, or `<stem>_<YYYY-MM-DD>` without an extension
pub fn dated_filename(base: &Path, date: NaiveDate) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("app");
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, date.format("%Y-%m-%d"), ext),
        None => format!("{}_{}", stem, date.format("%Y-%m-%d")),
    };
    base.with_file_name(name)
}

/// First `hour:minute` local time strictly after `now`
fn next_rotation_after(now: DateTime<Local>, hour: u32, minute: u32) -> DateTime<Utc> {
    let today = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest());

    match today {
        Some(candidate) if candidate > now => candidate.with_timezone(&Utc),
        Some(candidate) => (candidate + ChronoDuration::days(1)).with_timezone(&Utc),
        // The wall-clock time does not exist today (DST gap)
        None => (now + ChronoDuration::days(1)).with_timezone(&Utc),
    }
}

impl Sink for DailyFileSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let line = self.base.format_line(record);
        let mut state = self.state.lock();

        if record.timestamp >= state.next_rotation {
            let local = record.timestamp.with_timezone(&Local);
            state.next_rotation = next_rotation_after(local, self.rotation_hour, self.rotation_minute);
            if let Err(e) = self.rotate(&mut state, local) {
                eprintln!(
                    "[LOGGER WARNING] Daily rotation failed for '{}': {}. Continuing with current file.",
                    self.base_path.display(),
                    e
                );
                state
                    .writer
                    .write_all(line.as_bytes())
                    .map_err(|e| LoggerError::sink_io(self.name(), e))?;
                return Err(e);
            }
        }

        state
            .writer
            .write_all(line.as_bytes())
            .map_err(|e| LoggerError::sink_io(self.name(), e))
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
        "daily_file"
    }
}

impl std::fmt::Debug for DailyFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DailyFileSink")
            .field("base_path", &self.base_path)
            .field("rotation_time", &(self.rotation_hour, self.rotation_minute))
            .field("max_files", &self.max_files)
            .finish()
    }
}

impl Drop for DailyFileSink {
    fn drop(&mut self) {
        let _ = self.state.get_mut().writer.flush();
    }
}
