//! Pattern rendering for sink output
//!
//! Renders a record through a small, fixed set of `%` flags:
//!
//! | flag | output |
//! |------|--------|
//! | `%v` | message |
//! | `%n` | logger name |
//! | `%l` / `%L` | level / short level |
//! | `%t` | thread id |
//! | `%Y %m %d %H %M %S` | date and time fields |
//! | `%e` / `%f` | milliseconds / microseconds |
//! | `%s` / `%#` | source file / source line |
//! | `%%` | literal `%` |
//!
//! Unknown flags are copied to the output verbatim.

use super::log_record::LogRecord;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Default sink pattern: `[2025-01-08 10:30:45.123] [svc] [INFO] message`
pub const DEFAULT_PATTERN: &str = "[%Y-%m-%d %H:%M:%S.%e] [%n] [%l] %v";

/// Clock used when rendering time flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternTimeType {
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFormatter {
    pattern: String,
    time_type: PatternTimeType,
}

impl PatternFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self::with_time_type(pattern, PatternTimeType::Local)
    }

    pub fn with_time_type(pattern: impl Into<String>, time_type: PatternTimeType) -> Self {
        Self {
            pattern: pattern.into(),
            time_type,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn time_type(&self) -> PatternTimeType {
        self.time_type
    }

    /// Render a record into a new line (without trailing newline)
    pub fn format(&self, record: &LogRecord) -> String {
        let mut out = String::with_capacity(self.pattern.len() + record.message.len() + 48);
        self.format_into(record, &mut out);
        out
    }

    pub fn format_into(&self, record: &LogRecord, out: &mut String) {
        match self.time_type {
            PatternTimeType::Local => {
                self.render(record, &record.timestamp.with_timezone(&Local), out)
            }
            PatternTimeType::Utc => self.render(record, &record.timestamp, out),
        }
    }

    fn render<Tz: TimeZone>(&self, record: &LogRecord, time: &DateTime<Tz>, out: &mut String) {
        let mut chars = self.pattern.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            // Writing into a String cannot fail
            let _ = match chars.next() {
                Some('v') => out.write_str(&record.message),
                Some('n') => out.write_str(&record.logger_name),
                Some('l') => out.write_str(record.level.to_str()),
                Some('L') => out.write_str(record.level.short_str()),
                Some('t') => out.write_str(&record.thread_id),
                Some('Y') => write!(out, "{:04}", time.year()),
                Some('m') => write!(out, "{:02}", time.month()),
                Some('d') => write!(out, "{:02}", time.day()),
                Some('H') => write!(out, "{:02}", time.hour()),
                Some('M') => write!(out, "{:02}", time.minute()),
                Some('S') => write!(out, "{:02}", time.second()),
                Some('e') => write!(out, "{:03}", time.timestamp_subsec_millis() % 1000),
                Some('f') => write!(out, "{:06}", time.timestamp_subsec_micros() % 1_000_000),
                Some('s') => out.write_str(record.source.map(|s| s.file).unwrap_or_default()),
                Some('#') => match record.source {
                    Some(source) => write!(out, "{}", source.line),
                    None => Ok(()),
                },
                Some('%') => out.write_char('%'),
                Some(other) => {
                    out.push('%');
                    out.write_char(other)
                }
                None => out.write_char('%'),
            };
        }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}
