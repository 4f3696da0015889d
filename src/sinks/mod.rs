//! Sink implementations

#[cfg(feature = "console")]
pub mod console;
pub mod daily_file;
pub mod file;
pub mod null;
pub mod rotating_file;

#[cfg(feature = "console")]
pub use console::{ColorMode, ConsoleSink, ConsoleTarget};
pub use daily_file::DailyFileSink;
pub use file::BasicFileSink;
pub use null::NullSink;
pub use rotating_file::RotatingFileSink;

pub use crate::core::{Sink, SinkBase, SinkPtr};

use crate::core::{LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// Open a log file for appending (or truncated), creating parent directories
pub(crate) fn open_log_file(path: &Path, truncate: bool) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            LoggerError::io_operation(
                "creating log directory",
                format!("Failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }

    options.open(path).map_err(|e| {
        LoggerError::io_operation(
            "opening log file",
            format!("Failed to open '{}'", path.display()),
            e,
        )
    })
}
