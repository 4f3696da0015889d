//! Console sink with optional colours

use crate::core::{LogLevel, LogRecord, LoggerError, PatternFormatter, Result, Sink, SinkBase};
use colored::Colorize;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{self, IsTerminal, Write};

/// When to colour console output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Always,
    /// Colour only when the target is a terminal
    #[default]
    Automatic,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    Stdout,
    Stderr,
}

/// Writes formatted records to stdout or stderr
///
/// Writes are serialized through an internal lock so lines from concurrent
/// loggers sharing the sink never interleave.
pub struct ConsoleSink {
    base: SinkBase,
    target: ConsoleTarget,
    use_colors: bool,
    write_lock: Mutex<()>,
}

impl ConsoleSink {
    pub fn new(target: ConsoleTarget, mode: ColorMode) -> Self {
        let use_colors = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Automatic => match target {
                ConsoleTarget::Stdout => io::stdout().is_terminal(),
                ConsoleTarget::Stderr => io::stderr().is_terminal(),
            },
        };

        Self {
            base: SinkBase::new(),
            target,
            use_colors,
            write_lock: Mutex::new(()),
        }
    }

    pub fn stdout(mode: ColorMode) -> Self {
        Self::new(ConsoleTarget::Stdout, mode)
    }

    pub fn stderr(mode: ColorMode) -> Self {
        Self::new(ConsoleTarget::Stderr, mode)
    }

    pub fn target(&self) -> ConsoleTarget {
        self.target
    }

    pub fn uses_colors(&self) -> bool {
        self.use_colors
    }

    fn render(&self, record: &LogRecord) -> String {
        let line = self.base.format_line(record);
        match (self.use_colors, record.level.color_code()) {
            (true, Some(color)) => {
                // Keep the newline outside the escape sequence
                let text = line.trim_end_matches('\n');
                format!("{}\n", text.color(color))
            }
            _ => line,
        }
    }

    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        let _guard = self.write_lock.lock();
        match self.target {
            ConsoleTarget::Stdout => io::stdout().lock().write_all(bytes),
            ConsoleTarget::Stderr => io::stderr().lock().write_all(bytes),
        }
    }
}

impl Sink for ConsoleSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        let output = self.render(record);
        self.write_bytes(output.as_bytes())
            .map_err(|e| LoggerError::sink_io(self.name(), e))
    }

    fn flush(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let result = match self.target {
            ConsoleTarget::Stdout => io::stdout().flush(),
            ConsoleTarget::Stderr => io::stderr().flush(),
        };
        result.map_err(|e| LoggerError::sink_io(self.name(), e))
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
        match self.target {
            ConsoleTarget::Stdout => "console_stdout",
            ConsoleTarget::Stderr => "console_stderr",
        }
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("target", &self.target)
            .field("use_colors", &self.use_colors)
            .field("level", &self.base.level())
            .finish()
    }
}
