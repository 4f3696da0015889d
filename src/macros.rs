//! Logging macros for ergonomic log message formatting.
//!
//! These macros provide a convenient interface for logging with automatic
//! string formatting, similar to `println!` and `format!`. The level check
//! runs before the message is formatted, and the call site is attached to
//! the record.
//!
//! # Examples
//!
//! ```
//! use rust_async_logger::prelude::*;
//! use rust_async_logger::info;
//!
//! let logger = Logger::builder("app").sink(NullSink::new()).build();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").sink(NullSink::new()).build();
/// use rust_async_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.should_log(level) {
            logger.log_with_location(
                $crate::SourceLocation::new(file!(), line!(), module_path!()),
                level,
                format!($($arg)+),
            );
        }
    }};
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").sink(NullSink::new()).level(LogLevel::Trace).build();
/// use rust_async_logger::trace;
/// trace!(logger, "Entering function: calculate()");
/// trace!(logger, "Variable value: {}", 42);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").sink(NullSink::new()).build();
/// use rust_async_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_async_logger::prelude::*;
/// # let logger = Logger::builder("app").sink(NullSink::new()).build();
/// use rust_async_logger::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{
        LogLevel, LogRecord, Logger, PatternFormatter, Result, Sink, SinkBase, SinkPtr,
    };
    use parking_lot::Mutex;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CaptureSink {
        base: SinkBase,
        records: Mutex<Vec<LogRecord>>,
    }

    impl Sink for CaptureSink {
        fn log(&self, record: &LogRecord) -> Result<()> {
            self.records.lock().push(record.clone());
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
            "capture"
        }
    }

    struct CountingDisplay(Arc<AtomicUsize>);

    impl fmt::Display for CountingDisplay {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fetch_add(1, Ordering::SeqCst);
            write!(f, "counted")
        }
    }

    fn capture_logger() -> (Logger, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::default());
        let logger = Logger::new("macros", [sink.clone() as SinkPtr]);
        logger.set_level(LogLevel::Trace);
        (logger, sink)
    }

    #[test]
    fn test_every_level_macro() {
        let (logger, sink) = capture_logger();
        trace!(logger, "t {}", 1);
        debug!(logger, "d {}", 2);
        info!(logger, "i {}", 3);
        warn!(logger, "w {}", 4);
        error!(logger, "e {}", 5);
        critical!(logger, "c {}", 6);

        let records = sink.records.lock();
        let levels: Vec<_> = records.iter().map(|r| r.level).collect();
        assert_eq!(
            levels,
            vec![
                LogLevel::Trace,
                LogLevel::Debug,
                LogLevel::Info,
                LogLevel::Warn,
                LogLevel::Error,
                LogLevel::Critical,
            ]
        );
        assert_eq!(records[2].message, "i 3");
    }

    #[test]
    fn test_macro_attaches_source_location() {
        let (logger, sink) = capture_logger();
        info!(logger, "here");
        let records = sink.records.lock();
        let source = records[0].source.expect("source location");
        assert!(source.file.ends_with("macros.rs"));
        assert!(source.module_path.ends_with("macros::tests"));
        assert!(source.line > 0);
    }

    #[test]
    fn test_filtered_macro_does_not_format() {
        let (logger, sink) = capture_logger();
        logger.set_level(LogLevel::Error);
        let count = Arc::new(AtomicUsize::new(0));

        debug!(logger, "{}", CountingDisplay(Arc::clone(&count)));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        error!(logger, "{}", CountingDisplay(Arc::clone(&count)));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(sink.records.lock().len(), 1);
    }

    #[test]
    fn test_macro_accepts_shared_logger() {
        let (logger, sink) = capture_logger();
        let shared = Arc::new(logger);
        info!(shared, "through arc");
        assert_eq!(sink.records.lock()[0].message, "through arc");
    }
}
