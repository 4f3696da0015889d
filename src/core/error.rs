//! Error types for the logger system

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Invalid construction parameters
    #[error("Invalid configuration for {component}: {message}")]
    Configuration { component: String, message: String },

    /// Registry name collision
    #[error("Logger with name '{name}' already exists")]
    DuplicateName { name: String },

    /// Operation attempted after teardown
    #[error("{component} has been shut down")]
    Shutdown { component: String },

    /// A single sink's underlying write or flush failed
    #[error("Sink '{sink}' I/O failure: {source}")]
    SinkIo {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// A sink panicked while handling a record
    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Bounded wait for queue space expired and the job was discarded
    #[error("Log queue full ({capacity} jobs), message discarded after bounded wait")]
    QueueFull { capacity: usize },

    /// Acknowledged flush did not complete in time
    #[error("Flush was not acknowledged within {timeout:?}")]
    FlushTimeout { timeout: Duration },
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_name(name: impl Into<String>) -> Self {
        LoggerError::DuplicateName { name: name.into() }
    }

    pub fn shutdown(component: impl Into<String>) -> Self {
        LoggerError::Shutdown {
            component: component.into(),
        }
    }

    /// Create a sink I/O error
    pub fn sink_io(sink: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::SinkIo {
            sink: sink.into(),
            source,
        }
    }

    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn queue_full(capacity: usize) -> Self {
        LoggerError::QueueFull { capacity }
    }

    /// Returns true for errors that mean a record never reached the sinks
    #[must_use]
    pub fn is_message_loss(&self) -> bool {
        matches!(
            self,
            LoggerError::QueueFull { .. } | LoggerError::Shutdown { .. }
        )
    }
}
