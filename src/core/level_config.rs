//! Level configuration from strings and the environment
//!
//! Syntax: comma separated entries, each either a bare level (the global
//! level) or `logger_name=level`. Example: `warn,db=trace,http=info`.

use super::{
    error::{LoggerError, Result},
    log_level::LogLevel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Environment variable read by [`LevelConfig::from_env`]
pub const LEVEL_ENV_VAR: &str = "ASYNC_LOGGER_LEVEL";

/// Global level plus per-logger overrides
///
/// # Example
///
/// ```
/// use rust_async_logger::{LevelConfig, LogLevel};
///
/// let config = LevelConfig::parse("warn,db=trace").unwrap();
/// assert_eq!(config.level_for("db"), Some(LogLevel::Trace));
/// assert_eq!(config.level_for("http"), Some(LogLevel::Warn));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub global: Option<LogLevel>,
    #[serde(default)]
    pub loggers: HashMap<String, LogLevel>,
}

impl LevelConfig {
    /// Parse a level specification.
    ///
    /// Blank entries are skipped. A later entry for the same target wins.
    ///
    /// # Errors
    ///
    /// `Configuration` for an unknown level name or an empty logger name.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut config = Self::default();

        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.split_once('=') {
                Some((name, level)) => {
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(LoggerError::config(
                            "LevelConfig",
                            format!("missing logger name in '{}'", entry),
                        ));
                    }
                    config.loggers.insert(name.to_string(), parse_level(level)?);
                }
                None => config.global = Some(parse_level(entry)?),
            }
        }

        Ok(config)
    }

    /// Read [`LEVEL_ENV_VAR`]. `Ok(None)` if it is unset.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_env_var(LEVEL_ENV_VAR)
    }

    pub fn from_env_var(var: &str) -> Result<Option<Self>> {
        match std::env::var(var) {
            Ok(value) => Self::parse(&value).map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(LoggerError::config(
                "LevelConfig",
                format!("{} is not valid unicode", var),
            )),
        }
    }

    /// Level for a logger: its override if present, the global level otherwise
    pub fn level_for(&self, name: &str) -> Option<LogLevel> {
        self.loggers.get(name).copied().or(self.global)
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.loggers.is_empty()
    }

    /// Overlay `other` on top of this configuration
    pub fn merge(&mut self, other: LevelConfig) {
        if other.global.is_some() {
            self.global = other.global;
        }
        self.loggers.extend(other.loggers);
    }
}

fn parse_level(value: &str) -> Result<LogLevel> {
    value
        .parse::<LogLevel>()
        .map_err(|e: String| LoggerError::config("LevelConfig", e))
}
