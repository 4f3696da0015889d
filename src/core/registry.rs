//! Named-logger directory plus one default logger
//!
//! [`Registry`] is an ordinary value so tests and embedders can create
//! isolated instances; [`global()`] hands out a lazily created process-wide
//! one for code that wants ambient access.

use super::{
    error::{LoggerError, Result},
    level_config::LevelConfig,
    log_level::LogLevel,
    logger::Logger,
    overflow_policy::OverflowPolicy,
    periodic::PeriodicWorker,
    sink::SinkPtr,
    thread_pool::{ThreadPool, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKER_COUNT},
};
#[cfg(feature = "console")]
use crate::sinks::{ColorMode, ConsoleSink};
use crate::sinks::{BasicFileSink, DailyFileSink, RotatingFileSink};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// What [`Registry::register`] does when the name is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// Reject with [`LoggerError::DuplicateName`]
    #[default]
    FailOnDuplicate,
    /// Replace the existing entry
    Overwrite,
}

#[derive(Default)]
struct RegistryState {
    loggers: HashMap<String, Arc<Logger>>,
    default_logger: Option<Arc<Logger>>,
    levels: LevelConfig,
    flush_level: Option<LogLevel>,
    shut_down: bool,
}

impl RegistryState {
    fn snapshot(&self) -> Vec<Arc<Logger>> {
        self.loggers.values().cloned().collect()
    }
}

/// Process-wide mapping from logger name to shared logger
///
/// # Example
///
/// ```
/// use rust_async_logger::prelude::*;
/// use std::sync::Arc;
///
/// let registry = Registry::new();
/// let logger = registry.create("svc", [Arc::new(NullSink::new()) as SinkPtr]).unwrap();
/// assert!(registry.get("svc").is_some());
///
/// let err = registry.register(logger).unwrap_err();
/// assert!(matches!(err, LoggerError::DuplicateName { .. }));
///
/// registry.drop_logger("svc");
/// assert!(registry.get("svc").is_none());
/// ```
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
    policy: RegistrationPolicy,
    thread_pool: Mutex<Option<Arc<ThreadPool>>>,
    flusher: Mutex<Option<PeriodicWorker>>,
}

impl Registry {
    /// Registry whose default logger writes to stdout
    pub fn new() -> Self {
        Self::with_policy(RegistrationPolicy::default())
    }

    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        let default_logger = Arc::new(Logger::new("", [default_sink()]));
        let mut state = RegistryState::default();
        state
            .loggers
            .insert(default_logger.name().to_string(), Arc::clone(&default_logger));
        state.default_logger = Some(default_logger);

        Self {
            state: Arc::new(RwLock::new(state)),
            policy,
            thread_pool: Mutex::new(None),
            flusher: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    /// Add a logger under its name.
    ///
    /// Overwriting the default logger's name also makes the new logger the
    /// default. Levels remembered from [`set_level`](Self::set_level),
    /// [`apply_levels`](Self::apply_levels) and [`flush_on`](Self::flush_on)
    /// are applied to it.
    ///
    /// # Errors
    ///
    /// `DuplicateName` if the name is taken and the policy is
    /// `FailOnDuplicate`; `Shutdown` after [`shutdown`](Self::shutdown).
    pub fn register(&self, logger: Arc<Logger>) -> Result<()> {
        let mut state = self.state.write();
        if state.shut_down {
            return Err(LoggerError::shutdown("Registry"));
        }
        if self.policy == RegistrationPolicy::FailOnDuplicate
            && state.loggers.contains_key(logger.name())
        {
            return Err(LoggerError::duplicate_name(logger.name()));
        }

        if let Some(level) = state.levels.level_for(logger.name()) {
            logger.set_level(level);
        }
        if let Some(flush_level) = state.flush_level {
            logger.flush_on(flush_level);
        }
        if state
            .default_logger
            .as_ref()
            .is_some_and(|default| default.name() == logger.name())
        {
            state.default_logger = Some(Arc::clone(&logger));
        }
        state.loggers.insert(logger.name().to_string(), logger);
        Ok(())
    }

    /// Look up a logger. A missing name is `None`, never an error.
    pub fn get(&self, name: &str) -> Option<Arc<Logger>> {
        self.state.read().loggers.get(name).cloned()
    }

    /// Remove a logger. The logger itself is not flushed or shut down.
    ///
    /// Removing the default logger's name also clears the default.
    pub fn drop_logger(&self, name: &str) -> Option<Arc<Logger>> {
        let mut state = self.state.write();
        let removed = state.loggers.remove(name);
        if state
            .default_logger
            .as_ref()
            .is_some_and(|default| default.name() == name)
        {
            state.default_logger = None;
        }
        removed
    }

    /// Remove every logger, including the default
    pub fn drop_all(&self) {
        let mut state = self.state.write();
        state.loggers.clear();
        state.default_logger = None;
    }

    /// Replace the default logger.
    ///
    /// The previous default's name is unregistered and the new default is
    /// registered under its own name, replacing any existing entry.
    pub fn set_default(&self, logger: Arc<Logger>) -> Result<()> {
        let mut state = self.state.write();
        if state.shut_down {
            return Err(LoggerError::shutdown("Registry"));
        }
        if let Some(previous) = state.default_logger.take() {
            state.loggers.remove(previous.name());
        }
        state
            .loggers
            .insert(logger.name().to_string(), Arc::clone(&logger));
        state.default_logger = Some(logger);
        Ok(())
    }

    /// `None` after the default was dropped or the registry shut down
    pub fn default_logger(&self) -> Option<Arc<Logger>> {
        self.state.read().default_logger.clone()
    }

    /// Build a synchronous logger and register it
    pub fn create(
        &self,
        name: impl Into<String>,
        sinks: impl IntoIterator<Item = SinkPtr>,
    ) -> Result<Arc<Logger>> {
        let logger = Arc::new(Logger::new(name, sinks));
        self.register(Arc::clone(&logger))?;
        Ok(logger)
    }

    /// Build an asynchronous logger on the registry's shared thread pool and
    /// register it. The pool is created with default settings on first use
    /// unless [`init_thread_pool`](Self::init_thread_pool) was called.
    pub fn create_async(
        &self,
        name: impl Into<String>,
        sinks: impl IntoIterator<Item = SinkPtr>,
        policy: OverflowPolicy,
    ) -> Result<Arc<Logger>> {
        let pool = self.shared_thread_pool()?;
        let logger = Arc::new(Logger::new_async(name, sinks, pool, policy));
        self.register(Arc::clone(&logger))?;
        Ok(logger)
    }

    /// Create and register a logger writing to a single file
    pub fn basic_logger(
        &self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        truncate: bool,
    ) -> Result<Arc<Logger>> {
        let sink: SinkPtr = Arc::new(BasicFileSink::new(path, truncate)?);
        self.create(name, [sink])
    }

    /// Create and register a logger writing to a size-rotated file
    pub fn rotating_logger(
        &self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        max_size: u64,
        max_files: usize,
    ) -> Result<Arc<Logger>> {
        let sink: SinkPtr = Arc::new(RotatingFileSink::new(path, max_size, max_files)?);
        self.create(name, [sink])
    }

    /// Create and register a logger writing to a file that rolls over daily
    /// at `hour:minute` local time
    pub fn daily_logger(
        &self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        hour: u32,
        minute: u32,
    ) -> Result<Arc<Logger>> {
        let sink: SinkPtr = Arc::new(DailyFileSink::new(path, hour, minute)?);
        self.create(name, [sink])
    }

    #[cfg(feature = "console")]
    pub fn stdout_logger(&self, name: impl Into<String>, mode: ColorMode) -> Result<Arc<Logger>> {
        let sink: SinkPtr = Arc::new(ConsoleSink::stdout(mode));
        self.create(name, [sink])
    }

    #[cfg(feature = "console")]
    pub fn stderr_logger(&self, name: impl Into<String>, mode: ColorMode) -> Result<Arc<Logger>> {
        let sink: SinkPtr = Arc::new(ConsoleSink::stderr(mode));
        self.create(name, [sink])
    }

    /// Replace the shared thread pool used by [`create_async`](Self::create_async).
    ///
    /// Loggers created earlier keep the pool they were built with.
    pub fn init_thread_pool(&self, queue_capacity: usize, worker_count: usize) -> Result<()> {
        if self.state.read().shut_down {
            return Err(LoggerError::shutdown("Registry"));
        }
        let pool = Arc::new(ThreadPool::new(queue_capacity, worker_count)?);

        let mut slot = self.thread_pool.lock();
        if self.state.read().shut_down {
            drop(slot);
            pool.shutdown();
            return Err(LoggerError::shutdown("Registry"));
        }
        *slot = Some(pool);
        Ok(())
    }

    pub fn thread_pool(&self) -> Option<Arc<ThreadPool>> {
        self.thread_pool.lock().clone()
    }

    fn shared_thread_pool(&self) -> Result<Arc<ThreadPool>> {
        // `shutdown` marks the state before emptying the slot, so checking
        // under the slot lock means no pool is stored after it ran.
        let mut slot = self.thread_pool.lock();
        if self.state.read().shut_down {
            return Err(LoggerError::shutdown("Registry"));
        }
        match slot.as_ref() {
            Some(pool) => Ok(Arc::clone(pool)),
            None => {
                let pool = Arc::new(ThreadPool::new(
                    DEFAULT_QUEUE_CAPACITY,
                    DEFAULT_WORKER_COUNT,
                )?);
                *slot = Some(Arc::clone(&pool));
                Ok(pool)
            }
        }
    }

    /// Set the level of every registered logger and of loggers registered later.
    ///
    /// Per-logger overrides from an earlier [`apply_levels`](Self::apply_levels)
    /// are discarded.
    pub fn set_level(&self, level: LogLevel) {
        let loggers = {
            let mut state = self.state.write();
            state.levels = LevelConfig {
                global: Some(level),
                loggers: HashMap::new(),
            };
            state.snapshot()
        };
        for logger in loggers {
            logger.set_level(level);
        }
    }

    /// Apply global and per-logger levels, and remember them for loggers
    /// registered later
    pub fn apply_levels(&self, config: LevelConfig) {
        let (levels, loggers) = {
            let mut state = self.state.write();
            state.levels.merge(config);
            (state.levels.clone(), state.snapshot())
        };
        for logger in loggers {
            if let Some(level) = levels.level_for(logger.name()) {
                logger.set_level(level);
            }
        }
    }

    /// Apply levels from the `ASYNC_LOGGER_LEVEL` environment variable, if set
    pub fn load_env_levels(&self) -> Result<()> {
        if let Some(config) = LevelConfig::from_env()? {
            self.apply_levels(config);
        }
        Ok(())
    }

    pub fn flush_on(&self, level: LogLevel) {
        let loggers = {
            let mut state = self.state.write();
            state.flush_level = Some(level);
            state.snapshot()
        };
        for logger in loggers {
            logger.flush_on(level);
        }
    }

    /// Run `f` on every registered logger.
    ///
    /// `f` runs without the registry lock held, so it may call back into the
    /// registry.
    pub fn apply_all<F>(&self, f: F)
    where
        F: Fn(&Arc<Logger>),
    {
        let loggers = self.state.read().snapshot();
        for logger in &loggers {
            f(logger);
        }
    }

    /// Flush every registered logger. Async loggers only enqueue the flush.
    pub fn flush_all(&self) {
        let loggers = self.state.read().snapshot();
        flush_loggers(&loggers);
    }

    /// Flush every registered logger from a background thread every `interval`.
    ///
    /// Calling it again replaces the previous flusher.
    pub fn flush_every(&self, interval: Duration) -> Result<()> {
        if self.state.read().shut_down {
            return Err(LoggerError::shutdown("Registry"));
        }
        let state = Arc::clone(&self.state);
        let worker = PeriodicWorker::start("logger-flusher", interval, move || {
            let loggers = state.read().snapshot();
            flush_loggers(&loggers);
        })?;

        let previous = self.flusher.lock().replace(worker);
        drop(previous);
        Ok(())
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.read().shut_down
    }

    /// Flush everything, stop the periodic flusher, drop all loggers and shut
    /// the shared thread pool down, draining its queue.
    ///
    /// Afterwards `register` fails with `Shutdown` and `get` returns `None`.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) {
        if self.state.read().shut_down {
            return;
        }

        self.flush_all();
        let flusher = self.flusher.lock().take();
        drop(flusher);

        {
            let mut state = self.state.write();
            state.shut_down = true;
            state.loggers.clear();
            state.default_logger = None;
        }

        let pool = self.thread_pool.lock().take();
        if let Some(pool) = pool {
            if !pool.shutdown() {
                eprintln!("[LOGGER WARNING] Registry thread pool did not shut down cleanly");
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Registry")
            .field("policy", &self.policy)
            .field("loggers", &state.loggers.len())
            .field("shut_down", &state.shut_down)
            .finish()
    }
}

fn flush_loggers(loggers: &[Arc<Logger>]) {
    for logger in loggers {
        if let Err(e) = logger.flush() {
            logger.report_error(&e);
        }
    }
}

#[cfg(feature = "console")]
fn default_sink() -> SinkPtr {
    Arc::new(ConsoleSink::stdout(ColorMode::Automatic))
}

#[cfg(not(feature = "console"))]
fn default_sink() -> SinkPtr {
    Arc::new(crate::sinks::NullSink::new())
}

/// Process-wide registry, created on first use
pub fn global() -> &'static Registry {
    static GLOBAL: OnceLock<Registry> = OnceLock::new();
    GLOBAL.get_or_init(Registry::new)
}

/// Log through the [`global()`] registry's default logger.
///
/// Does nothing when there is no default logger.
pub fn log(level: LogLevel, message: impl Into<String>) {
    if let Some(logger) = global().default_logger() {
        logger.log(level, message);
    }
}

pub fn trace(message: impl Into<String>) {
    log(LogLevel::Trace, message);
}

pub fn debug(message: impl Into<String>) {
    log(LogLevel::Debug, message);
}

pub fn info(message: impl Into<String>) {
    log(LogLevel::Info, message);
}

pub fn warn(message: impl Into<String>) {
    log(LogLevel::Warn, message);
}

pub fn error(message: impl Into<String>) {
    log(LogLevel::Error, message);
}

pub fn critical(message: impl Into<String>) {
    log(LogLevel::Critical, message);
}
