//! Sinks shared by the integration tests

#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use rust_async_logger::prelude::*;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Records every message it receives
#[derive(Default)]
pub struct CaptureSink {
    base: SinkBase,
    name: String,
    messages: Mutex<Vec<String>>,
    flushes: AtomicUsize,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::named("capture")
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Sink for CaptureSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        self.messages.lock().push(record.message.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
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
        &self.name
    }
}

/// Captures messages, but blocks the writing thread on the message `"gate"`
/// until [`GateSink::release`] is called. Lets tests hold a pool worker
/// while they fill the queue.
pub struct GateSink {
    base: SinkBase,
    messages: Mutex<Vec<String>>,
    entered_tx: Sender<()>,
    entered_rx: Receiver<()>,
    release_tx: Sender<()>,
    release_rx: Receiver<()>,
}

pub const GATE: &str = "gate";

impl GateSink {
    pub fn new() -> Self {
        let (entered_tx, entered_rx) = unbounded();
        let (release_tx, release_rx) = unbounded();
        Self {
            base: SinkBase::new(),
            messages: Mutex::new(Vec::new()),
            entered_tx,
            entered_rx,
            release_tx,
            release_rx,
        }
    }

    /// Wait until a worker is blocked inside the gate
    pub fn wait_entered(&self) {
        self.entered_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker never reached the gate");
    }

    pub fn release(&self) {
        self.release_tx.send(()).expect("gate channel closed");
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Sink for GateSink {
    fn log(&self, record: &LogRecord) -> Result<()> {
        if record.message == GATE {
            let _ = self.entered_tx.send(());
            let _ = self.release_rx.recv();
        }
        self.messages.lock().push(record.message.clone());
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
        "gate"
    }
}

/// Fails every write and flush with an I/O error
#[derive(Default)]
pub struct FailingSink {
    base: SinkBase,
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Sink for FailingSink {
    fn log(&self, _record: &LogRecord) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(LoggerError::sink_io(
            self.name(),
            io::Error::new(io::ErrorKind::Other, "disk on fire"),
        ))
    }

    fn flush(&self) -> Result<()> {
        Err(LoggerError::sink_io(
            self.name(),
            io::Error::new(io::ErrorKind::Other, "disk on fire"),
        ))
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
        "failing"
    }
}

/// Panics on every write
#[derive(Default)]
pub struct PanickingSink {
    base: SinkBase,
}

impl Sink for PanickingSink {
    fn log(&self, _record: &LogRecord) -> Result<()> {
        panic!("sink exploded");
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
        "panicking"
    }
}
