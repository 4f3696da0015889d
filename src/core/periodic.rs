//! Background thread running a callback at a fixed interval

use super::error::{LoggerError, Result};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Runs `callback` every `interval` until stopped or dropped
pub(crate) struct PeriodicWorker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicWorker {
    pub fn start<F>(name: &str, interval: Duration, callback: F) -> Result<Self>
    where
        F: Fn() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(LoggerError::config(
                "PeriodicWorker",
                "interval must be greater than zero",
            ));
        }

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut next = Instant::now() + interval;
                loop {
                    let wait = next.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            callback();
                            next += interval;
                        }
                        // Stop requested or the owner went away
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| {
                LoggerError::io_operation("starting periodic worker", name.to_string(), e)
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the channel
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                eprintln!("[LOGGER ERROR] Periodic worker panicked");
            }
        }
    }
}

impl Drop for PeriodicWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
