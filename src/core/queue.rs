//! Bounded multi-producer multi-consumer blocking queue
//!
//! A `VecDeque` behind one mutex with `not_empty` / `not_full` condition
//! variables. Unlike a channel, the queue can evict or merge into an
//! arbitrary queued item, which `OverrunOldest` needs in order to skip
//! non-evictable jobs without waiting.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Why a push did not enqueue its item. The item is handed back.
#[derive(Debug)]
pub(crate) enum PushError<T> {
    Closed(T),
    Timeout(T),
}

#[derive(Debug)]
pub(crate) struct PushOutcome<T> {
    /// The queue was at capacity when the push arrived
    pub full: bool,
    /// The producer had to wait for space
    pub waited: bool,
    /// Item discarded by an overrun push: the oldest evictable queued item,
    /// or the pushed item itself when nothing queued could go
    pub evicted: Option<T>,
}

impl<T> PushOutcome<T> {
    fn accepted(full: bool, waited: bool) -> Self {
        Self {
            full,
            waited,
            evicted: None,
        }
    }

    fn discarded(item: T) -> Self {
        Self {
            full: true,
            waited: false,
            evicted: Some(item),
        }
    }
}

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

pub(crate) struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// `capacity` must be at least 1; callers validate it.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity >= 1);
        Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity.min(4096)),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Wait as long as needed for space
    pub fn push_blocking(&self, item: T) -> Result<PushOutcome<T>, PushError<T>> {
        self.push_until(item, None)
    }

    /// Wait at most `timeout` for space
    pub fn push_timeout(&self, item: T, timeout: Duration) -> Result<PushOutcome<T>, PushError<T>> {
        self.push_until(item, Some(Instant::now() + timeout))
    }

    fn push_until(
        &self,
        item: T,
        deadline: Option<Instant>,
    ) -> Result<PushOutcome<T>, PushError<T>> {
        let mut state = self.state.lock();
        let mut waited = false;

        loop {
            if state.closed {
                return Err(PushError::Closed(item));
            }
            if state.items.len() < self.capacity {
                break;
            }
            waited = true;
            match deadline {
                None => self.not_full.wait(&mut state),
                Some(deadline) => {
                    if self.not_full.wait_until(&mut state, deadline).timed_out() {
                        if state.closed {
                            return Err(PushError::Closed(item));
                        }
                        if state.items.len() < self.capacity {
                            break;
                        }
                        return Err(PushError::Timeout(item));
                    }
                }
            }
        }

        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(PushOutcome::accepted(waited, waited))
    }

    /// Push without ever waiting for space.
    ///
    /// When full, the oldest queued item accepted by `evictable` is removed
    /// to make room. If nothing queued may be evicted:
    /// - an evictable `item` is discarded and handed back in `evicted`;
    /// - otherwise `coalesce(queued, &mut item)` is tried against each queued
    ///   item, and returning true means `queued` now covers `item`;
    /// - failing that, `item` is queued one past capacity. Only
    ///   non-evictable items ever exceed capacity.
    pub fn push_overrun(
        &self,
        mut item: T,
        evictable: impl Fn(&T) -> bool,
        coalesce: impl Fn(&mut T, &mut T) -> bool,
    ) -> Result<PushOutcome<T>, PushError<T>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(PushError::Closed(item));
        }

        let full = state.items.len() >= self.capacity;
        let mut evicted = None;
        if full {
            if let Some(index) = state.items.iter().position(&evictable) {
                evicted = state.items.remove(index);
            } else if evictable(&item) {
                return Ok(PushOutcome::discarded(item));
            } else if state
                .items
                .iter_mut()
                .any(|queued| coalesce(queued, &mut item))
            {
                return Ok(PushOutcome::accepted(true, false));
            }
        }

        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        Ok(PushOutcome {
            full,
            waited: false,
            evicted,
        })
    }

    /// Push regardless of the closed flag, waiting for space until `deadline`.
    ///
    /// Returns false if the deadline passed first.
    pub fn force_push(&self, item: T, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity {
            match deadline {
                None => self.not_full.wait(&mut state),
                Some(deadline) => {
                    if self.not_full.wait_until(&mut state, deadline).timed_out()
                        && state.items.len() >= self.capacity
                    {
                        return false;
                    }
                }
            }
        }
        state.items.push_back(item);
        drop(state);
        self.not_empty.notify_one();
        true
    }

    /// Block until an item is available and remove it (FIFO)
    pub fn pop(&self) -> T {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut state);
        }
    }

    /// Reject all further regular pushes. Returns true on the first call.
    ///
    /// Producers already waiting for space are woken and get `Closed`.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock();
        let first = !state.closed;
        state.closed = true;
        drop(state);
        self.not_full.notify_all();
        first
    }
}
