//! Busy flags and the transient error slot.
//!
//! Every asynchronous operation kind has its own flag so an in-flight
//! write never makes a load look busy (or the other way around). Flags are
//! counters: two concurrent toggles keep `mutating` raised until both end.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// An asynchronous operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Adding,
    Fetching,
    Subscribing,
    Mutating,
}

/// Point-in-time view of the busy flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingStates {
    pub adding: bool,
    pub fetching: bool,
    pub subscribing: bool,
    pub mutating: bool,
}

impl LoadingStates {
    /// Returns true if any operation is in flight.
    pub fn any(&self) -> bool {
        self.adding || self.fetching || self.subscribing || self.mutating
    }
}

/// Counter-backed busy flags.
#[derive(Debug, Default)]
pub struct BusyFlags {
    adding: AtomicUsize,
    fetching: AtomicUsize,
    subscribing: AtomicUsize,
    mutating: AtomicUsize,
}

impl BusyFlags {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, op: Operation) -> &AtomicUsize {
        match op {
            Operation::Adding => &self.adding,
            Operation::Fetching => &self.fetching,
            Operation::Subscribing => &self.subscribing,
            Operation::Mutating => &self.mutating,
        }
    }

    /// Raises the flag for `op` until the guard drops.
    pub fn enter(self: &Arc<Self>, op: Operation) -> BusyGuard {
        self.counter(op).fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            flags: Arc::clone(self),
            op,
        }
    }

    /// Returns true while at least one `op` is in flight.
    pub fn is_busy(&self, op: Operation) -> bool {
        self.counter(op).load(Ordering::SeqCst) > 0
    }

    pub fn snapshot(&self) -> LoadingStates {
        LoadingStates {
            adding: self.is_busy(Operation::Adding),
            fetching: self.is_busy(Operation::Fetching),
            subscribing: self.is_busy(Operation::Subscribing),
            mutating: self.is_busy(Operation::Mutating),
        }
    }
}

/// Lowers a busy flag on drop.
#[derive(Debug)]
pub struct BusyGuard {
    flags: Arc<BusyFlags>,
    op: Operation,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flags.counter(self.op).fetch_sub(1, Ordering::SeqCst);
    }
}

/// Most recent user-visible error, forgotten after a TTL.
#[derive(Debug)]
pub struct ErrorSlot {
    ttl: Duration,
    current: Mutex<Option<(String, Instant)>>,
}

impl ErrorSlot {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            current: Mutex::new(None),
        }
    }

    /// Replaces the current error.
    pub fn record(&self, message: impl Into<String>) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = Some((message.into(), Instant::now()));
    }

    /// The current error, if it has not expired.
    pub fn current(&self) -> Option<String> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|(_, at)| at.elapsed() >= self.ttl) {
            *current = None;
        }
        current.as_ref().map(|(message, _)| message.clone())
    }

    pub fn clear(&self) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
