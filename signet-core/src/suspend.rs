//! Suspend-on-Read Support
//!
//! A [`Suspendable`] is an explicit settle-once cell standing in for a
//! pending asynchronous computation. Reading a handle whose atom is still
//! pending interrupts the current render pass with the suspendable; the host
//! registers a settle callback and re-enters the render once the value is
//! available.
//!
//! The state lives entirely inside the cell. The producer of the computation
//! is never mutated or inspected, and a cell settles at most once: the first
//! `fulfill` or `reject` wins and later settles are ignored.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::SignalError;
use crate::value::Value;

/// Counter for generating unique suspendable IDs.
static SUSPENDABLE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_suspendable_id() -> u64 {
    SUSPENDABLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Observable state of a pending computation.
#[derive(Debug, Clone, PartialEq)]
pub enum SuspendState {
    /// Not settled yet.
    Pending,
    /// Settled with a value.
    Fulfilled(Value),
    /// Settled with a failure. Surfaced identically to a synchronous
    /// read error once the suspended pass resumes.
    Rejected(SignalError),
}

/// A shared settle-once cell for an asynchronous atom value.
///
/// Cloning is cheap and every clone observes the same settlement.
#[derive(Clone)]
pub struct Suspendable(Arc<SuspendableCell>);

struct SuspendableCell {
    id: u64,
    state: Mutex<SuspendState>,
    /// Callbacks to run exactly once at settle time.
    waiters: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl Suspendable {
    /// Create an unsettled cell.
    pub fn pending() -> Self {
        Self(Arc::new(SuspendableCell {
            id: next_suspendable_id(),
            state: Mutex::new(SuspendState::Pending),
            waiters: Mutex::new(Vec::new()),
        }))
    }

    /// Create a cell that is already fulfilled.
    pub fn fulfilled(value: impl Into<Value>) -> Self {
        let cell = Self::pending();
        cell.fulfill(value);
        cell
    }

    /// Create a cell that is already rejected.
    pub fn rejected(message: impl Into<Arc<str>>) -> Self {
        let cell = Self::pending();
        cell.reject(message);
        cell
    }

    /// Get this cell's unique ID.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Observe the current state.
    pub fn poll(&self) -> SuspendState {
        self.0.state.lock().clone()
    }

    /// Check whether the cell is still pending.
    pub fn is_pending(&self) -> bool {
        matches!(*self.0.state.lock(), SuspendState::Pending)
    }

    /// Settle the cell with a value. Ignored if already settled.
    pub fn fulfill(&self, value: impl Into<Value>) {
        self.settle(SuspendState::Fulfilled(value.into()));
    }

    /// Settle the cell with a failure. Ignored if already settled.
    pub fn reject(&self, message: impl Into<Arc<str>>) {
        self.settle(SuspendState::Rejected(SignalError::Propagated(message.into())));
    }

    /// Register a callback to run once the cell settles.
    ///
    /// Runs immediately if the cell has already settled.
    pub fn on_settle(&self, callback: impl FnOnce() + Send + 'static) {
        let state = self.0.state.lock();
        if matches!(*state, SuspendState::Pending) {
            self.0.waiters.lock().push(Box::new(callback));
        } else {
            drop(state);
            callback();
        }
    }

    fn settle(&self, next: SuspendState) {
        let waiters = {
            let mut state = self.0.state.lock();
            if !matches!(*state, SuspendState::Pending) {
                trace!(id = self.0.id, "suspendable already settled, ignoring");
                return;
            }
            *state = next;
            std::mem::take(&mut *self.0.waiters.lock())
        };

        // Waiters run outside the locks so they may re-read the cell.
        for waiter in waiters {
            waiter();
        }
    }
}

impl PartialEq for Suspendable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Suspendable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suspendable")
            .field("id", &self.0.id)
            .field("state", &*self.0.state.lock())
            .finish()
    }
}

/// Interruption of a render pass raised at handle-read time.
///
/// `Suspended` is the suspend-on-read path; the host resumes the pass once
/// the carried cell settles. `Failed` propagates to the host's error
/// boundary unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Interrupt {
    /// The underlying atom value is an unresolved asynchronous computation.
    Suspended(Suspendable),
    /// The read failed.
    Failed(SignalError),
}

impl From<SignalError> for Interrupt {
    fn from(error: SignalError) -> Self {
        Self::Failed(error)
    }
}
