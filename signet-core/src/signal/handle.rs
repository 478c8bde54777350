//! Signal Handle Implementation
//!
//! A [`SignalHandle`] is an opaque token uniquely associated with one
//! (store, atom) pair: "the value of atom A in store S, read lazily".
//!
//! # Identity
//!
//! Handles are memoized by the per-store registry, so equality is pointer
//! equality on the shared inner cell. `signal_in(A, S)` returns the same
//! instance across any number of calls, which is what lets the re-renderer
//! diff its subscription list with cheap identity checks.
//!
//! # Lifetime
//!
//! A handle holds only weak references to its store and atom. It never
//! keeps either alive; once the pair is gone the handle turns inert and a
//! read surfaces the defensive `MissingValue` invariant violation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tracing::warn;

use crate::error::SignalError;
use crate::store::atom::{Atom, AtomCell, AtomId};
use crate::store::container::{ReadOutcome, StoreInner};
use crate::store::Subscription;
use crate::suspend::Interrupt;
use crate::value::Value;

/// Counter for generating unique handle IDs.
static HANDLE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_handle_id() -> u64 {
    HANDLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// One step of a write path.
///
/// The bridge only defines whole-value replacement, so any non-empty path
/// is rejected with `UnsupportedSubPathWrite`. The type exists so the
/// rejection is part of the signature rather than a silent truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A map key.
    Key(String),
    /// A list index.
    Index(usize),
}

pub(crate) struct HandleCell {
    id: u64,
    store: Weak<StoreInner>,
    atom: Weak<AtomCell>,
    atom_id: AtomId,
    writable: bool,
}

/// A cached, lazily-read proxy for one (store, atom) pair.
///
/// Cloning is cheap and preserves identity. Obtain handles through
/// [`signal`](crate::signal::signal) or [`signal_in`](crate::signal::signal_in);
/// direct construction is not exposed, which is how the memoization
/// invariant stays airtight.
#[derive(Clone)]
pub struct SignalHandle(Arc<HandleCell>);

impl SignalHandle {
    pub(crate) fn bind(store: &Arc<StoreInner>, atom: &Atom) -> Self {
        Self(Arc::new(HandleCell {
            id: next_handle_id(),
            store: Arc::downgrade(store),
            atom: atom.downgrade(),
            atom_id: atom.id(),
            writable: atom.is_writable(),
        }))
    }

    /// Get the handle's unique ID.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// The atom this handle reads.
    pub fn atom_id(&self) -> AtomId {
        self.0.atom_id
    }

    /// Capability query forwarded from the atom.
    pub fn is_writable(&self) -> bool {
        self.0.writable
    }

    fn upgrade(&self) -> Result<(Arc<StoreInner>, Arc<AtomCell>), SignalError> {
        match (self.0.store.upgrade(), self.0.atom.upgrade()) {
            (Some(store), Some(atom)) => Ok((store, atom)),
            _ => {
                warn!(
                    atom = self.0.atom_id.raw(),
                    "signal handle outlived its store or atom"
                );
                Err(SignalError::MissingValue(self.0.atom_id))
            }
        }
    }

    /// Read the atom's current value without subscribing.
    ///
    /// A pending asynchronous value interrupts the caller with
    /// [`Interrupt::Suspended`]; a synchronous read failure or a settled
    /// rejection interrupts with [`Interrupt::Failed`] carrying the
    /// propagated error unchanged.
    pub fn read(&self) -> Result<Value, Interrupt> {
        let (store, cell) = self.upgrade().map_err(Interrupt::Failed)?;
        match store.read_cell(&cell) {
            ReadOutcome::Ready(value) => Ok(value),
            ReadOutcome::Pending(pending) => Err(Interrupt::Suspended(pending)),
            ReadOutcome::Failed(error) => Err(Interrupt::Failed(error)),
        }
    }

    /// Register a change callback through the store.
    ///
    /// Returns an inert guard if the store is already gone.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> Subscription {
        match self.upgrade() {
            Ok((store, cell)) => StoreInner::subscribe(&store, &cell, Arc::new(callback)),
            Err(_) => Subscription::inert(self.0.atom_id),
        }
    }

    /// Write through the handle.
    ///
    /// Only whole-value replacement is defined: `path` must be empty.
    /// A non-writable atom fails with [`SignalError::NotWritable`] (checked
    /// first), a non-empty path with
    /// [`SignalError::UnsupportedSubPathWrite`]. Neither is ever partially
    /// applied.
    pub fn set(&self, path: &[PathSegment], value: impl Into<Value>) -> Result<(), SignalError> {
        if !self.0.writable {
            return Err(SignalError::NotWritable);
        }
        if !path.is_empty() {
            return Err(SignalError::UnsupportedSubPathWrite);
        }
        let (store, cell) = self.upgrade()?;
        store.write_cell(&cell, value.into())
    }

    /// Whole-value write, the empty-path convenience over [`set`](Self::set).
    pub fn write(&self, value: impl Into<Value>) -> Result<(), SignalError> {
        self.set(&[], value)
    }
}

impl PartialEq for SignalHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SignalHandle {}

impl fmt::Debug for SignalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalHandle")
            .field("id", &self.0.id)
            .field("atom", &self.0.atom_id)
            .field("writable", &self.0.writable)
            .finish()
    }
}
