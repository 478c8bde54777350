//! Atom Definitions
//!
//! An Atom is an externally owned unit of state: identity-comparable, with
//! a current value readable through a [`Store`](super::Store) and a change
//! subscription. The bridge never owns or mutates atoms; it only reads and
//! writes them through the store contract.
//!
//! An atom carries its initial shape (a concrete value, a synchronous read
//! failure, or a pending asynchronous computation) and a writability flag.
//! Per-store current values live in the store, not here, so the same atom
//! can hold independent state in two different stores.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::suspend::Suspendable;
use crate::value::Value;

/// Counter for generating unique atom IDs.
static ATOM_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for an atom.
///
/// IDs are never reused, so an ID observed after its atom died can only
/// miss in store and registry tables, never alias a different atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomId(u64);

impl AtomId {
    fn next() -> Self {
        Self(ATOM_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The initial shape of an atom's value.
#[derive(Debug, Clone)]
pub(crate) enum AtomInit {
    /// A concrete initial value.
    Value(Value),
    /// The atom's synchronous computation fails with this message.
    Error(Arc<str>),
    /// The atom is backed by a pending asynchronous computation.
    Pending(Suspendable),
}

pub(crate) struct AtomCell {
    pub(crate) id: AtomId,
    pub(crate) init: AtomInit,
    pub(crate) writable: bool,
}

/// An externally managed unit of state.
///
/// Cloning shares the same identity. Equality is reference-based.
#[derive(Clone)]
pub struct Atom(pub(crate) Arc<AtomCell>);

impl Atom {
    /// Create a writable atom with the given initial value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(AtomCell {
            id: AtomId::next(),
            init: AtomInit::Value(value.into()),
            writable: true,
        }))
    }

    /// Create a read-only atom. Writes through any handle fail with
    /// `NotWritable`.
    pub fn read_only(value: impl Into<Value>) -> Self {
        Self(Arc::new(AtomCell {
            id: AtomId::next(),
            init: AtomInit::Value(value.into()),
            writable: false,
        }))
    }

    /// Create an atom whose read always fails with the given message.
    pub fn error(message: impl Into<Arc<str>>) -> Self {
        Self(Arc::new(AtomCell {
            id: AtomId::next(),
            init: AtomInit::Error(message.into()),
            writable: false,
        }))
    }

    /// Create an atom backed by a pending asynchronous computation.
    ///
    /// The returned [`Suspendable`] is the producer's side: settling it
    /// makes the value (or its failure) observable through every store.
    pub fn pending() -> (Self, Suspendable) {
        let cell = Suspendable::pending();
        let atom = Self(Arc::new(AtomCell {
            id: AtomId::next(),
            init: AtomInit::Pending(cell.clone()),
            writable: false,
        }));
        (atom, cell)
    }

    /// Get the atom's unique ID.
    pub fn id(&self) -> AtomId {
        self.0.id
    }

    /// Capability query: can this atom be written through a handle?
    pub fn is_writable(&self) -> bool {
        self.0.writable
    }

    pub(crate) fn downgrade(&self) -> Weak<AtomCell> {
        Arc::downgrade(&self.0)
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Atom {}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.0.id)
            .field("writable", &self.0.writable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_ids_are_unique() {
        let a = Atom::new(0);
        let b = Atom::new(0);
        let c = Atom::read_only(0);

        assert_ne!(a.id(), b.id());
        assert_ne!(b.id(), c.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn clone_shares_identity() {
        let a = Atom::new("x");
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a, Atom::new("x"));
    }

    #[test]
    fn writability() {
        assert!(Atom::new(1).is_writable());
        assert!(!Atom::read_only(1).is_writable());
        assert!(!Atom::error("nope").is_writable());
        let (pending, _cell) = Atom::pending();
        assert!(!pending.is_writable());
    }

    #[test]
    fn pending_atom_exposes_its_producer_cell() {
        let (_atom, cell) = Atom::pending();
        assert!(cell.is_pending());
        cell.fulfill("ready");
        assert!(!cell.is_pending());
    }
}
