//! Signal Handles
//!
//! This module implements the handle side of the bridge: the memoized,
//! lazily-read proxy for one (store, atom) pair and the per-store cache
//! that guarantees handle identity.
//!
//! [`signal`] and [`signal_in`] are the sole construction entry points for
//! embedding reactive values in a tree. Because every lookup for the same
//! live (store, atom) pair returns the same instance, subscription lists
//! downstream can be diffed with plain identity checks.

pub(crate) mod handle;
pub(crate) mod registry;

pub use handle::{PathSegment, SignalHandle};
pub use registry::SignalRegistry;

use crate::store::{default_store, Atom, Store};
use crate::value::Value;

/// Get the memoized signal handle for an atom in a specific store.
pub fn signal_in(atom: &Atom, store: &Store) -> SignalHandle {
    store.inner.signals.get_or_create(&store.inner, atom)
}

/// Get the memoized signal handle for an atom in the default store.
pub fn signal(atom: &Atom) -> SignalHandle {
    signal_in(atom, &default_store())
}

/// Create a writable atom and its handle in one step, against the default
/// store. Convenience for the common "state plus embedded signal" setup.
pub fn atom_signal(initial: impl Into<Value>) -> (Atom, SignalHandle) {
    let atom = Atom::new(initial);
    let handle = signal(&atom);
    (atom, handle)
}
