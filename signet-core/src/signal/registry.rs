//! Signal Registry
//!
//! The two-level handle cache: store, then atom, then handle. Each store
//! owns one [`SignalRegistry`] partition, so the store level of the mapping
//! is the store's own lifetime and dropping a store evicts its whole
//! partition in one step. The atom level is keyed by [`AtomId`] with a weak
//! liveness guard on the atom cell; entries whose atom died are swept on
//! the next cache miss.
//!
//! Invariant: the registry never returns two different handle instances for
//! the same live (store, atom) pair. Everything downstream that diffs
//! subscription lists by identity relies on this.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::debug;

use crate::store::atom::{Atom, AtomCell, AtomId};
use crate::store::container::StoreInner;

use super::handle::SignalHandle;

struct RegistryEntry {
    /// Liveness guard on the atom. A dead guard marks the entry for sweep.
    origin: Weak<AtomCell>,
    handle: SignalHandle,
}

/// One store's partition of the handle cache.
pub struct SignalRegistry {
    entries: DashMap<AtomId, RegistryEntry>,
}

impl SignalRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up the memoized handle for an atom, creating and caching it on
    /// first request.
    pub(crate) fn get_or_create(&self, store: &Arc<StoreInner>, atom: &Atom) -> SignalHandle {
        if let Some(entry) = self.entries.get(&atom.id()) {
            return entry.handle.clone();
        }

        // Cache miss: sweep dead entries before growing the partition.
        self.purge();

        let handle = SignalHandle::bind(store, atom);
        debug!(atom = atom.id().raw(), handle = handle.id(), "signal handle created");
        self.entries.insert(
            atom.id(),
            RegistryEntry {
                origin: atom.downgrade(),
                handle: handle.clone(),
            },
        );
        handle
    }

    /// Drop entries whose atom has been dropped.
    pub(crate) fn purge(&self) {
        self.entries
            .retain(|_, entry| entry.origin.strong_count() > 0);
    }

    /// Number of live cached handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the partition is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::signal::signal_in;
    use crate::store::{Atom, Store};

    #[test]
    fn handles_are_memoized_per_atom() {
        let store = Store::new();
        let atom = Atom::new(0);

        let first = signal_in(&atom, &store);
        let second = signal_in(&atom, &store);
        let third = signal_in(&atom, &store);

        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(store.signal_count(), 1);
    }

    #[test]
    fn distinct_atoms_get_distinct_handles() {
        let store = Store::new();
        let a = Atom::new(0);
        let b = Atom::new(0);

        assert_ne!(signal_in(&a, &store), signal_in(&b, &store));
        assert_eq!(store.signal_count(), 2);
    }

    #[test]
    fn distinct_stores_get_distinct_handles() {
        let store_a = Store::new();
        let store_b = Store::new();
        let atom = Atom::new(0);

        assert_ne!(signal_in(&atom, &store_a), signal_in(&atom, &store_b));
    }

    #[test]
    fn dead_atom_entries_are_swept_on_miss() {
        let store = Store::new();
        let atom = Atom::new(0);
        let _handle = signal_in(&atom, &store);
        assert_eq!(store.signal_count(), 1);

        drop(atom);

        // The next miss sweeps the dead entry while caching the new atom.
        let fresh = Atom::new(1);
        let _fresh_handle = signal_in(&fresh, &store);
        assert_eq!(store.signal_count(), 1);
    }
}
