//! Subscription types for the store contract.
//!
//! A [`Subscription`] is the unsubscribe side of `store.subscribe(atom, cb)`.
//! It is an RAII guard: dropping it removes the callback exactly once. The
//! guard holds only a weak reference to the store, so an outstanding
//! subscription never keeps a store alive.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

use tracing::trace;

use super::atom::AtomId;
use super::container::StoreInner;

/// Unique identifier for a subscriber.
///
/// Each registered callback gets a unique ID when created. The ID is what
/// removal is keyed on, so two subscriptions to the same atom with the same
/// callback are still independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII unsubscribe guard returned by `subscribe`.
pub struct Subscription {
    store: Weak<StoreInner>,
    atom: AtomId,
    id: SubscriberId,
}

impl Subscription {
    pub(crate) fn new(store: Weak<StoreInner>, atom: AtomId, id: SubscriberId) -> Self {
        Self { store, atom, id }
    }

    /// A subscription that refers to nothing. Used when subscribing through
    /// a handle whose store is already gone.
    pub(crate) fn inert(atom: AtomId) -> Self {
        Self {
            store: Weak::new(),
            atom,
            id: SubscriberId::new(),
        }
    }

    /// Get this subscription's ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the owning store is still alive.
    pub fn is_live(&self) -> bool {
        self.store.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            trace!(atom = self.atom.raw(), subscriber = self.id.raw(), "unsubscribe");
            store.remove_subscriber(self.atom, self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("atom", &self.atom)
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}
