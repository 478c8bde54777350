//! Store Implementation
//!
//! The store is the container managing per-atom current values and change
//! propagation. The bridge consumes it through a narrow contract:
//!
//! - `read(atom)` returns the current value, a pending computation, or an
//!   error, as a [`ReadOutcome`].
//! - `write(atom, value)` replaces the whole value and notifies subscribers.
//! - `subscribe(atom, callback)` returns an RAII unsubscribe guard.
//!
//! # State ownership
//!
//! Values are per-store: the same atom held in two stores has independent
//! state, each initialized lazily from the atom's declared initial shape on
//! first touch. Entries keep only a weak guard on the atom cell, so a store
//! never extends an atom's lifetime; dead entries are swept by `compact`.
//!
//! The store also owns its partition of the signal registry. Dropping the
//! store drops the partition, which is the explicit eviction lifecycle that
//! keeps handle caches from outliving their store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::SignalError;
use crate::signal::SignalRegistry;
use crate::suspend::{SuspendState, Suspendable};
use crate::value::Value;

use super::atom::{Atom, AtomCell, AtomId, AtomInit};
use super::subscribe::{SubscriberId, Subscription};

/// Counter for generating unique store IDs.
static STORE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Unique identifier for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    fn next() -> Self {
        Self(STORE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// What a store reports for an atom read.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// A concrete current value.
    Ready(Value),
    /// The value is an unresolved asynchronous computation.
    Pending(Suspendable),
    /// The atom's computation failed.
    Failed(SignalError),
}

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Per-store state for one atom.
enum AtomState {
    Ready(Value),
    Pending(Suspendable),
    Failed(SignalError),
}

struct AtomEntry {
    /// Liveness guard on the atom. A dead guard marks the entry for sweep.
    origin: Weak<AtomCell>,
    state: RwLock<AtomState>,
    subscribers: RwLock<Vec<(SubscriberId, Callback)>>,
}

impl AtomEntry {
    fn new(cell: &Arc<AtomCell>) -> Self {
        let state = match &cell.init {
            AtomInit::Value(value) => AtomState::Ready(value.clone()),
            AtomInit::Error(message) => {
                AtomState::Failed(SignalError::Propagated(Arc::clone(message)))
            }
            AtomInit::Pending(pending) => AtomState::Pending(pending.clone()),
        };
        Self {
            origin: Arc::downgrade(cell),
            state: RwLock::new(state),
            subscribers: RwLock::new(Vec::new()),
        }
    }
}

pub(crate) struct StoreInner {
    id: StoreId,
    entries: DashMap<AtomId, AtomEntry>,
    /// This store's partition of the signal handle cache.
    pub(crate) signals: SignalRegistry,
    /// Cumulative count of subscribe operations. Diagnostics only; the
    /// subscription-churn tests are written against it.
    subscribe_ops: AtomicU64,
}

impl StoreInner {
    fn ensure_entry(&self, cell: &Arc<AtomCell>) {
        self.entries
            .entry(cell.id)
            .or_insert_with(|| AtomEntry::new(cell));
    }

    pub(crate) fn read_cell(&self, cell: &Arc<AtomCell>) -> ReadOutcome {
        self.ensure_entry(cell);
        let state = match self.entries.get(&cell.id) {
            Some(entry) => match &*entry.state.read() {
                AtomState::Ready(value) => return ReadOutcome::Ready(value.clone()),
                AtomState::Failed(error) => return ReadOutcome::Failed(error.clone()),
                AtomState::Pending(pending) => pending.clone(),
            },
            None => return ReadOutcome::Failed(SignalError::MissingValue(cell.id)),
        };

        // A pending entry reports whatever its computation has settled to.
        match state.poll() {
            SuspendState::Pending => ReadOutcome::Pending(state),
            SuspendState::Fulfilled(value) => ReadOutcome::Ready(value),
            SuspendState::Rejected(error) => ReadOutcome::Failed(error),
        }
    }

    pub(crate) fn write_cell(&self, cell: &Arc<AtomCell>, value: Value) -> Result<(), SignalError> {
        if !cell.writable {
            return Err(SignalError::NotWritable);
        }
        self.ensure_entry(cell);

        // Swap the value and snapshot the callbacks, then notify with no
        // locks held so a callback may re-enter the store.
        let callbacks: Vec<Callback> = match self.entries.get(&cell.id) {
            Some(entry) => {
                *entry.state.write() = AtomState::Ready(value);
                entry
                    .subscribers
                    .read()
                    .iter()
                    .map(|(_, callback)| Arc::clone(callback))
                    .collect()
            }
            None => return Err(SignalError::MissingValue(cell.id)),
        };

        trace!(
            store = self.id.raw(),
            atom = cell.id.raw(),
            subscribers = callbacks.len(),
            "write"
        );
        for callback in callbacks {
            callback();
        }
        Ok(())
    }

    pub(crate) fn subscribe(
        this: &Arc<Self>,
        cell: &Arc<AtomCell>,
        callback: Callback,
    ) -> Subscription {
        this.ensure_entry(cell);
        let id = SubscriberId::new();
        if let Some(entry) = this.entries.get(&cell.id) {
            entry.subscribers.write().push((id, callback));
        }
        this.subscribe_ops.fetch_add(1, Ordering::Relaxed);
        trace!(
            store = this.id.raw(),
            atom = cell.id.raw(),
            subscriber = id.raw(),
            "subscribe"
        );
        Subscription::new(Arc::downgrade(this), cell.id, id)
    }

    pub(crate) fn remove_subscriber(&self, atom: AtomId, id: SubscriberId) {
        if let Some(entry) = self.entries.get(&atom) {
            entry
                .subscribers
                .write()
                .retain(|(subscriber, _)| *subscriber != id);
        }
    }

    fn subscriber_count(&self, atom: AtomId) -> usize {
        self.entries
            .get(&atom)
            .map(|entry| entry.subscribers.read().len())
            .unwrap_or(0)
    }

    fn compact(&self) {
        self.entries.retain(|_, entry| entry.origin.strong_count() > 0);
        self.signals.purge();
    }
}

/// The atomic-state container.
///
/// Cloning shares the same underlying store. See the module docs for the
/// contract the bridge consumes.
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Arc<StoreInner>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        let id = StoreId::next();
        debug!(store = id.raw(), "store created");
        Self {
            inner: Arc::new(StoreInner {
                id,
                entries: DashMap::new(),
                signals: SignalRegistry::new(),
                subscribe_ops: AtomicU64::new(0),
            }),
        }
    }

    /// Get the store's unique ID.
    pub fn id(&self) -> StoreId {
        self.inner.id
    }

    /// Read an atom's current state in this store.
    pub fn read(&self, atom: &Atom) -> ReadOutcome {
        self.inner.read_cell(&atom.0)
    }

    /// Replace an atom's whole value and notify subscribers.
    ///
    /// Fails with [`SignalError::NotWritable`] for read-only atoms.
    pub fn write(&self, atom: &Atom, value: impl Into<Value>) -> Result<(), SignalError> {
        self.inner.write_cell(&atom.0, value.into())
    }

    /// Register a change callback for an atom.
    ///
    /// The callback fires after every successful write to the atom in this
    /// store. Dropping the returned guard unsubscribes exactly once.
    pub fn subscribe(
        &self,
        atom: &Atom,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        StoreInner::subscribe(&self.inner, &atom.0, Arc::new(callback))
    }

    /// Number of callbacks currently registered for an atom.
    pub fn subscriber_count(&self, atom: &Atom) -> usize {
        self.inner.subscriber_count(atom.id())
    }

    /// Cumulative number of subscribe operations ever performed.
    pub fn subscribe_ops(&self) -> u64 {
        self.inner.subscribe_ops.load(Ordering::Relaxed)
    }

    /// Number of cached signal handles for this store.
    pub fn signal_count(&self) -> usize {
        self.inner.signals.len()
    }

    /// Sweep state and handle-cache entries whose atom has been dropped.
    pub fn compact(&self) {
        self.inner.compact();
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.inner.id)
            .field("entries", &self.inner.entries.len())
            .field("signals", &self.inner.signals.len())
            .finish()
    }
}

/// The process-wide default store, mirroring the usual single-store setup.
///
/// Handles created without an explicit store are scoped to this one.
pub fn default_store() -> Store {
    static DEFAULT_STORE: OnceLock<Store> = OnceLock::new();
    DEFAULT_STORE.get_or_init(Store::new).clone()
}
