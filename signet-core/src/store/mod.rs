//! The Atomic-State Container
//!
//! This module is the bridge's store-side collaborator: atoms (independently
//! subscribable state cells), the store mapping atoms to per-store current
//! values, and the RAII subscription guard.
//!
//! The rest of the crate consumes the store only through the narrow contract
//! on [`Store`]: `read`, `write` (whole-value replacement), `subscribe`, and
//! the atom identity and writability queries. Nothing here implements
//! derived-state evaluation or a dependency graph; atoms are plain cells.

pub(crate) mod atom;
pub(crate) mod container;
pub(crate) mod subscribe;

pub use atom::{Atom, AtomId};
pub use container::{default_store, ReadOutcome, Store, StoreId};
pub use subscribe::{SubscriberId, Subscription};
