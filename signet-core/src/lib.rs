//! Signet Core
//!
//! This crate provides the core runtime for the Signet fine-grained
//! reactivity bridge. It connects an atomic-state store to a declarative
//! tree builder so that state changes re-render only the elements that
//! actually reference the changed atoms. It implements:
//!
//! - Signal handles: stable subscribe/read/write capabilities over atoms,
//!   memoized per store and atom
//! - Element interception: a factory wrapper that detects handles embedded
//!   in construction arguments and substitutes re-renderer boundaries
//! - Value resolution with structural sharing
//! - Suspend-on-read for atoms backed by pending asynchronous computations
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `store`: the atomic-state container, atoms, and subscription guards
//! - `signal`: signal handles and the per-store handle cache
//! - `tree`: element construction, signal detection, value resolution,
//!   re-renderer boundaries, and the intercepting factory
//! - `suspend`: settle-once cells and the render-pass interrupt
//! - `host`: a minimal reference driver that mounts trees and reacts to
//!   boundary notifications
//! - `value`: the dynamic value type flowing through all of the above
//! - `error`: the bridge's error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use signet_core::{atom_signal, create_element, Host, Props, Value};
//!
//! // An atom and its memoized handle on the default store.
//! let (count, count_signal) = atom_signal(0);
//!
//! // A tree with a reactive child. The span becomes a boundary; the
//! // outer div stays a plain element.
//! let span = create_element("span", Props::new(), vec![Value::Signal(count_signal)]);
//! let root = create_element("div", Props::new(), vec![Value::Node(span)]);
//!
//! let host = Host::new();
//! let tree = host.mount(&root);
//! assert_eq!(tree.to_html(), "<div><span>0</span></div>");
//!
//! // Writing the atom re-renders only the span boundary.
//! count_signal.write(1)?;
//! assert_eq!(tree.to_html(), "<div><span>1</span></div>");
//! ```

pub mod error;
pub mod host;
pub mod signal;
pub mod store;
pub mod suspend;
pub mod tree;
pub mod value;

pub use error::SignalError;
pub use host::{Host, MountedTree};
pub use signal::{atom_signal, signal, signal_in, PathSegment, SignalHandle};
pub use store::{default_store, Atom, AtomId, ReadOutcome, Store, StoreId, Subscription};
pub use suspend::{Interrupt, SuspendState, Suspendable};
pub use tree::{
    create_element, spread_children, Element, ElementFactory, NativeFactory, Node, Props,
    Rerender, SignalFactory,
};
pub use value::Value;
