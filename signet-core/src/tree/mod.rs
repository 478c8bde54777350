//! Tree Construction and Interception
//!
//! This module implements the element side of the bridge:
//!
//! - `element`: plain nodes and the native constructor seam
//! - `detect`: the structural scan that finds embedded signal handles
//! - `resolve`: handle-to-value resolution with structural sharing
//! - `rerender`: the stateful boundary node that owns subscriptions
//! - `intercept`: the factory wrapper that puts it all together
//!
//! The flow: UI code builds nodes through the intercepting factory. When a
//! construction call carries signal handles in its children or props, the
//! factory returns a re-renderer boundary instead of a plain element. The
//! boundary subscribes to exactly the referenced atoms and, on change,
//! re-resolves the captured arguments and rebuilds the inner element. Only
//! that subtree re-renders; ancestors never hear about it.

pub(crate) mod detect;
pub(crate) mod element;
pub(crate) mod intercept;
pub(crate) mod rerender;
pub(crate) mod resolve;

pub use detect::{find_in_props, find_in_slice, find_signals, SignalList};
pub use element::{Element, ElementFactory, NativeFactory, Node, Props};
pub use intercept::{create_element, spread_children, SignalFactory};
pub use rerender::{RenderFn, Rerender};
pub use resolve::{resolve, resolve_props, resolve_slice};
