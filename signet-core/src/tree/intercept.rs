//! Element Interceptor
//!
//! [`SignalFactory`] wraps a native element factory and is the entry point
//! UI code builds nodes through. It scans the children and props of each
//! construction call for signal handles. When none are present it delegates
//! straight to the native constructor, so ordinary trees pay no wrapping
//! overhead. When handles are present it substitutes a re-renderer boundary
//! that subscribes to exactly those handles and rebuilds only the inner
//! element on change; everything above the boundary is untouched.
//!
//! The wrapping is plain dependency injection. Nothing global is patched:
//! the application hands its tree-building code a `SignalFactory` instead
//! of the native one.

use std::sync::Arc;

use tracing::trace;

use crate::value::Value;

use super::detect;
use super::element::{ElementFactory, NativeFactory, Node, Props};
use super::rerender::{RenderFn, Rerender};
use super::resolve;

/// The intercepting element factory.
pub struct SignalFactory<F: ElementFactory = NativeFactory> {
    native: Arc<F>,
}

impl<F: ElementFactory> SignalFactory<F> {
    /// Wrap a native factory.
    pub fn new(native: F) -> Self {
        Self {
            native: Arc::new(native),
        }
    }
}

impl Default for SignalFactory<NativeFactory> {
    fn default() -> Self {
        Self::new(NativeFactory)
    }
}

impl<F: ElementFactory> Clone for SignalFactory<F> {
    fn clone(&self) -> Self {
        Self {
            native: Arc::clone(&self.native),
        }
    }
}

impl<F: ElementFactory> ElementFactory for SignalFactory<F> {
    fn create_element(&self, tag: &str, props: Props, children: Vec<Value>) -> Node {
        let child_handles = detect::find_in_slice(&children);
        let prop_handles = detect::find_in_props(&props);

        // Fast path: nothing reactive, build the element directly.
        if child_handles.is_empty() && prop_handles.is_empty() {
            return self.native.create_element(tag, props, children);
        }

        let resolve_children = !child_handles.is_empty();
        let resolve_props = !prop_handles.is_empty();

        // Subscription order: handles found in children, then in props,
        // each handle once.
        let mut handles = child_handles;
        for handle in prop_handles {
            if !handles.iter().any(|seen| *seen == handle) {
                handles.push(handle);
            }
        }

        trace!(
            tag,
            handles = handles.len(),
            "wrapping element in a re-renderer"
        );

        // The closure captures the original arguments; every invocation
        // re-resolves them against the stores' current state.
        let native = Arc::clone(&self.native);
        let tag: Arc<str> = Arc::from(tag);
        let render: RenderFn = Arc::new(move || {
            let children = if resolve_children {
                resolve::resolve_slice(&children)?
            } else {
                children.clone()
            };
            let props = if resolve_props {
                resolve::resolve_props(&props)?
            } else {
                props.clone()
            };
            Ok(native.create_element(&tag, props, children))
        });

        Rerender::node(handles, render)
    }
}

/// Build a node with default wiring: the intercepting factory over the
/// native constructor. The drop-in replacement for direct construction.
pub fn create_element(tag: &str, props: Props, children: Vec<Value>) -> Node {
    SignalFactory::default().create_element(tag, props, children)
}

/// Flatten a single-or-list child argument into a children list, the shape
/// tree-literal front ends hand over. `Null` means no children; a `List`
/// spreads into its items; anything else is one child.
pub fn spread_children(child: Value) -> Vec<Value> {
    match child {
        Value::Null => Vec::new(),
        Value::List(items) => items.as_ref().clone(),
        single => vec![single],
    }
}
