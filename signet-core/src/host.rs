//! Reference Host
//!
//! A minimal single-threaded driver standing in for the UI runtime the
//! bridge is meant to plug into. It mounts a constructed tree, gives every
//! re-renderer boundary a local update trigger, re-enters suspended renders
//! once their pending value settles, and catches propagated errors at a
//! boundary instead of unwinding.
//!
//! This is deliberately not a virtual-DOM differ: a boundary that fires
//! simply re-renders and remounts its own subtree in place. Everything
//! outside the boundary is never touched, which is exactly the property the
//! interceptor exists to provide, and what the end-to-end tests assert by
//! counting render-closure invocations.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::error::SignalError;
use crate::suspend::Interrupt;
use crate::tree::{Node, Rerender};
use crate::value::Value;

/// The reference host runtime.
#[derive(Clone)]
pub struct Host {
    inner: Arc<HostInner>,
}

struct HostInner {
    /// Text displayed for a suspended boundary.
    fallback: Arc<str>,
    /// Errors caught at boundaries, in arrival order.
    errors: Mutex<Vec<SignalError>>,
}

impl Host {
    /// Create a host with the default suspense fallback text.
    pub fn new() -> Self {
        Self::with_fallback("loading")
    }

    /// Create a host with a specific suspense fallback text.
    pub fn with_fallback(fallback: impl Into<Arc<str>>) -> Self {
        Self {
            inner: Arc::new(HostInner {
                fallback: fallback.into(),
                errors: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Mount a constructed tree. Every re-renderer boundary in it is
    /// subscribed and rendered once.
    pub fn mount(&self, node: &Node) -> MountedTree {
        debug!("mounting tree");
        MountedTree {
            host: Arc::clone(&self.inner),
            root: mount_node(&self.inner, node),
        }
    }

    /// Drain the errors caught at boundaries so far.
    pub fn taken_errors(&self) -> Vec<SignalError> {
        std::mem::take(&mut *self.inner.errors.lock())
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new()
    }
}

/// A mounted tree. Unmounts (severing every subscription) on drop.
pub struct MountedTree {
    host: Arc<HostInner>,
    root: Mounted,
}

impl MountedTree {
    /// Render the current state of the tree to a string.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_mounted(&self.host, &self.root, &mut out);
        out
    }

    /// Tear down every boundary. Idempotent.
    pub fn unmount(&self) {
        unmount_mounted(&self.root);
    }
}

impl Drop for MountedTree {
    fn drop(&mut self) {
        self.unmount();
    }
}

enum Mounted {
    Text(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Mounted>,
    },
    /// A list child mounted item-by-item, with no element of its own.
    Fragment(Vec<Mounted>),
    Boundary(Arc<BoundarySlot>),
}

enum BoundaryContent {
    Ready(Mounted),
    Suspended,
    Failed,
}

/// One mounted re-renderer and the subtree it currently displays.
struct BoundarySlot {
    rerender: Arc<Rerender>,
    host: Weak<HostInner>,
    content: RwLock<BoundaryContent>,
}

impl BoundarySlot {
    /// Re-run the boundary's render closure and swap the displayed subtree.
    fn refresh(this: &Arc<Self>) {
        let Some(host) = this.host.upgrade() else {
            return;
        };
        // A settle callback may arrive after teardown.
        if !this.rerender.is_mounted() {
            return;
        }

        match this.rerender.render() {
            Ok(node) => {
                trace!(rerender = this.rerender.id(), "boundary rendered");
                // The render closure re-emits the same captured child
                // nodes, so any boundary in the replaced subtree must be
                // unmounted before the new subtree mounts it again.
                let previous =
                    std::mem::replace(&mut *this.content.write(), BoundaryContent::Suspended);
                unmount_content(&previous);
                let mounted = mount_node(&host, &node);
                *this.content.write() = BoundaryContent::Ready(mounted);
            }
            Err(Interrupt::Suspended(pending)) => {
                trace!(rerender = this.rerender.id(), "boundary suspended");
                let previous =
                    std::mem::replace(&mut *this.content.write(), BoundaryContent::Suspended);
                unmount_content(&previous);

                let weak = Arc::downgrade(this);
                pending.on_settle(move || {
                    if let Some(slot) = weak.upgrade() {
                        Self::refresh(&slot);
                    }
                });
            }
            Err(Interrupt::Failed(error)) => {
                debug!(rerender = this.rerender.id(), %error, "boundary failed");
                host.errors.lock().push(error);
                let previous =
                    std::mem::replace(&mut *this.content.write(), BoundaryContent::Failed);
                unmount_content(&previous);
            }
        }
    }
}

fn mount_node(host: &Arc<HostInner>, node: &Node) -> Mounted {
    match node {
        Node::Element(element) => Mounted::Element {
            tag: element.tag().to_owned(),
            attrs: element
                .props()
                .iter()
                .map(|(key, value)| (key.clone(), value.to_string()))
                .collect(),
            children: element
                .children()
                .iter()
                .map(|child| mount_value(host, child))
                .collect(),
        },
        Node::Rerender(rerender) => {
            let slot = Arc::new(BoundarySlot {
                rerender: Arc::clone(rerender),
                host: Arc::downgrade(host),
                content: RwLock::new(BoundaryContent::Suspended),
            });

            let weak = Arc::downgrade(&slot);
            Rerender::mount(rerender, move || {
                if let Some(slot) = weak.upgrade() {
                    BoundarySlot::refresh(&slot);
                }
            });
            BoundarySlot::refresh(&slot);
            Mounted::Boundary(slot)
        }
    }
}

fn mount_value(host: &Arc<HostInner>, value: &Value) -> Mounted {
    match value {
        Value::Node(node) => mount_node(host, node),
        // Lists may carry constructed nodes; mount each item in order.
        Value::List(items) => {
            Mounted::Fragment(items.iter().map(|item| mount_value(host, item)).collect())
        }
        // A bare handle reaching the host was built past the interceptor;
        // display a one-shot snapshot of it, without reactivity.
        Value::Signal(handle) => match handle.read() {
            Ok(current) => Mounted::Text(current.to_string()),
            Err(Interrupt::Suspended(_)) => Mounted::Text(host.fallback.to_string()),
            Err(Interrupt::Failed(error)) => {
                host.errors.lock().push(error);
                Mounted::Text(String::new())
            }
        },
        other => Mounted::Text(other.to_string()),
    }
}

fn unmount_mounted(mounted: &Mounted) {
    match mounted {
        Mounted::Text(_) => {}
        Mounted::Element { children, .. } => {
            for child in children {
                unmount_mounted(child);
            }
        }
        Mounted::Fragment(items) => {
            for item in items {
                unmount_mounted(item);
            }
        }
        Mounted::Boundary(slot) => {
            slot.rerender.unmount();
            unmount_content(&slot.content.read());
        }
    }
}

fn unmount_content(content: &BoundaryContent) {
    if let BoundaryContent::Ready(mounted) = content {
        unmount_mounted(mounted);
    }
}

fn write_mounted(host: &Arc<HostInner>, mounted: &Mounted, out: &mut String) {
    match mounted {
        Mounted::Text(text) => out.push_str(text),
        Mounted::Element {
            tag,
            attrs,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(value);
                out.push('"');
            }
            out.push('>');
            for child in children {
                write_mounted(host, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        Mounted::Fragment(items) => {
            for item in items {
                write_mounted(host, item, out);
            }
        }
        Mounted::Boundary(slot) => match &*slot.content.read() {
            BoundaryContent::Ready(inner) => write_mounted(host, inner, out),
            BoundaryContent::Suspended => out.push_str(&slot_fallback(slot)),
            BoundaryContent::Failed => {}
        },
    }
}

fn slot_fallback(slot: &BoundarySlot) -> String {
    slot.host
        .upgrade()
        .map(|host| host.fallback.to_string())
        .unwrap_or_default()
}
