//! Re-renderer Wrapper
//!
//! A [`Rerender`] is the minimal stateful node the interceptor substitutes
//! when an element's arguments contain signal handles. It owns a fixed list
//! of handles and a render closure, and nothing else: on mount it
//! subscribes to every handle, on any notification it asks the host to
//! re-invoke the closure, on unmount it drops every subscription exactly
//! once.
//!
//! # Subscription memoization
//!
//! Presenting a handle list to a mounted re-renderer replaces the stored
//! list only when the length or some element's identity differs. An
//! unrelated re-render that reproduces the same handles therefore causes no
//! unsubscribe/resubscribe churn.
//!
//! # State machine
//!
//! unmounted -> mounted on `mount`; mounted -> mounted self-loop on every
//! notification; mounted -> unmounted on `unmount`. No other states. A
//! notification delivered after unmount is never acted upon.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{trace, warn};

use crate::signal::SignalHandle;
use crate::store::Subscription;
use crate::suspend::Interrupt;

use super::detect::SignalList;
use super::element::Node;

/// Counter for generating unique re-renderer IDs.
static RERENDER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// The deferred render closure. Re-runs the resolver over the original
/// (captured) props and children, never over a previous resolution.
pub type RenderFn = Arc<dyn Fn() -> Result<Node, Interrupt> + Send + Sync>;

type NotifyFn = Arc<dyn Fn() + Send + Sync>;

/// A stateful boundary node owning subscriptions and a render closure.
pub struct Rerender {
    id: u64,

    /// The render closure. Fixed for the node's lifetime.
    render: RenderFn,

    /// Memoized handle list, in children-then-props order.
    handles: RwLock<SignalList>,

    /// Unsubscribe guards for the current subscription set.
    subscriptions: Mutex<Vec<Subscription>>,

    /// The host's local update trigger, present while mounted.
    notify: RwLock<Option<NotifyFn>>,

    mounted: AtomicBool,

    /// Number of times the render closure has been invoked.
    render_count: AtomicU64,

    /// Number of notifications acted upon.
    notify_count: AtomicU64,
}

impl Rerender {
    /// Create an unmounted re-renderer.
    pub fn new(handles: SignalList, render: RenderFn) -> Self {
        Self {
            id: RERENDER_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            render,
            handles: RwLock::new(handles),
            subscriptions: Mutex::new(Vec::new()),
            notify: RwLock::new(None),
            mounted: AtomicBool::new(false),
            render_count: AtomicU64::new(0),
            notify_count: AtomicU64::new(0),
        }
    }

    /// Create a re-renderer already wrapped as a [`Node`].
    pub fn node(handles: SignalList, render: RenderFn) -> Node {
        Node::Rerender(Arc::new(Self::new(handles, render)))
    }

    /// Get the re-renderer's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the node is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Number of handles currently subscribed-to (or to be subscribed).
    pub fn handle_count(&self) -> usize {
        self.handles.read().len()
    }

    /// Number of render-closure invocations so far.
    pub fn render_count(&self) -> u64 {
        self.render_count.load(Ordering::SeqCst)
    }

    /// Number of notifications acted upon so far.
    pub fn notify_count(&self) -> u64 {
        self.notify_count.load(Ordering::SeqCst)
    }

    /// Invoke the render closure.
    ///
    /// The closure re-resolves the captured original arguments, so the
    /// produced node reflects the stores' current state.
    pub fn render(&self) -> Result<Node, Interrupt> {
        self.render_count.fetch_add(1, Ordering::SeqCst);
        (self.render)()
    }

    /// Mount: subscribe to every handle and store the host's update
    /// trigger. Mounting an already-mounted node is an invariant violation
    /// and is ignored.
    pub fn mount(this: &Arc<Self>, notify: impl Fn() + Send + Sync + 'static) {
        if this.mounted.swap(true, Ordering::SeqCst) {
            debug_assert!(false, "re-renderer mounted twice");
            warn!(rerender = this.id, "mount called on a mounted re-renderer");
            return;
        }
        *this.notify.write() = Some(Arc::new(notify));
        Self::subscribe_all(this);
        trace!(rerender = this.id, handles = this.handle_count(), "mounted");
    }

    /// Present a fresh handle list, typically recomputed by the host when
    /// the element was reconstructed. No-op unless length or some element's
    /// identity changed; otherwise resubscribes while mounted.
    pub fn update_handles(this: &Arc<Self>, fresh: &[SignalHandle]) {
        {
            let current = this.handles.read();
            let unchanged = current.len() == fresh.len()
                && current.iter().zip(fresh).all(|(a, b)| a == b);
            if unchanged {
                trace!(rerender = this.id, "handle list unchanged, keeping subscriptions");
                return;
            }
        }

        *this.handles.write() = fresh.iter().cloned().collect();
        if this.is_mounted() {
            this.subscriptions.lock().clear();
            Self::subscribe_all(this);
        }
    }

    /// Unmount: drop every stored subscription exactly once. Idempotent.
    pub fn unmount(&self) {
        if !self.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        self.subscriptions.lock().clear();
        *self.notify.write() = None;
        trace!(rerender = self.id, "unmounted");
    }

    fn subscribe_all(this: &Arc<Self>) {
        let handles = this.handles.read().clone();
        let mut subscriptions = this.subscriptions.lock();
        debug_assert!(subscriptions.is_empty());
        for handle in handles.iter() {
            let weak = Arc::downgrade(this);
            subscriptions.push(handle.subscribe(move || {
                if let Some(rerender) = weak.upgrade() {
                    rerender.on_notify();
                }
            }));
        }
    }

    fn on_notify(&self) {
        // Guards the window between a store firing and the subscription
        // guard actually being dropped.
        if !self.is_mounted() {
            return;
        }
        self.notify_count.fetch_add(1, Ordering::SeqCst);
        let notify = self.notify.read().clone();
        if let Some(notify) = notify {
            notify();
        }
    }
}

impl fmt::Debug for Rerender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rerender")
            .field("id", &self.id)
            .field("mounted", &self.is_mounted())
            .field("handles", &self.handle_count())
            .field("render_count", &self.render_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::signal_in;
    use crate::store::{Atom, Store};
    use crate::tree::element::{ElementFactory, NativeFactory, Props};
    use std::sync::atomic::AtomicI32;

    fn constant_render() -> RenderFn {
        Arc::new(|| Ok(NativeFactory.create_element("span", Props::new(), Vec::new())))
    }

    fn boundary(handles: SignalList) -> Arc<Rerender> {
        Arc::new(Rerender::new(handles, constant_render()))
    }

    #[test]
    fn mount_subscribes_and_notifications_reach_the_trigger() {
        let store = Store::new();
        let atom = Atom::new(0);
        let handle = signal_in(&atom, &store);

        let rerender = boundary(SignalList::from_vec(vec![handle]));
        let triggers = Arc::new(AtomicI32::new(0));
        let triggers_clone = triggers.clone();

        Rerender::mount(&rerender, move || {
            triggers_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert!(rerender.is_mounted());
        assert_eq!(store.subscriber_count(&atom), 1);

        store.write(&atom, 1).unwrap();
        assert_eq!(triggers.load(Ordering::SeqCst), 1);
        assert_eq!(rerender.notify_count(), 1);

        store.write(&atom, 2).unwrap();
        assert_eq!(triggers.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unmount_severs_subscriptions() {
        let store = Store::new();
        let atom = Atom::new(0);
        let handle = signal_in(&atom, &store);

        let rerender = boundary(SignalList::from_vec(vec![handle]));
        let triggers = Arc::new(AtomicI32::new(0));
        let triggers_clone = triggers.clone();
        Rerender::mount(&rerender, move || {
            triggers_clone.fetch_add(1, Ordering::SeqCst);
        });

        rerender.unmount();
        assert!(!rerender.is_mounted());
        assert_eq!(store.subscriber_count(&atom), 0);

        store.write(&atom, 1).unwrap();
        assert_eq!(triggers.load(Ordering::SeqCst), 0);

        // Idempotent.
        rerender.unmount();
    }

    #[test]
    fn unchanged_handle_list_causes_no_churn() {
        let store = Store::new();
        let atom = Atom::new(0);
        let handle = signal_in(&atom, &store);

        let rerender = boundary(SignalList::from_vec(vec![handle.clone()]));
        Rerender::mount(&rerender, || {});
        assert_eq!(store.subscribe_ops(), 1);

        // Same identity, fresh lookup: the memoized list must be kept.
        let same = signal_in(&atom, &store);
        Rerender::update_handles(&rerender, &[same]);
        assert_eq!(store.subscribe_ops(), 1);
        assert_eq!(store.subscriber_count(&atom), 1);
    }

    #[test]
    fn changed_handle_list_resubscribes() {
        let store = Store::new();
        let first = Atom::new(0);
        let second = Atom::new(0);
        let first_handle = signal_in(&first, &store);
        let second_handle = signal_in(&second, &store);

        let rerender = boundary(SignalList::from_vec(vec![first_handle]));
        Rerender::mount(&rerender, || {});
        assert_eq!(store.subscriber_count(&first), 1);

        Rerender::update_handles(&rerender, &[second_handle]);
        assert_eq!(store.subscriber_count(&first), 0);
        assert_eq!(store.subscriber_count(&second), 1);
    }

    #[test]
    fn render_counts_invocations() {
        let rerender = boundary(SignalList::new());
        assert_eq!(rerender.render_count(), 0);

        rerender.render().unwrap();
        rerender.render().unwrap();
        assert_eq!(rerender.render_count(), 2);
    }
}
