//! Integration Tests for the Reactivity Bridge
//!
//! These tests verify that stores, signal handles, the intercepting element
//! factory, and the reference host work together correctly: fine-grained
//! re-rendering, subscription hygiene, the write contract, and the
//! suspend-on-read path.

use signet_core::{
    atom_signal, create_element, signal, signal_in, Atom, Host, Interrupt, Node, Props,
    SignalError, Store, Value,
};

fn span_of(value: Value) -> Node {
    create_element("span", Props::new(), vec![value])
}

/// Test that handle lookups are memoized per (store, atom) pair.
#[test]
fn handle_identity_is_per_store_and_atom() {
    let store_a = Store::new();
    let store_b = Store::new();
    let atom = Atom::new(0);
    let other = Atom::new(0);

    // Same pair, same instance.
    assert_eq!(signal_in(&atom, &store_a), signal_in(&atom, &store_a));

    // Different store or different atom, different instance.
    assert_ne!(signal_in(&atom, &store_a), signal_in(&atom, &store_b));
    assert_ne!(signal_in(&atom, &store_a), signal_in(&other, &store_a));

    // The default-store path is memoized the same way.
    assert_eq!(signal(&atom), signal(&atom));
    assert_ne!(signal(&atom), signal_in(&atom, &store_a));
}

/// Test that a handle goes inert once its store is dropped, and that a
/// fresh store yields a fresh handle for the same atom.
#[test]
fn dropping_the_store_orphans_its_handles() {
    let atom = Atom::new(1);

    let orphan = {
        let store = Store::new();
        signal_in(&atom, &store)
    };
    assert_eq!(
        orphan.read(),
        Err(Interrupt::Failed(SignalError::MissingValue(atom.id())))
    );

    let replacement = Store::new();
    let fresh = signal_in(&atom, &replacement);
    assert_ne!(fresh, orphan);
    assert_eq!(fresh.read(), Ok(Value::Int(1)));
}

/// Test that a write re-renders only the boundary referencing the written
/// atom; sibling boundaries and ancestors are untouched.
#[test]
fn writes_re_render_only_the_referencing_boundary() {
    let host = Host::new();
    let store = Store::new();
    let left_atom = Atom::new(0);
    let right_atom = Atom::new(100);
    let left = signal_in(&left_atom, &store);
    let right = signal_in(&right_atom, &store);

    let left_node = span_of(Value::Signal(left));
    let right_node = span_of(Value::Signal(right));
    let left_boundary = left_node.as_rerender().unwrap().clone();
    let right_boundary = right_node.as_rerender().unwrap().clone();

    let root = create_element(
        "div",
        Props::new(),
        vec![Value::Node(left_node), Value::Node(right_node)],
    );
    // No handles at this level, so the root stays a plain element.
    assert!(root.as_element().is_some());

    let tree = host.mount(&root);
    assert_eq!(tree.to_html(), "<div><span>0</span><span>100</span></div>");
    assert_eq!(left_boundary.render_count(), 1);
    assert_eq!(right_boundary.render_count(), 1);

    store.write(&left_atom, 1).unwrap();
    assert_eq!(tree.to_html(), "<div><span>1</span><span>100</span></div>");
    assert_eq!(left_boundary.render_count(), 2);
    assert_eq!(right_boundary.render_count(), 1);
}

/// Test that repeated writes cause no subscription churn: the boundary
/// subscribes once at mount and keeps those subscriptions across renders.
#[test]
fn repeated_writes_do_not_resubscribe() {
    let host = Host::new();
    let store = Store::new();
    let atom = Atom::new(0);
    let handle = signal_in(&atom, &store);

    let node = span_of(Value::Signal(handle));
    let tree = host.mount(&node);
    let after_mount = store.subscribe_ops();

    for next in 1..=5 {
        store.write(&atom, next).unwrap();
    }
    assert_eq!(tree.to_html(), "<span>5</span>");
    assert_eq!(store.subscribe_ops(), after_mount);
    assert_eq!(store.subscriber_count(&atom), 1);
}

/// Test the whole write contract through a handle: whole-value replacement
/// works, sub-path writes and read-only atoms are rejected atomically.
#[test]
fn handle_write_contract() {
    use signet_core::signal::PathSegment;

    let (counter, counter_signal) = atom_signal(0);
    counter_signal.write(1).unwrap();
    assert_eq!(counter_signal.read(), Ok(Value::Int(1)));
    assert_eq!(signal(&counter).read(), Ok(Value::Int(1)));

    let profile = Value::map([("name", Value::from("Ada"))]);
    let (_profile_atom, profile_signal) = atom_signal(profile.clone());
    assert_eq!(
        profile_signal.set(&[PathSegment::Key("name".into())], "Grace"),
        Err(SignalError::UnsupportedSubPathWrite)
    );
    assert_eq!(profile_signal.read(), Ok(profile));

    let frozen = Atom::read_only(7);
    let frozen_signal = signal(&frozen);
    assert!(!frozen_signal.is_writable());
    assert_eq!(frozen_signal.write(8), Err(SignalError::NotWritable));
    assert_eq!(frozen_signal.read(), Ok(Value::Int(7)));
}

/// Test the classic counter: click increments through the handle, the
/// boundary re-renders, static siblings keep their output.
#[test]
fn counter_click_updates_in_place() {
    let host = Host::new();
    let store = Store::new();
    let count = Atom::new(0);
    let count_signal = signal_in(&count, &store);

    let label = span_of(Value::from("count:"));
    let counter = span_of(Value::Signal(count_signal.clone()));
    let root = create_element(
        "div",
        Props::new(),
        vec![Value::Node(label), Value::Node(counter)],
    );

    let tree = host.mount(&root);
    assert_eq!(tree.to_html(), "<div><span>count:</span><span>0</span></div>");

    // The click handler pattern: read, increment, write back.
    let current = match count_signal.read() {
        Ok(Value::Int(n)) => n,
        other => panic!("unexpected read {other:?}"),
    };
    count_signal.write(current + 1).unwrap();
    assert_eq!(tree.to_html(), "<div><span>count:</span><span>1</span></div>");
}

/// Test that values in the same store are independent per store: a write
/// in one store never re-renders a tree bound to another.
#[test]
fn stores_isolate_rendered_trees() {
    let host = Host::new();
    let store_a = Store::new();
    let store_b = Store::new();
    let atom = Atom::new(0);

    let node = span_of(Value::Signal(signal_in(&atom, &store_a)));
    let boundary = node.as_rerender().unwrap().clone();
    let tree = host.mount(&node);

    store_b.write(&atom, 42).unwrap();
    assert_eq!(tree.to_html(), "<span>0</span>");
    assert_eq!(boundary.render_count(), 1);

    store_a.write(&atom, 7).unwrap();
    assert_eq!(tree.to_html(), "<span>7</span>");
}

/// Test that a boundary nested in a re-rendering boundary's children keeps
/// re-rendering after the outer boundary refreshes: the outer render
/// re-emits the same captured inner node, which must be unmounted and
/// mounted again cleanly, not double-mounted or severed.
#[test]
fn nested_boundary_keeps_reacting_after_outer_refresh() {
    let host = Host::new();
    let store = Store::new();
    let outer_atom = Atom::new(0);
    let inner_atom = Atom::new(100);

    let inner = create_element(
        "em",
        Props::new(),
        vec![Value::Signal(signal_in(&inner_atom, &store))],
    );
    let inner_boundary = inner.as_rerender().unwrap().clone();
    let outer = create_element(
        "span",
        Props::new(),
        vec![
            Value::Signal(signal_in(&outer_atom, &store)),
            Value::Node(inner),
        ],
    );

    let tree = host.mount(&outer);
    assert_eq!(tree.to_html(), "<span>0<em>100</em></span>");
    assert_eq!(store.subscriber_count(&inner_atom), 1);

    store.write(&outer_atom, 1).unwrap();
    assert_eq!(tree.to_html(), "<span>1<em>100</em></span>");
    assert!(inner_boundary.is_mounted());
    assert_eq!(store.subscriber_count(&inner_atom), 1);

    store.write(&inner_atom, 101).unwrap();
    assert_eq!(tree.to_html(), "<span>1<em>101</em></span>");

    tree.unmount();
    assert_eq!(store.subscriber_count(&outer_atom), 0);
    assert_eq!(store.subscriber_count(&inner_atom), 0);
}

/// Test the suspend-on-read path: a pending atom shows the fallback, and
/// settling it re-enters the render with the fulfilled value.
#[test]
fn pending_atom_suspends_then_renders_its_value() {
    let host = Host::with_fallback("loading");
    let store = Store::new();
    let (name, pending) = Atom::pending();
    let name_signal = signal_in(&name, &store);

    let node = span_of(Value::Signal(name_signal.clone()));
    let tree = host.mount(&node);
    assert_eq!(tree.to_html(), "loading");

    // A direct read during the pending window suspends with the same cell.
    assert_eq!(name_signal.read(), Err(Interrupt::Suspended(pending.clone())));

    pending.fulfill("Ada");
    assert_eq!(tree.to_html(), "<span>Ada</span>");
    assert_eq!(name_signal.read(), Ok(Value::from("Ada")));
    assert!(host.taken_errors().is_empty());
}

/// Test that a rejected pending value surfaces as a propagated error at
/// the host's boundary instead of rendering.
#[test]
fn rejected_atom_reaches_the_error_boundary() {
    let host = Host::new();
    let store = Store::new();
    let (name, pending) = Atom::pending();

    let node = span_of(Value::Signal(signal_in(&name, &store)));
    let tree = host.mount(&node);

    pending.reject("network down");
    assert_eq!(tree.to_html(), "");
    assert_eq!(
        host.taken_errors(),
        vec![SignalError::propagated("network down")]
    );
}

/// Test that unmounting severs every subscription and freezes the tree.
#[test]
fn unmount_severs_all_subscriptions() {
    let host = Host::new();
    let store = Store::new();
    let left_atom = Atom::new(0);
    let right_atom = Atom::new(0);

    let root = create_element(
        "div",
        Props::new(),
        vec![
            Value::Node(span_of(Value::Signal(signal_in(&left_atom, &store)))),
            Value::Node(span_of(Value::Signal(signal_in(&right_atom, &store)))),
        ],
    );
    let tree = host.mount(&root);
    assert_eq!(store.subscriber_count(&left_atom), 1);
    assert_eq!(store.subscriber_count(&right_atom), 1);

    tree.unmount();
    assert_eq!(store.subscriber_count(&left_atom), 0);
    assert_eq!(store.subscriber_count(&right_atom), 0);

    store.write(&left_atom, 1).unwrap();
    assert_eq!(tree.to_html(), "<div><span>0</span><span>0</span></div>");

    // Unmount again; still fine.
    tree.unmount();
}

/// Test that dropping the mounted tree unsubscribes, same as unmount.
#[test]
fn dropping_the_tree_unsubscribes() {
    let host = Host::new();
    let store = Store::new();
    let atom = Atom::new(0);

    let node = span_of(Value::Signal(signal_in(&atom, &store)));
    let tree = host.mount(&node);
    assert_eq!(store.subscriber_count(&atom), 1);

    drop(tree);
    assert_eq!(store.subscriber_count(&atom), 0);
}

/// Test that a tree without handles never grows a boundary and renders
/// through the fast path at every level.
#[test]
fn static_trees_take_the_fast_path() {
    let mut props = Props::new();
    props.insert("class".into(), Value::from("static"));

    let inner = create_element("em", Props::new(), vec![Value::from("plain")]);
    let root = create_element("p", props, vec![Value::Node(inner.clone())]);

    assert!(inner.as_element().is_some());
    assert!(root.as_element().is_some());

    let tree = Host::new().mount(&root);
    assert_eq!(tree.to_html(), "<p class=\"static\"><em>plain</em></p>");
}

/// Test that signal-bearing props wrap the element and track writes.
#[test]
fn reactive_props_track_writes() {
    let host = Host::new();
    let store = Store::new();
    let color = Atom::new("red");

    let mut props = Props::new();
    props.insert("color".into(), Value::Signal(signal_in(&color, &store)));
    let node = create_element("div", props, vec![Value::from("body")]);
    assert!(node.as_rerender().is_some());

    let tree = host.mount(&node);
    assert_eq!(tree.to_html(), "<div color=\"red\">body</div>");

    store.write(&color, "blue").unwrap();
    assert_eq!(tree.to_html(), "<div color=\"blue\">body</div>");
}

/// Test that the handle cache drops its entry once the atom is gone.
#[test]
fn compact_evicts_handles_of_dropped_atoms() {
    let store = Store::new();
    let atom = Atom::new(0);
    let _handle = signal_in(&atom, &store);
    assert_eq!(store.signal_count(), 1);

    drop(atom);
    store.compact();
    assert_eq!(store.signal_count(), 0);
}
