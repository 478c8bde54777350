//! Signal Detector
//!
//! A structural scan over a props or children value that finds every
//! embedded signal handle. The scan is depth-first in first-seen order and
//! descends only into the plain containers (`List` element-by-element,
//! `Map` value-by-value in insertion order). Scalars, constructed nodes and
//! opaque objects contribute nothing and are never descended into, which
//! bounds the recursion and avoids false positives on foreign object
//! graphs.
//!
//! Repeated occurrences of one handle are reported once: the re-renderer
//! needs one subscription per atom, not one per mention.

use smallvec::SmallVec;

use crate::signal::SignalHandle;
use crate::value::Value;

use super::element::Props;

/// Handle list sized for the common case of a few signals per element.
pub type SignalList = SmallVec<[SignalHandle; 4]>;

/// Find every signal handle embedded in a value.
pub fn find_signals(value: &Value) -> SignalList {
    let mut found = SignalList::new();
    collect(value, &mut found);
    found
}

/// Scan a children list, left to right.
pub fn find_in_slice(values: &[Value]) -> SignalList {
    let mut found = SignalList::new();
    for value in values {
        collect(value, &mut found);
    }
    found
}

/// Scan props, value-by-value in insertion order.
pub fn find_in_props(props: &Props) -> SignalList {
    let mut found = SignalList::new();
    for value in props.values() {
        collect(value, &mut found);
    }
    found
}

fn collect(value: &Value, found: &mut SignalList) {
    match value {
        Value::Signal(handle) => {
            if !found.iter().any(|seen| seen == handle) {
                found.push(handle.clone());
            }
        }
        Value::List(items) => {
            for item in items.iter() {
                collect(item, found);
            }
        }
        Value::Map(map) => {
            for item in map.values() {
                collect(item, found);
            }
        }
        // Scalars, nodes and opaque objects: no descent.
        _ => {}
    }
}
