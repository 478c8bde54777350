//! Value Resolver
//!
//! Given a value that may contain signal handles, produce the equivalent
//! value with every handle replaced by its current read value. Traversal
//! rules are identical to the detector's.
//!
//! # Structural sharing
//!
//! Containers are rebuilt only when some contained value actually changed.
//! Any subtree containing no handles is returned as the original reference,
//! never copied, so reference-equality based memoization downstream stays
//! valid: `resolve(x)` is `Value::ptr_eq` to `x` whenever `x` is
//! transitively handle-free.
//!
//! A handle whose read value is itself a handle is unwrapped at most one
//! more level. Deeper chains are returned as-is; producing them is the
//! producer's problem and the resolver must not loop on them.

use std::sync::Arc;

use crate::suspend::Interrupt;
use crate::value::Value;

use super::element::Props;

/// Resolve a value, replacing embedded handles with their current values.
pub fn resolve(value: &Value) -> Result<Value, Interrupt> {
    Ok(resolve_inner(value)?.unwrap_or_else(|| value.clone()))
}

/// Resolve a children list. Unchanged entries keep their original
/// (shared) allocations.
pub fn resolve_slice(values: &[Value]) -> Result<Vec<Value>, Interrupt> {
    values.iter().map(resolve).collect()
}

/// Resolve props into a new map with unchanged values shared.
pub fn resolve_props(props: &Props) -> Result<Props, Interrupt> {
    props
        .iter()
        .map(|(key, value)| Ok((key.clone(), resolve(value)?)))
        .collect()
}

/// Returns `Some(new)` only if the value actually changed.
fn resolve_inner(value: &Value) -> Result<Option<Value>, Interrupt> {
    match value {
        Value::Signal(handle) => {
            let mut current = handle.read()?;
            // At most one extra level of handle unwrapping.
            if let Value::Signal(inner) = &current {
                current = inner.read()?;
            }
            Ok(Some(current))
        }
        Value::List(items) => {
            let mut rebuilt: Option<Vec<Value>> = None;
            for (index, item) in items.iter().enumerate() {
                if let Some(resolved) = resolve_inner(item)? {
                    rebuilt.get_or_insert_with(|| items.as_ref().clone())[index] = resolved;
                }
            }
            Ok(rebuilt.map(|items| Value::List(Arc::new(items))))
        }
        Value::Map(map) => {
            let mut rebuilt: Option<indexmap::IndexMap<String, Value>> = None;
            for (key, item) in map.iter() {
                if let Some(resolved) = resolve_inner(item)? {
                    rebuilt.get_or_insert_with(|| map.as_ref().clone())[key] = resolved;
                }
            }
            Ok(rebuilt.map(|map| Value::Map(Arc::new(map))))
        }
        // Everything else passes through untouched.
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::signal_in;
    use crate::store::{Atom, Store};

    #[test]
    fn handle_free_values_resolve_to_the_same_reference() {
        let value = Value::list([
            Value::Int(1),
            Value::map([("k", Value::from("v"))]),
            Value::opaque("foreign"),
        ]);

        let resolved = resolve(&value).unwrap();
        assert!(Value::ptr_eq(&value, &resolved));
    }

    #[test]
    fn a_handle_resolves_to_its_current_value() {
        let store = Store::new();
        let atom = Atom::new(7);
        let handle = signal_in(&atom, &store);

        assert_eq!(
            resolve(&Value::Signal(handle.clone())).unwrap(),
            Value::Int(7)
        );

        store.write(&atom, 8).unwrap();
        assert_eq!(resolve(&Value::Signal(handle)).unwrap(), Value::Int(8));
    }

    #[test]
    fn siblings_of_a_resolved_slot_keep_their_references() {
        let store = Store::new();
        let atom = Atom::new(1);
        let handle = signal_in(&atom, &store);

        let sibling = Value::map([("deep", Value::list([Value::Int(0)]))]);
        let container = Value::list([sibling.clone(), Value::Signal(handle)]);

        let resolved = resolve(&container).unwrap();
        // The container itself was rebuilt.
        assert!(!Value::ptr_eq(&container, &resolved));
        match &resolved {
            Value::List(items) => {
                assert!(Value::ptr_eq(&items[0], &sibling));
                assert_eq!(items[1], Value::Int(1));
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn map_slots_resolve_in_place() {
        let store = Store::new();
        let atom = Atom::new("live");
        let handle = signal_in(&atom, &store);

        let value = Value::map([
            ("static", Value::Int(3)),
            ("dynamic", Value::Signal(handle)),
        ]);

        let resolved = resolve(&value).unwrap();
        assert_eq!(
            resolved,
            Value::map([
                ("static", Value::Int(3)),
                ("dynamic", Value::from("live")),
            ])
        );
    }

    #[test]
    fn handle_returning_a_handle_unwraps_once() {
        let store = Store::new();
        let target = Atom::new(42);
        let target_handle = signal_in(&target, &store);

        let forwarding = Atom::new(Value::Signal(target_handle));
        let handle = signal_in(&forwarding, &store);

        assert_eq!(resolve(&Value::Signal(handle)).unwrap(), Value::Int(42));
    }

    #[test]
    fn suspension_interrupts_resolution() {
        let store = Store::new();
        let (atom, cell) = Atom::pending();
        let handle = signal_in(&atom, &store);

        let container = Value::list([Value::Int(1), Value::Signal(handle.clone())]);
        assert_eq!(
            resolve(&container),
            Err(Interrupt::Suspended(cell.clone()))
        );

        cell.fulfill("done");
        assert_eq!(
            resolve(&container).unwrap(),
            Value::list([Value::Int(1), Value::from("done")])
        );
    }

    #[test]
    fn resolve_props_shares_unchanged_values() {
        let store = Store::new();
        let atom = Atom::new(5);
        let handle = signal_in(&atom, &store);

        let untouched = Value::list([Value::Int(9)]);
        let mut props = Props::new();
        props.insert("still".into(), untouched.clone());
        props.insert("live".into(), Value::Signal(handle));

        let resolved = resolve_props(&props).unwrap();
        assert!(Value::ptr_eq(&resolved["still"], &untouched));
        assert_eq!(resolved["live"], Value::Int(5));
    }
}
