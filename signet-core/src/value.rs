//! Value Trees
//!
//! [`Value`] is the dynamic value type that flows through element props and
//! children. A value is either a scalar leaf, a container (`List`, `Map`),
//! an embedded [`SignalHandle`], an already-constructed tree [`Node`], or an
//! opaque foreign object.
//!
//! Containers are `Arc`-shared. This is what makes the resolver's structural
//! sharing guarantee expressible: a subtree that contains no signals is
//! returned as the original reference, never copied, so downstream
//! reference-equality checks stay valid. [`Value::ptr_eq`] reports that
//! reference identity.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::signal::SignalHandle;
use crate::tree::Node;

/// A dynamic value embedded in an element's props or children.
#[derive(Clone)]
pub enum Value {
    /// Absent value. Renders as nothing.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Arc<str>),
    /// Ordered sequence. Scanned element-by-element by the detector.
    List(Arc<Vec<Value>>),
    /// Keyed structure with deterministic (insertion) key order.
    Map(Arc<IndexMap<String, Value>>),
    /// A live signal handle. Resolved to its current value at render time.
    Signal(SignalHandle),
    /// A constructed element subtree. Opaque to the detector: nested
    /// elements intercept their own signals at their own construction site.
    Node(Node),
    /// A foreign object the bridge never descends into.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Build a text value.
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    /// Build a list value from anything iterable.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(Arc::new(items.into_iter().collect()))
    }

    /// Build a map value from key/value pairs, preserving insertion order.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::Map(Arc::new(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        ))
    }

    /// Wrap a foreign object.
    pub fn opaque(object: impl Any + Send + Sync) -> Self {
        Self::Opaque(Arc::new(object))
    }

    /// Reference identity: true when both values are the same scalar or
    /// share the same underlying allocation.
    ///
    /// This is the equality the resolver's sharing invariant is stated in:
    /// `resolve(x)` is `ptr_eq` to `x` whenever `x` contains no signals.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Text(x), Value::Text(y)) => Arc::ptr_eq(x, y),
            (Value::List(x), Value::List(y)) => Arc::ptr_eq(x, y),
            (Value::Map(x), Value::Map(y)) => Arc::ptr_eq(x, y),
            (Value::Signal(x), Value::Signal(y)) => x == y,
            (Value::Node(x), Value::Node(y)) => x.ptr_eq(y),
            (Value::Opaque(x), Value::Opaque(y)) => Arc::ptr_eq(x, y),
            _ => a == b,
        }
    }

    /// Check whether this value is a bare signal handle.
    pub fn is_signal(&self) -> bool {
        matches!(self, Value::Signal(_))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Handles and nodes compare by identity, not structure.
            (Value::Signal(a), Value::Signal(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Value::List(v) => f.debug_tuple("List").field(v).finish(),
            Value::Map(v) => f.debug_tuple("Map").field(v).finish(),
            Value::Signal(v) => f.debug_tuple("Signal").field(v).finish(),
            Value::Node(v) => f.debug_tuple("Node").field(v).finish(),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Text rendering used by the reference host when a value appears as a
/// child or an attribute. `Null` renders as the empty string; lists render
/// as their concatenated items.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::List(items) => {
                for item in items.iter() {
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Signal(_) => f.write_str("[signal]"),
            Value::Node(_) => f.write_str("[node]"),
            Value::Opaque(_) => f.write_str("[opaque]"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(Arc::from(v))
    }
}

impl From<SignalHandle> for Value {
    fn from(handle: SignalHandle) -> Self {
        Value::Signal(handle)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Node(node)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(map))
    }
}
