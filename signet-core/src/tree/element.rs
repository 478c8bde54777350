//! Tree Nodes and the Native Constructor
//!
//! [`Node`] is the unit the UI tree is built from: either a plain
//! [`Element`] or a [`Rerender`] boundary produced by the interceptor.
//! [`ElementFactory`] is the construction seam; [`NativeFactory`] is the
//! native constructor that builds elements directly with no scanning and no
//! wrapping. The intercepting factory wraps a native one by injection, so
//! no global factory state is ever mutated.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::value::Value;

use super::rerender::Rerender;

/// Element props: a keyed structure with deterministic (insertion) order.
pub type Props = IndexMap<String, Value>;

/// A constructed UI tree node.
///
/// Cheap to clone; equality is reference identity.
#[derive(Clone)]
pub enum Node {
    /// A plain element.
    Element(Arc<Element>),
    /// A re-renderer boundary owning subscriptions and a render closure.
    Rerender(Arc<Rerender>),
}

impl Node {
    /// Reference identity.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Element(a), Node::Element(b)) => Arc::ptr_eq(a, b),
            (Node::Rerender(a), Node::Rerender(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Downcast to a plain element.
    pub fn as_element(&self) -> Option<&Arc<Element>> {
        match self {
            Node::Element(element) => Some(element),
            Node::Rerender(_) => None,
        }
    }

    /// Downcast to a re-renderer boundary.
    pub fn as_rerender(&self) -> Option<&Arc<Rerender>> {
        match self {
            Node::Rerender(rerender) => Some(rerender),
            Node::Element(_) => None,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(element) => f.debug_tuple("Element").field(element).finish(),
            Node::Rerender(rerender) => f.debug_tuple("Rerender").field(rerender).finish(),
        }
    }
}

/// A plain element: tag, props, children.
#[derive(Debug)]
pub struct Element {
    tag: Arc<str>,
    props: Props,
    children: Vec<Value>,
}

impl Element {
    /// Build an element.
    pub fn new(tag: impl Into<Arc<str>>, props: Props, children: Vec<Value>) -> Self {
        Self {
            tag: tag.into(),
            props,
            children,
        }
    }

    /// The element's tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The element's props.
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The element's children.
    pub fn children(&self) -> &[Value] {
        &self.children
    }
}

/// The element-construction seam.
///
/// The application decides which factory builds its tree: the native one,
/// or an intercepting factory wrapping it.
pub trait ElementFactory: Send + Sync + 'static {
    /// Construct a node from tag, props and children.
    fn create_element(&self, tag: &str, props: Props, children: Vec<Value>) -> Node;
}

/// The native element constructor. Builds a plain element, nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFactory;

impl ElementFactory for NativeFactory {
    fn create_element(&self, tag: &str, props: Props, children: Vec<Value>) -> Node {
        Node::Element(Arc::new(Element::new(tag, props, children)))
    }
}
