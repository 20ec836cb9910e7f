use indexmap::IndexMap;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::number::Number;
use crate::typed_array::TypedArray;

/// Contents of a sequence node.
pub type Sequence = Vec<Node>;

/// Contents of a mapping node. Keys keep their insertion order.
pub type Mapping = IndexMap<String, Node>;

/// Identity of an internal node: the address of its shared allocation.
///
/// Two handles have the same id exactly when they point at the same
/// sequence or mapping, regardless of contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A value in an in-memory object graph.
///
/// Sequences and mappings are shared handles: cloning a `Node` clones the
/// handle, so the same container can appear at several places in a graph,
/// including inside itself. Use [`Node::deep_copy`] for an independent copy.
///
/// Equality is structural. Comparing graphs that contain cycles does not
/// terminate; normalize them first.
#[derive(Clone, PartialEq, Default)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Rc<RefCell<Sequence>>),
    Mapping(Rc<RefCell<Mapping>>),
    TypedArray(Rc<TypedArray>),
    /// A value with no plain representation, identified by its type name.
    Opaque(String),
}

impl Node {
    /// Creates a sequence node from the given items.
    pub fn sequence(items: impl IntoIterator<Item = Node>) -> Self {
        Node::from_sequence(items.into_iter().collect())
    }

    /// Creates a mapping node from key/value pairs, in order.
    pub fn mapping<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Self {
        Node::from_mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn from_sequence(items: Sequence) -> Self {
        Node::Sequence(Rc::new(RefCell::new(items)))
    }

    pub fn from_mapping(entries: Mapping) -> Self {
        Node::Mapping(Rc::new(RefCell::new(entries)))
    }

    /// Creates an empty mapping node.
    pub fn new_mapping() -> Self {
        Node::from_mapping(Mapping::new())
    }

    /// Creates an empty sequence node.
    pub fn new_sequence() -> Self {
        Node::from_sequence(Sequence::new())
    }

    pub fn typed_array(array: impl Into<TypedArray>) -> Self {
        Node::TypedArray(Rc::new(array.into()))
    }

    pub fn opaque(type_name: impl Into<String>) -> Self {
        Node::Opaque(type_name.into())
    }

    /// Returns the identity of a sequence or mapping, None for leaves.
    pub fn id(&self) -> Option<NodeId> {
        match self {
            Node::Sequence(items) => Some(NodeId(Rc::as_ptr(items).cast::<()>() as usize)),
            Node::Mapping(entries) => Some(NodeId(Rc::as_ptr(entries).cast::<()>() as usize)),
            _ => None,
        }
    }

    /// Returns true if both handles point at the same container.
    pub fn same_node(&self, other: &Node) -> bool {
        self.id().is_some() && self.id() == other.id()
    }

    /// Returns true for sequences and mappings.
    pub fn is_container(&self) -> bool {
        matches!(self, Node::Sequence(_) | Node::Mapping(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Node::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<Ref<'_, Sequence>> {
        match self {
            Node::Sequence(items) => Some(items.borrow()),
            _ => None,
        }
    }

    pub fn as_sequence_mut(&self) -> Option<RefMut<'_, Sequence>> {
        match self {
            Node::Sequence(items) => Some(items.borrow_mut()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<Ref<'_, Mapping>> {
        match self {
            Node::Mapping(entries) => Some(entries.borrow()),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&self) -> Option<RefMut<'_, Mapping>> {
        match self {
            Node::Mapping(entries) => Some(entries.borrow_mut()),
            _ => None,
        }
    }

    pub fn as_typed_array(&self) -> Option<&TypedArray> {
        match self {
            Node::TypedArray(array) => Some(array),
            _ => None,
        }
    }

    /// Looks up a key in a mapping, returning a handle to the value.
    pub fn get(&self, key: &str) -> Option<Node> {
        self.as_mapping().and_then(|entries| entries.get(key).cloned())
    }

    /// Looks up a position in a sequence, returning a handle to the value.
    pub fn get_index(&self, index: usize) -> Option<Node> {
        self.as_sequence().and_then(|items| items.get(index).cloned())
    }

    /// Sets `key` on a mapping, returning the previous value.
    ///
    /// Does nothing on other nodes.
    pub fn insert(&self, key: impl Into<String>, value: Node) -> Option<Node> {
        self.as_mapping_mut()
            .and_then(|mut entries| entries.insert(key.into(), value))
    }

    /// Appends to a sequence. Does nothing on other nodes.
    pub fn push(&self, value: Node) {
        if let Some(mut items) = self.as_sequence_mut() {
            items.push(value);
        }
    }

    /// Number of direct children of a container, 0 for leaves.
    pub fn len(&self) -> usize {
        match self {
            Node::Sequence(items) => items.borrow().len(),
            Node::Mapping(entries) => entries.borrow().len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the type name as a string for error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
            Node::TypedArray(array) => array.element_type().name(),
            Node::Opaque(name) => name,
        }
    }

    /// Returns an empty container of the same kind, or None for leaves.
    pub(crate) fn empty_like(&self) -> Option<Node> {
        match self {
            Node::Sequence(_) => Some(Node::new_sequence()),
            Node::Mapping(_) => Some(Node::new_mapping()),
            _ => None,
        }
    }

    /// Copies the whole graph reachable from this node.
    ///
    /// The copy shares nothing with the input. Sharing inside the graph is
    /// preserved: a container reachable along two paths is copied once, and
    /// cycles in the input are cycles in the copy.
    pub fn deep_copy(&self) -> Node {
        self.deep_copy_with(&mut HashMap::new())
    }

    pub(crate) fn deep_copy_with(&self, copies: &mut HashMap<NodeId, Node>) -> Node {
        let id = self.id();
        if let Some(copy) = id.and_then(|id| copies.get(&id)) {
            return copy.clone();
        }
        match (self, id) {
            (Node::Sequence(items), Some(id)) => {
                let copy = Node::new_sequence();
                copies.insert(id, copy.clone());
                let copied: Sequence = items
                    .borrow()
                    .iter()
                    .map(|item| item.deep_copy_with(copies))
                    .collect();
                if let Some(mut target) = copy.as_sequence_mut() {
                    *target = copied;
                }
                copy
            }
            (Node::Mapping(entries), Some(id)) => {
                let copy = Node::new_mapping();
                copies.insert(id, copy.clone());
                let copied: Mapping = entries
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy_with(copies)))
                    .collect();
                if let Some(mut target) = copy.as_mapping_mut() {
                    *target = copied;
                }
                copy
            }
            (Node::TypedArray(array), _) => Node::TypedArray(Rc::new(TypedArray::clone(array))),
            (leaf, _) => leaf.clone(),
        }
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Bool(value)
    }
}

impl From<Number> for Node {
    fn from(value: Number) -> Self {
        Node::Number(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::String(value.to_string())
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::String(value)
    }
}

impl From<TypedArray> for Node {
    fn from(value: TypedArray) -> Self {
        Node::TypedArray(Rc::new(value))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = RefCell::new(Vec::new());
        CycleSafe { node: self, open: &open }.fmt(f)
    }
}

/// Debug adapter that prints `[Circular]` instead of re-entering a container
/// that is already being printed.
struct CycleSafe<'a> {
    node: &'a Node,
    open: &'a RefCell<Vec<NodeId>>,
}

impl CycleSafe<'_> {
    fn child<'b>(&'b self, node: &'b Node) -> CycleSafe<'b> {
        CycleSafe {
            node,
            open: self.open,
        }
    }
}

impl fmt::Debug for CycleSafe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(id) = self.node.id() else {
            return match self.node {
                Node::Null => f.write_str("null"),
                Node::Bool(b) => write!(f, "{b}"),
                Node::Number(n) => write!(f, "{n}"),
                Node::String(s) => write!(f, "{s:?}"),
                Node::TypedArray(array) => f
                    .debug_tuple(array.element_type().name())
                    .field(&array.iter().map(|n| n.as_f64()).collect::<Vec<_>>())
                    .finish(),
                Node::Opaque(name) => write!(f, "Opaque({name})"),
                Node::Sequence(_) | Node::Mapping(_) => Ok(()),
            };
        };
        if self.open.borrow().contains(&id) {
            return f.write_str("[Circular]");
        }
        self.open.borrow_mut().push(id);
        let result = match self.node {
            Node::Sequence(items) => f
                .debug_list()
                .entries(items.borrow().iter().map(|item| self.child(item)))
                .finish(),
            Node::Mapping(entries) => f
                .debug_map()
                .entries(entries.borrow().iter().map(|(k, v)| (k, self.child(v))))
                .finish(),
            _ => Ok(()),
        };
        self.open.borrow_mut().pop();
        result
    }
}
