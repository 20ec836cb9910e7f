//! Depth-first traversal of node graphs.
//!
//! A [`Traversal`] walks a graph in pre-order and hands each node to a
//! [`Visitor`] together with a [`Context`]: the path from the root, the chain
//! of ancestors and, when the node is one of its own ancestors, a `circular`
//! marker. The visitor answers with an [`Action`] that the walker applies.
//!
//! Ancestry is compared by identity ([`Node::id`]), never by value, so two
//! equal but distinct containers are never mistaken for a cycle. A node
//! marked circular is never descended into, which keeps every walk finite.
//!
//! Two modes are available:
//! - [`Traversal::for_each`] applies actions to the input graph in place.
//! - [`Traversal::map`] builds a fresh copy of every container it walks and
//!   leaves the input untouched.

use std::collections::HashMap;
use std::fmt;

use crate::node::{Node, NodeId};

/// One step of a path: a position in a sequence or a key in a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Index(usize),
    Key(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index(i) => write!(f, "{i}"),
            Segment::Key(k) => f.write_str(k),
        }
    }
}

/// What the walker should do with the node it just visited.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Keep the node and walk its children.
    Continue,
    /// Put this value in the node's place and walk the replacement's children.
    Replace(Node),
    /// Take the node out of its parent. Sequences close the gap; removing the
    /// root leaves `Null`.
    Remove,
    /// End the walk. No other node is visited.
    Stop,
}

/// Per-node traversal state handed to a [`Visitor`].
#[derive(Debug)]
pub struct Context<'a> {
    node: &'a Node,
    path: &'a [Segment],
    ancestors: &'a [Node],
    circular: Option<usize>,
}

impl<'a> Context<'a> {
    /// The node being visited.
    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// Segments from the root to this node.
    ///
    /// A segment names the position the node had in its parent when the walk
    /// reached it.
    pub fn path(&self) -> &'a [Segment] {
        self.path
    }

    /// The last path segment, None at the root.
    pub fn key(&self) -> Option<&'a Segment> {
        self.path.last()
    }

    /// Enclosing containers, root first.
    pub fn ancestors(&self) -> &'a [Node] {
        self.ancestors
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.ancestors.last()
    }

    /// Depth of the node; 0 at the root.
    pub fn level(&self) -> usize {
        self.path.len()
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// True for leaf values and for containers without children.
    pub fn is_leaf(&self) -> bool {
        !self.node.is_container() || self.node.is_empty()
    }

    /// The ancestor this node is identical to, if the node closes a cycle.
    pub fn circular(&self) -> Option<&'a Node> {
        self.circular.and_then(|level| self.ancestors.get(level))
    }

    /// Level of the ancestor returned by [`Context::circular`].
    pub fn circular_level(&self) -> Option<usize> {
        self.circular
    }
}

/// Receives every node of a traversal.
pub trait Visitor {
    fn visit(&mut self, cx: &Context<'_>) -> Action;
}

impl<F> Visitor for F
where
    F: FnMut(&Context<'_>) -> Action,
{
    fn visit(&mut self, cx: &Context<'_>) -> Action {
        self(cx)
    }
}

/// A traversal rooted at a node.
#[derive(Debug, Clone, Copy)]
pub struct Traversal<'a> {
    root: &'a Node,
}

impl<'a> Traversal<'a> {
    pub fn new(root: &'a Node) -> Self {
        Traversal { root }
    }

    /// Walks the graph and applies the visitor's actions in place.
    ///
    /// Returns the root after the walk, which differs from the input only
    /// when the root itself was replaced or removed.
    pub fn for_each(&self, visitor: impl Visitor) -> Node {
        Walker::new(visitor, Mode::InPlace).run(self.root)
    }

    /// Walks the graph and returns a modified copy; the input is not touched.
    ///
    /// Every container reached by the walk is copied, once per occurrence.
    /// A circular node that is kept refers to the copy of its ancestor, so the
    /// copy has the same cycles as the input. After [`Action::Stop`], the
    /// part of the graph that was not visited is deep-copied as is.
    pub fn map(&self, visitor: impl Visitor) -> Node {
        Walker::new(visitor, Mode::Cloning).run(self.root)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    InPlace,
    Cloning,
}

/// Outcome of walking one node, as seen by its parent.
enum Visited {
    Kept(Node),
    Replaced(Node),
    Removed,
}

struct Walker<V> {
    visitor: V,
    mode: Mode,
    path: Vec<Segment>,
    /// Containers currently being walked, root first.
    ancestors: Vec<Node>,
    /// What each ancestor becomes in the output. In place, the ancestor itself.
    targets: Vec<Node>,
    /// Deep copies made after a stop, keyed by source identity.
    detached: HashMap<NodeId, Node>,
    alive: bool,
}

impl<V: Visitor> Walker<V> {
    fn new(visitor: V, mode: Mode) -> Self {
        Walker {
            visitor,
            mode,
            path: Vec::new(),
            ancestors: Vec::new(),
            targets: Vec::new(),
            detached: HashMap::new(),
            alive: true,
        }
    }

    fn run(mut self, root: &Node) -> Node {
        match self.walk(root) {
            Visited::Kept(node) | Visited::Replaced(node) => node,
            Visited::Removed => Node::Null,
        }
    }

    fn find_ancestor(&self, node: &Node) -> Option<usize> {
        let id = node.id()?;
        self.ancestors.iter().position(|a| a.id() == Some(id))
    }

    fn walk(&mut self, node: &Node) -> Visited {
        if !self.alive {
            return Visited::Kept(self.detach(node));
        }

        let circular = self.find_ancestor(node);
        let cx = Context {
            node,
            path: &self.path,
            ancestors: &self.ancestors,
            circular,
        };
        let (current, replaced) = match self.visitor.visit(&cx) {
            Action::Continue => (node.clone(), false),
            Action::Replace(replacement) => (replacement, true),
            Action::Remove => return Visited::Removed,
            Action::Stop => {
                self.alive = false;
                return Visited::Kept(self.detach(node));
            }
        };

        let output = match (current.empty_like(), self.find_ancestor(&current)) {
            (None, _) => current,
            (Some(_), Some(level)) => self.targets.get(level).cloned().unwrap_or(current),
            (Some(empty), None) => match self.mode {
                Mode::InPlace => self.descend(current.clone(), current),
                Mode::Cloning => self.descend(current, empty),
            },
        };

        if replaced {
            Visited::Replaced(output)
        } else {
            Visited::Kept(output)
        }
    }

    /// Walks the children of `source`, writing the results into `target`.
    fn descend(&mut self, source: Node, target: Node) -> Node {
        let children = children_of(&source);
        self.ancestors.push(source);
        self.targets.push(target.clone());

        let mut removed = 0;
        for (segment, child) in children {
            self.path.push(segment.clone());
            let visited = self.walk(&child);
            self.path.pop();
            match self.mode {
                Mode::InPlace => apply(&target, segment, visited, &mut removed),
                Mode::Cloning => append(&target, segment, visited),
            }
        }

        self.targets.pop();
        self.ancestors.pop();
        target
    }

    /// Output for a node the walk no longer visits.
    fn detach(&mut self, node: &Node) -> Node {
        if self.mode == Mode::InPlace {
            return node.clone();
        }
        for (ancestor, target) in self.ancestors.iter().zip(&self.targets) {
            if let Some(id) = ancestor.id() {
                self.detached.entry(id).or_insert_with(|| target.clone());
            }
        }
        node.deep_copy_with(&mut self.detached)
    }
}

/// Snapshot of a container's children, so no borrow is held while walking.
fn children_of(node: &Node) -> Vec<(Segment, Node)> {
    match node {
        Node::Sequence(items) => items
            .borrow()
            .iter()
            .enumerate()
            .map(|(i, item)| (Segment::Index(i), item.clone()))
            .collect(),
        Node::Mapping(entries) => entries
            .borrow()
            .iter()
            .map(|(k, v)| (Segment::Key(k.clone()), v.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Applies a child outcome to the container being walked in place.
fn apply(target: &Node, segment: Segment, visited: Visited, removed: &mut usize) {
    match (target, segment, visited) {
        (_, _, Visited::Kept(_)) => {}
        (Node::Sequence(items), Segment::Index(i), Visited::Replaced(node)) => {
            if let Some(slot) = items.borrow_mut().get_mut(i - *removed) {
                *slot = node;
            }
        }
        (Node::Sequence(items), Segment::Index(i), Visited::Removed) => {
            let mut items = items.borrow_mut();
            if i - *removed < items.len() {
                items.remove(i - *removed);
                *removed += 1;
            }
        }
        (Node::Mapping(entries), Segment::Key(k), Visited::Replaced(node)) => {
            entries.borrow_mut().insert(k, node);
        }
        (Node::Mapping(entries), Segment::Key(k), Visited::Removed) => {
            entries.borrow_mut().shift_remove(&k);
        }
        _ => {}
    }
}

/// Adds a child outcome to a container copy under construction.
fn append(target: &Node, segment: Segment, visited: Visited) {
    let node = match visited {
        Visited::Kept(node) | Visited::Replaced(node) => node,
        Visited::Removed => return,
    };
    match (target, segment) {
        (Node::Sequence(items), _) => items.borrow_mut().push(node),
        (Node::Mapping(entries), Segment::Key(k)) => {
            entries.borrow_mut().insert(k, node);
        }
        _ => {}
    }
}
