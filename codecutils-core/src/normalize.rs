//! Serialization-friendly normalization.
//!
//! A graph is ready for a textual serializer once it has no cycles and no
//! typed arrays. Both fixes are applied to copies; the caller's graph is never
//! modified.

use log::debug;
use std::borrow::Cow;

use crate::node::Node;
use crate::traverse::{Action, Context, Traversal};

/// Returns true if some node of the graph is one of its own ancestors.
pub fn has_circular_reference(node: &Node) -> bool {
    let mut found = false;
    Traversal::new(node).for_each(|cx: &Context<'_>| {
        if cx.circular().is_some() {
            found = true;
            Action::Stop
        } else {
            Action::Continue
        }
    });
    found
}

/// Counts the typed arrays reachable from `node`, once per occurrence.
pub fn count_typed_arrays(node: &Node) -> usize {
    let mut count = 0;
    Traversal::new(node).for_each(|cx: &Context<'_>| {
        if cx.node().as_typed_array().is_some() {
            count += 1;
        }
        Action::Continue
    });
    count
}

/// Returns a copy of the graph with every circular edge removed.
///
/// An edge is cut where the walk first meets a node identical to one of its
/// ancestors, which is the occurrence closest to the root. Returns `None`
/// when the graph has no cycle.
pub fn remove_circular_references(node: &Node) -> Option<Node> {
    let mut removed = 0usize;
    let copy = Traversal::new(node).map(|cx: &Context<'_>| {
        if cx.circular().is_some() {
            removed += 1;
            Action::Remove
        } else {
            Action::Continue
        }
    });
    if removed == 0 {
        return None;
    }
    debug!("removed {removed} circular reference(s)");
    Some(copy)
}

/// Returns a copy of the graph with each typed array replaced by a plain
/// sequence of its elements, in order.
///
/// Returns `None` when the graph contains no typed array.
pub fn flatten_typed_arrays(node: &Node) -> Option<Node> {
    let mut flattened = 0usize;
    let copy = Traversal::new(node).map(|cx: &Context<'_>| match cx.node().as_typed_array() {
        Some(array) => {
            flattened += 1;
            Action::Replace(array.to_sequence())
        }
        None => Action::Continue,
    });
    if flattened == 0 {
        return None;
    }
    debug!("flattened {flattened} typed array(s)");
    Some(copy)
}

/// Removes cycles, then flattens typed arrays.
///
/// Borrows the input back when neither step had anything to do; otherwise
/// returns the fixed copy.
pub fn normalize(node: &Node) -> Cow<'_, Node> {
    let acyclic = remove_circular_references(node);
    let current = acyclic.as_ref().unwrap_or(node);
    if let Some(flat) = flatten_typed_arrays(current) {
        return Cow::Owned(flat);
    }
    match acyclic {
        Some(acyclic) => Cow::Owned(acyclic),
        None => Cow::Borrowed(node),
    }
}
