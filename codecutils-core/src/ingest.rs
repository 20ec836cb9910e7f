use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::node::{Mapping, Node};
use crate::number::Number;
use crate::typed_array::TypedArray;

/// A Rust value that can be ingested into the node model.
///
/// Conversion decides the node variant once, up front: plain structs become
/// mappings, vectors become sequences, typed arrays stay typed arrays.
/// Containers built by a conversion are fresh on every call. A [`Node`]
/// converts to another handle on itself, so it keeps its identity.
///
/// Derive it with `#[derive(ToNode)]` (feature `derive`).
pub trait ToNode {
    fn to_node(&self) -> Node;
}

impl ToNode for Node {
    fn to_node(&self) -> Node {
        self.clone()
    }
}

impl ToNode for bool {
    fn to_node(&self) -> Node {
        Node::Bool(*self)
    }
}

impl ToNode for () {
    fn to_node(&self) -> Node {
        Node::Null
    }
}

impl ToNode for str {
    fn to_node(&self) -> Node {
        Node::String(self.to_string())
    }
}

impl ToNode for String {
    fn to_node(&self) -> Node {
        Node::String(self.clone())
    }
}

impl ToNode for char {
    fn to_node(&self) -> Node {
        Node::String(self.to_string())
    }
}

macro_rules! impl_to_node_number {
    ($($t:ty),*) => {
        $(
            impl ToNode for $t {
                fn to_node(&self) -> Node {
                    Node::Number(Number::from(*self))
                }
            }
        )*
    };
}

impl_to_node_number!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

impl ToNode for Number {
    fn to_node(&self) -> Node {
        Node::Number(*self)
    }
}

impl ToNode for TypedArray {
    fn to_node(&self) -> Node {
        Node::typed_array(self.clone())
    }
}

impl<T: ToNode + ?Sized> ToNode for &T {
    fn to_node(&self) -> Node {
        (**self).to_node()
    }
}

impl<T: ToNode + ?Sized> ToNode for Box<T> {
    fn to_node(&self) -> Node {
        (**self).to_node()
    }
}

impl<T: ToNode> ToNode for Option<T> {
    fn to_node(&self) -> Node {
        match self {
            Some(value) => value.to_node(),
            None => Node::Null,
        }
    }
}

impl<T: ToNode> ToNode for [T] {
    fn to_node(&self) -> Node {
        Node::sequence(self.iter().map(ToNode::to_node))
    }
}

impl<T: ToNode> ToNode for Vec<T> {
    fn to_node(&self) -> Node {
        self.as_slice().to_node()
    }
}

impl<T: ToNode, S> ToNode for IndexMap<String, T, S> {
    fn to_node(&self) -> Node {
        Node::from_mapping(entries(self.iter()))
    }
}

impl<T: ToNode> ToNode for BTreeMap<String, T> {
    fn to_node(&self) -> Node {
        Node::from_mapping(entries(self.iter()))
    }
}

impl<T: ToNode, S: BuildHasher> ToNode for HashMap<String, T, S> {
    fn to_node(&self) -> Node {
        Node::from_mapping(entries(self.iter()))
    }
}

fn entries<'a, T: ToNode + 'a>(iter: impl Iterator<Item = (&'a String, &'a T)>) -> Mapping {
    iter.map(|(k, v)| (k.clone(), v.to_node())).collect()
}
