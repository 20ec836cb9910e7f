//! Byte-level codec utilities.
//!
//! Core concepts:
//! - **Node**: a value in an in-memory object graph. Sequences and mappings are
//!   shared handles, so graphs can share structure and contain cycles
//! - **Traversal**: a depth-first walk over a graph that reports circular
//!   references and lets a visitor keep, replace or remove each node
//! - **Normalization**: a copy of a graph with cycles cut and typed numeric
//!   arrays flattened into plain sequences, ready for JSON
//! - **Marshaling**: graph to UTF-8 JSON bytes and back
//!
//! # Example
//!
//! ```
//! use codecutils_core::{buffer_to_object, normalize, object_to_buffer, Node};
//!
//! let sample = Node::mapping([
//!     ("name", Node::from("I can has 🍔")),
//!     ("data", Node::typed_array(vec![1.0f32, 2.0, 3.0])),
//! ]);
//! sample.insert("me", sample.clone());
//!
//! let bytes = object_to_buffer(&sample).unwrap();
//! let back = buffer_to_object(&bytes).unwrap();
//! assert_eq!(back, *normalize(&sample));
//! ```
//!
//! The UTF-8 codec is in [`utf8`]; the traversal engine is in [`traverse`].

mod buffer;
mod config;
mod ingest;
mod marshal;
mod node;
mod normalize;
mod number;
mod platform;
mod text;
pub mod traverse;
mod typed_array;
pub mod utf8;

pub use buffer::{
    buffer_to_string8, extract_typed_array, get_string8_from_buffer, is_valid_string,
    merge_buffers, set_string8_in_buffer, string8_to_buffer, BoundsError,
};
pub use config::CodecConfig;
pub use ingest::ToNode;
pub use marshal::{buffer_to_object, object_to_buffer, MarshalError, Marshaller};
pub use node::{Mapping, Node, NodeId, Sequence};
pub use normalize::{
    count_typed_arrays, flatten_typed_arrays, has_circular_reference, normalize,
    remove_circular_references,
};
pub use number::Number;
pub use platform::{is_little_endian, Platform};
pub use text::{from_json, to_json, to_json_pretty, TextError};
pub use traverse::{Action, Context, Segment, Traversal, Visitor};
pub use typed_array::{Category, ElementType, TypedArray, TypedArrayInfo};
pub use utf8::Utf8Error;

#[cfg(feature = "derive")]
pub use codecutils_derive::ToNode;
