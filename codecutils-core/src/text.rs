//! JSON text representation of nodes.
//!
//! Only plain graphs can be rendered: null, booleans, finite numbers, strings,
//! sequences and mappings without cycles. Typed arrays must be flattened and
//! opaque values removed first (see [`crate::normalize`]).

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use std::cell::RefCell;
use std::fmt;
use std::io;

use crate::node::{Mapping, Node, NodeId, Sequence};
use crate::number::Number;

/// Error while rendering or parsing structured text.
#[derive(Debug, thiserror::Error)]
#[error("structured text error: {0}")]
pub struct TextError(#[from] serde_json::Error);

/// Renders a node as compact JSON.
///
/// DEL and U+FFFD inside strings are written as `\u` escapes, so the text
/// never holds a character the strict UTF-8 decoder rejects.
pub fn to_json(node: &Node) -> Result<String, TextError> {
    render(node, CompactFormatter)
}

/// Renders a node as indented JSON, escaping like [`to_json`].
pub fn to_json_pretty(node: &Node) -> Result<String, TextError> {
    render(node, PrettyFormatter::new())
}

fn render<F: Formatter>(node: &Node, formatter: F) -> Result<String, TextError> {
    let open = RefCell::new(Vec::new());
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, Escaping(formatter));
    Plain { node, open: &open }.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| TextError(ser::Error::custom(e)))
}

/// Formatter that also escapes the characters serde_json leaves raw but the
/// codec refuses to decode.
struct Escaping<F>(F);

fn needs_escape(c: char) -> bool {
    c == '\u{7F}' || c == '\u{FFFD}'
}

impl<F: Formatter> Formatter for Escaping<F> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices().filter(|&(_, c)| needs_escape(c)) {
            self.0.write_string_fragment(writer, &fragment[start..i])?;
            write!(writer, "\\u{:04x}", u32::from(c))?;
            start = i + c.len_utf8();
        }
        self.0.write_string_fragment(writer, &fragment[start..])
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.0.end_object_value(writer)
    }
}

/// Parses JSON text into a fresh graph.
///
/// Mapping keys keep their textual order; for duplicate keys the last value
/// wins.
pub fn from_json(text: &str) -> Result<Node, TextError> {
    Ok(serde_json::from_str(text)?)
}

/// Serialize adapter that refuses non-plain values and cycles.
struct Plain<'a> {
    node: &'a Node,
    open: &'a RefCell<Vec<NodeId>>,
}

impl Plain<'_> {
    fn child<'b>(&'b self, node: &'b Node) -> Plain<'b> {
        Plain {
            node,
            open: self.open,
        }
    }

    fn enter<E: ser::Error>(&self) -> Result<(), E> {
        let Some(id) = self.node.id() else {
            return Ok(());
        };
        let mut open = self.open.borrow_mut();
        if open.contains(&id) {
            return Err(E::custom("cannot render a circular structure"));
        }
        open.push(id);
        Ok(())
    }

    fn leave(&self) {
        self.open.borrow_mut().pop();
    }

    fn serialize_sequence<S: Serializer>(
        &self,
        items: &Sequence,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&self.child(item))?;
        }
        seq.end()
    }

    fn serialize_mapping<S: Serializer>(
        &self,
        entries: &Mapping,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, &self.child(value))?;
        }
        map.end()
    }
}

impl Serialize for Plain<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.node {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Number(n) => n.serialize(serializer),
            Node::String(s) => serializer.serialize_str(s),
            Node::Sequence(items) => {
                self.enter::<S::Error>()?;
                let result = self.serialize_sequence(&items.borrow(), serializer);
                self.leave();
                result
            }
            Node::Mapping(entries) => {
                self.enter::<S::Error>()?;
                let result = self.serialize_mapping(&entries.borrow(), serializer);
                self.leave();
                result
            }
            Node::TypedArray(array) => Err(ser::Error::custom(format!(
                "{} must be flattened before rendering",
                array.element_type().name()
            ))),
            Node::Opaque(name) => Err(ser::Error::custom(format!(
                "value of type {name} has no plain representation"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = Node;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a plain value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Node, E> {
                Ok(Node::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Node, E> {
                Ok(Node::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Node, D::Error> {
                Node::deserialize(deserializer)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Node, E> {
                Ok(Node::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Node, E> {
                Ok(Node::Number(Number::Int(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Node, E> {
                Ok(Node::Number(Number::from_u64(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Node, E> {
                Ok(Node::Number(Number::Float(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Node, E> {
                Ok(Node::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Node, E> {
                Ok(Node::String(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Node, A::Error> {
                let mut items = Sequence::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(item) = access.next_element()? {
                    items.push(item);
                }
                Ok(Node::from_sequence(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Node, A::Error> {
                let mut entries = Mapping::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, Node>()? {
                    entries.insert(key, value);
                }
                Ok(Node::from_mapping(entries))
            }
        }

        deserializer.deserialize_any(NodeVisitor)
    }
}
