//! Graph to byte buffer and back, through normalized JSON text.

use log::{debug, warn};

use crate::config::CodecConfig;
use crate::node::Node;
use crate::normalize::normalize;
use crate::text::{self, TextError};
use crate::utf8::{self, Utf8Error};

#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("malformed encoding: {0}")]
    Encoding(#[from] Utf8Error),
    #[error(transparent)]
    Text(#[from] TextError),
}

/// Converts graphs to UTF-8 JSON buffers and back.
#[derive(Debug, Clone, Default)]
pub struct Marshaller {
    config: CodecConfig,
}

impl Marshaller {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Normalizes `node`, renders it as JSON and encodes the text as UTF-8.
    ///
    /// The input graph is left untouched.
    pub fn object_to_buffer(&self, node: &Node) -> Result<Vec<u8>, MarshalError> {
        let normalized = normalize(node);
        let rendered = if self.config.pretty {
            text::to_json_pretty(&normalized)
        } else {
            text::to_json(&normalized)
        };
        let json = rendered.inspect_err(|e| warn!("cannot marshal object: {e}"))?;
        let bytes = utf8::encode(&json);
        debug!("marshaled object into {} byte(s)", bytes.len());
        Ok(bytes)
    }

    /// Decodes a UTF-8 JSON buffer into a fresh graph.
    pub fn buffer_to_object(&self, bytes: &[u8]) -> Result<Node, MarshalError> {
        let json = utf8::decode(bytes).inspect_err(|e| warn!("cannot unmarshal buffer: {e}"))?;
        let node = text::from_json(&json).inspect_err(|e| warn!("cannot unmarshal buffer: {e}"))?;
        Ok(node)
    }
}

/// [`Marshaller::object_to_buffer`] with the default configuration.
pub fn object_to_buffer(node: &Node) -> Result<Vec<u8>, MarshalError> {
    Marshaller::default().object_to_buffer(node)
}

/// [`Marshaller::buffer_to_object`] with the default configuration.
pub fn buffer_to_object(bytes: &[u8]) -> Result<Node, MarshalError> {
    Marshaller::default().buffer_to_object(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;

    #[test]
    fn roundtrip_plain_graph() {
        let node = Node::mapping([
            ("name", Node::from("I can has 🍔")),
            ("sizes", Node::sequence([Node::Number(Number::Int(3))])),
        ]);
        let bytes = object_to_buffer(&node).unwrap();
        assert_eq!(buffer_to_object(&bytes).unwrap(), node);
    }

    #[test]
    fn roundtrip_drops_cycles_and_typed_arrays() {
        let node = Node::mapping([("t", Node::typed_array(vec![1u8, 2]))]);
        node.insert("me", node.clone());
        let back = buffer_to_object(&object_to_buffer(&node).unwrap()).unwrap();
        assert_eq!(back, normalize(&node).into_owned());
        assert_eq!(back.get("me"), None);
    }

    #[test]
    fn roundtrip_strings_the_decoder_rejects_raw() {
        let node = Node::mapping([
            ("del", Node::from("a\u{7F}b")),
            ("replacement", Node::from("x\u{FFFD}")),
        ]);
        let bytes = object_to_buffer(&node).unwrap();
        assert!(!bytes.contains(&0x7F));
        assert_eq!(buffer_to_object(&bytes).unwrap(), node);
    }

    #[test]
    fn pretty_config_indents() {
        let marshaller = Marshaller::new(CodecConfig {
            pretty: true,
            ..CodecConfig::default()
        });
        let node = Node::mapping([("a", Node::Null)]);
        let bytes = marshaller.object_to_buffer(&node).unwrap();
        assert!(bytes.contains(&b'\n'));
        assert_eq!(marshaller.buffer_to_object(&bytes).unwrap(), node);
    }

    #[test]
    fn opaque_values_fail() {
        let node = Node::mapping([("f", Node::opaque("Function"))]);
        assert!(matches!(object_to_buffer(&node), Err(MarshalError::Text(_))));
    }

    #[test]
    fn bad_bytes_fail() {
        assert!(matches!(
            buffer_to_object(&[b'"', 0x7F, b'"']),
            Err(MarshalError::Encoding(Utf8Error::ControlByte { .. }))
        ));
        assert!(matches!(
            buffer_to_object(b"{\"a\":"),
            Err(MarshalError::Text(_))
        ));
    }
}
