use serde::{Deserialize, Serialize};

use crate::text::TextError;

/// Tunables shared by the marshaling and validation entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Number of positions drawn when sampling a string for validity.
    pub sample_size: usize,
    /// Check every character instead of sampling.
    pub exhaustive: bool,
    /// Indent the JSON produced by marshaling.
    pub pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sample_size: 1000,
            exhaustive: false,
            pretty: false,
        }
    }
}

impl CodecConfig {
    pub fn from_json(text: &str) -> Result<Self, TextError> {
        Ok(serde_json::from_str(text)?)
    }
}
