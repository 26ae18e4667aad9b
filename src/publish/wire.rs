//! Wire format serialization.
//!
//! Every outbound frame is `[u32 BE length][payload]` where the payload
//! is one serialized [`SensorMessage`]. Two payload encodings are
//! supported:
//!
//! - **Postcard** (binary): compact and fast, the production default for
//!   image-heavy streams
//! - **JSON**: human-readable, for debugging and cross-language clients

use crate::error::{Error, Result};
use crate::publish::messages::SensorMessage;
use serde::{Deserialize, Serialize};

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Binary format using postcard
    #[default]
    Postcard,
    /// JSON format
    Json,
}

/// Serializer that can handle both formats
#[derive(Debug, Clone, Copy)]
pub struct Serializer {
    format: WireFormat,
}

impl Serializer {
    /// Create a serializer for the given format
    pub fn new(format: WireFormat) -> Self {
        Self { format }
    }

    /// Serialize a message to payload bytes
    pub fn serialize(&self, msg: &SensorMessage) -> Result<Vec<u8>> {
        match self.format {
            WireFormat::Postcard => {
                postcard::to_allocvec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::to_vec(msg).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    /// Deserialize payload bytes to a message
    pub fn deserialize(&self, bytes: &[u8]) -> Result<SensorMessage> {
        match self.format {
            WireFormat::Postcard => {
                postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            WireFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }
}
