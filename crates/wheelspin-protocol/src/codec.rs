//! Codec trait and implementations for turning frames into text.
//!
//! Browsers speak JSON over WebSocket text messages, so a codec here maps
//! Rust values to and from `String` rather than raw bytes. The rest of the
//! stack only sees the [`Codec`] trait; [`JsonCodec`] is the one shipped.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to text frames and decode them back.
///
/// `Send + Sync + 'static` because one codec instance is shared by the
/// room actor and every connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes one text frame back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or doesn't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use wheelspin_protocol::{Codec, JsonCodec, ServerFrame};
///
/// let codec = JsonCodec;
/// let frame = ServerFrame::Error { message: "Game already started.".into() };
///
/// let text = codec.encode(&frame).unwrap();
/// assert_eq!(text, r#"{"type":"error","message":"Game already started."}"#);
///
/// let decoded: ServerFrame = codec.decode(&text).unwrap();
/// assert_eq!(decoded, frame);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        frame: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
