//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or validating
/// protocol data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into a frame).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or a shape
    /// that doesn't match the expected type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The data decoded fine but breaks a rule of the session model,
    /// e.g. a stored state whose winner is not a participant.
    #[error("invalid session state: {0}")]
    InvalidState(String),
}
