//! Error types for the protocol layer.

/// Errors from encoding, decoding, or protocol-level validation.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed, truncated, or wrong shape.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Structurally valid but breaks a protocol rule, e.g. a game
    /// action before the handshake, or an unsupported version.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
