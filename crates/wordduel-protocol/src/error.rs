//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound message failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The frame was not valid JSON, or its payload did not have the
    /// fields its `type` requires.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The frame parsed but named a `type` the relay does not handle.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}
