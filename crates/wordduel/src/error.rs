//! Unified error type for the Wordduel server.

use wordduel_protocol::ProtocolError;
use wordduel_room::RoomError;
use wordduel_transport::TransportError;
use wordduel_words::WordError;

/// Top-level error that wraps every layer's error.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors into this one.
#[derive(Debug, thiserror::Error)]
pub enum WordDuelError {
    /// Socket-level failure (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The word provider could not be constructed or failed.
    #[error(transparent)]
    Word(#[from] WordError),

    /// The room registry rejected a request or is gone.
    #[error(transparent)]
    Room(#[from] RoomError),
}
