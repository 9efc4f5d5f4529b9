//! Error types for the room layer.

use wordduel_protocol::RoomId;
use wordduel_transport::ConnectionId;
use wordduel_words::WordError;

/// Errors that can occur during room operations.
///
/// The requesting client has already been told (with `room-expired` or
/// `error`) by the time one of these reaches the caller; the error exists
/// for logging and tests.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already destroyed).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The guest slot is already taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The connection is already host or guest of a live room.
    #[error("{0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomId),

    /// The requesting connection went away before the request completed.
    #[error("{0} disconnected")]
    Disconnected(ConnectionId),

    /// No secret word could be obtained, so no room was created.
    #[error("no word available: {0}")]
    WordUnavailable(#[from] WordError),

    /// The registry task has stopped.
    #[error("room registry is unavailable")]
    Unavailable,
}
