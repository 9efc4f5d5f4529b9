//! Core protocol types for Wordduel's wire format.
//!
//! These are the structures that get serialized to JSON, sent over the
//! socket, and read back by the browser client. Field names are camelCase
//! on the wire (`roomId`) because that is what the JavaScript side expects.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The short token that names a live room, e.g. `"a1b2c3"`.
///
/// `#[serde(transparent)]` keeps it a bare string on the wire rather than
/// `{ "0": "a1b2c3" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wraps a raw room token.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// A message a client sends to the relay.
///
/// Decoding goes through [`decode_client`](crate::decode_client) rather
/// than a derived `Deserialize`, so frames with extra top-level fields or a
/// missing `payload` on `create-room` are still accepted. The relay never
/// writes these, so there is no `Serialize` either.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// "Open a new room with me as host."
    CreateRoom,

    /// "Put me in this room as the guest."
    JoinRoom { room_id: RoomId },

    /// "Forward this guess to my opponent."
    ///
    /// The guess is opaque to the relay and forwarded verbatim.
    SendGuess {
        room_id: RoomId,
        guess: serde_json::Value,
    },

    /// "I am done (solved or out of tries)."
    PlayerFinished { room_id: RoomId },
}

impl ClientMessage {
    /// The wire `type` tag of this message, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::CreateRoom => "create-room",
            Self::JoinRoom { .. } => "join-room",
            Self::SendGuess { .. } => "send-guess",
            Self::PlayerFinished { .. } => "player-finished",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// A message the relay sends to a client.
///
/// `#[serde(tag = "type", content = "payload")]` produces adjacently tagged
/// JSON. Unit variants carry no `payload` key at all:
///
/// ```text
/// {"type":"room-created","payload":{"roomId":"a1b2c3","word":"CRANE"}}
/// {"type":"guest-joined"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Sent to the host once its room is registered.
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: RoomId, word: String },

    /// Sent to the guest once it has taken the guest slot.
    #[serde(rename_all = "camelCase")]
    RoomJoined { room_id: RoomId, word: String },

    /// Presence notice to the host. Carries no game data.
    GuestJoined,

    /// The opponent's guess, relayed as-is.
    Guess { guess: serde_json::Value },

    /// Both players are finished; the room will be torn down shortly.
    StartCooldown,

    /// The room is gone, or was never usable.
    RoomExpired,

    /// A request could not be served.
    Error { message: String },
}
