//! Wire protocol for Wordduel.
//!
//! Every frame in either direction is a JSON object with a `type` string and
//! an optional `payload` object:
//!
//! ```text
//! {"type": "send-guess", "payload": {"roomId": "a1b2c3", "guess": "STONE"}}
//! ```
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomId`]): what
//!   travels on the wire.
//! - **Codec** ([`decode_client`], [`encode_server`]): bytes in, text out.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! The protocol layer knows nothing about connections or rooms.

mod codec;
mod error;
mod types;

pub use codec::{decode_client, encode_server};
pub use error::ProtocolError;
pub use types::{ClientMessage, RoomId, ServerMessage};
