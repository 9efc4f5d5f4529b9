//! Room lifecycle management for Wordduel.
//!
//! One registry task owns every live room. Connection handlers talk to it
//! through a [`RegistryHandle`]; room timers report back through the same
//! command queue, so all room mutation is serialized.
//!
//! # Key types
//!
//! - [`RegistryHandle`]: create, join, relay, finish, destroy, disconnect
//! - [`Peer`] / [`Outbound`]: how the registry reaches a connection
//! - [`Role`]: host or guest
//! - [`RoomPhase`]: waiting, in progress, cooldown
//! - [`RoomConfig`]: deadlines and word length

mod config;
mod error;
mod registry;
mod room;
mod scheduler;

pub use config::{RoomConfig, RoomPhase};
pub use error::RoomError;
pub use registry::{
    ALREADY_IN_ROOM_MESSAGE, DestroyReason, RegistryHandle, RoomInfo, WORD_UNAVAILABLE_MESSAGE,
    spawn_registry,
};
pub use room::{Outbound, Peer, PeerSender, Role};
pub use scheduler::TimerKind;
