//! Room configuration and lifecycle phases.

use std::time::Duration;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room in a registry.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// How long a room may live before the match reaches the
    /// both-finished state. Armed when the room is created.
    pub idle_expiry: Duration,

    /// Grace period between both players finishing and teardown.
    pub cooldown: Duration,

    /// Length of the secret word requested from the provider.
    pub word_length: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            idle_expiry: Duration::from_secs(10 * 60),
            cooldown: Duration::from_secs(30),
            word_length: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomPhase
// ---------------------------------------------------------------------------

/// Where a room is in its lifecycle.
///
/// The phase is derived from the room's fields, never stored, so it cannot
/// drift out of sync with them:
///
/// ```text
/// WaitingForGuest ──(join)──→ InProgress ──(both finished)──→ Cooldown
/// ```
///
/// Any phase can end in destruction (timer, disconnect). A destroyed room
/// has no phase because it is no longer in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Host is alone; the guest slot is open.
    WaitingForGuest,
    /// Both players are present and at least one is still playing.
    InProgress,
    /// Both players finished; the cooldown timer is running.
    Cooldown,
}

impl RoomPhase {
    /// Returns `true` if a guest may still join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForGuest)
    }
}

impl std::fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForGuest => write!(f, "waiting-for-guest"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Cooldown => write!(f, "cooldown"),
        }
    }
}
