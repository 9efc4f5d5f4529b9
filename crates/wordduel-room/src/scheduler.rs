//! Lifecycle timers for rooms.
//!
//! A timer never touches room state. When its deadline passes it enqueues
//! a [`RegistryCommand::TimerFired`] on the registry's command channel, so
//! the teardown runs as one more serialized operation alongside client
//! messages. The registry decides whether the fire is still current.
//!
//! Timers hold only a weak sender: a pending 10-minute timer does not keep
//! the registry task alive after every handle is gone.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wordduel_protocol::RoomId;

use crate::registry::RegistryCommand;

/// Which deadline a timer enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Armed at creation; destroys a room that never reaches the
    /// both-finished state in time.
    IdleExpiry,
    /// Armed once both players finish; short grace before teardown.
    Cooldown,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdleExpiry => write!(f, "idle-expiry"),
            Self::Cooldown => write!(f, "cooldown"),
        }
    }
}

/// A scheduled, cancellable deadline for one room.
///
/// Dropping the timer cancels it. A room holds at most one, so replacing
/// the idle-expiry timer with a cooldown timer cancels the former.
#[derive(Debug)]
pub(crate) struct RoomTimer {
    kind: TimerKind,
    handle: JoinHandle<()>,
}

impl RoomTimer {
    /// Spawns a timer that reports back to the registry after `after`.
    ///
    /// `serial` identifies the room instance so a fire can never be applied
    /// to a different room that happens to reuse the same id.
    pub(crate) fn arm(
        kind: TimerKind,
        room_id: RoomId,
        serial: u64,
        after: Duration,
        commands: mpsc::WeakSender<RegistryCommand>,
    ) -> Self {
        tracing::debug!(%room_id, %kind, ?after, "timer armed");
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let Some(commands) = commands.upgrade() else {
                return;
            };
            let _ = commands
                .send(RegistryCommand::TimerFired {
                    room_id,
                    serial,
                    kind,
                })
                .await;
        });
        Self { kind, handle }
    }

    pub(crate) fn kind(&self) -> TimerKind {
        self.kind
    }
}

impl Drop for RoomTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
