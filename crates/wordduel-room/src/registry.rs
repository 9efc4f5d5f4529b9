//! Room registry: the single owner of every live room.
//!
//! The registry runs as one Tokio task (actor model) that owns the
//! `RoomId → Room` map and the `ConnectionId → seat` index. Everything that
//! mutates a room, whether a client message or a timer firing, arrives as a
//! [`RegistryCommand`] on one channel and is applied in order. Two
//! near-simultaneous joins for the same room therefore cannot both win, and
//! a timer can never race a disconnect.
//!
//! Callers use a cheap, clonable [`RegistryHandle`].

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use wordduel_protocol::{RoomId, ServerMessage};
use wordduel_transport::ConnectionId;
use wordduel_words::WordProvider;

use crate::room::{Peer, Role, Room};
use crate::scheduler::{RoomTimer, TimerKind};
use crate::{RoomConfig, RoomError, RoomPhase};

/// Command channel capacity. One registry serves every connection.
const COMMAND_BUFFER: usize = 1024;

/// Message sent to the requester when the word provider fails.
pub const WORD_UNAVAILABLE_MESSAGE: &str = "Could not generate word.";

/// Message sent when a connection that already has a room asks for another.
pub const ALREADY_IN_ROOM_MESSAGE: &str = "Already in a room.";

/// Why a room was torn down. Logged on destruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyReason {
    /// The idle-expiry deadline passed before both players finished.
    IdleExpired,
    /// The post-match cooldown elapsed.
    CooldownElapsed,
    /// A participant's connection went away.
    Disconnect,
    /// Explicit request through [`RegistryHandle::destroy_room`].
    Requested,
}

impl From<TimerKind> for DestroyReason {
    fn from(kind: TimerKind) -> Self {
        match kind {
            TimerKind::IdleExpiry => Self::IdleExpired,
            TimerKind::Cooldown => Self::CooldownElapsed,
        }
    }
}

/// A snapshot of room metadata, for inspection and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub phase: RoomPhase,
    pub word: String,
    pub has_guest: bool,
    pub host_finished: bool,
    pub guest_finished: bool,
    /// The deadline currently armed.
    pub timer: Option<TimerKind>,
}

/// Where a connection sits. Resolved once when it takes a seat.
#[derive(Debug, Clone)]
struct Seat {
    room_id: RoomId,
    role: Role,
}

/// Operations the outside world (and the room timers) can request.
pub(crate) enum RegistryCommand {
    Create {
        host: Peer,
        word: String,
        reply: oneshot::Sender<Result<RoomId, RoomError>>,
    },
    Join {
        room_id: RoomId,
        guest: Peer,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Guess {
        room_id: RoomId,
        from: Peer,
        guess: serde_json::Value,
    },
    Finished {
        room_id: RoomId,
        from: Peer,
    },
    Destroy {
        room_id: RoomId,
        reason: DestroyReason,
        reply: oneshot::Sender<bool>,
    },
    Disconnect {
        conn_id: ConnectionId,
        reply: oneshot::Sender<Option<RoomId>>,
    },
    TimerFired {
        room_id: RoomId,
        serial: u64,
        kind: TimerKind,
    },
    Info {
        room_id: RoomId,
        reply: oneshot::Sender<Option<RoomInfo>>,
    },
    SeatOf {
        conn_id: ConnectionId,
        reply: oneshot::Sender<Option<RoomId>>,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to the running registry. Cheap to clone; one per connection task.
///
/// The handle also owns the word provider: fetching a word is the only
/// operation that awaits network I/O, and it happens here in the caller's
/// task, before any room exists, so the registry itself never blocks on it.
pub struct RegistryHandle<W: WordProvider> {
    commands: mpsc::Sender<RegistryCommand>,
    words: Arc<W>,
    word_length: usize,
}

impl<W: WordProvider> Clone for RegistryHandle<W> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            words: Arc::clone(&self.words),
            word_length: self.word_length,
        }
    }
}

impl<W: WordProvider> RegistryHandle<W> {
    /// Creates a room hosted by `host`.
    ///
    /// On success the host has been sent `room-created` and the idle-expiry
    /// timer is running. On word-provider failure the host gets an `error`
    /// message and nothing is registered.
    ///
    /// A connection that already holds a seat is turned away before the
    /// word provider is called.
    pub async fn create_room(&self, host: Peer) -> Result<RoomId, RoomError> {
        if let Some(room_id) = self.seat_of(host.conn_id()).await? {
            tracing::debug!(conn_id = %host.conn_id(), %room_id, "create from bound connection rejected");
            host.send(ServerMessage::Error {
                message: ALREADY_IN_ROOM_MESSAGE.to_string(),
            });
            return Err(RoomError::AlreadyInRoom(host.conn_id(), room_id));
        }

        let word = match self.words.fetch_word(self.word_length).await {
            Ok(word) => word,
            Err(e) => {
                tracing::warn!(conn_id = %host.conn_id(), error = %e, "word provider failed");
                host.send(ServerMessage::Error {
                    message: WORD_UNAVAILABLE_MESSAGE.to_string(),
                });
                return Err(RoomError::WordUnavailable(e));
            }
        };

        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::Create { host, word, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Seats `guest` in `room_id`.
    ///
    /// Unknown or full rooms answer the guest with `room-expired`.
    pub async fn join_room(&self, room_id: RoomId, guest: Peer) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::Join { room_id, guest, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Forwards a guess to the sender's opponent (fire-and-forget).
    pub async fn relay_guess(
        &self,
        room_id: RoomId,
        from: Peer,
        guess: serde_json::Value,
    ) -> Result<(), RoomError> {
        self.send(RegistryCommand::Guess { room_id, from, guess }).await
    }

    /// Records that the sender has finished (fire-and-forget).
    pub async fn mark_finished(&self, room_id: RoomId, from: Peer) -> Result<(), RoomError> {
        self.send(RegistryCommand::Finished { room_id, from }).await
    }

    /// Tears a room down. Returns `false` if it was already gone.
    pub async fn destroy_room(
        &self,
        room_id: RoomId,
        reason: DestroyReason,
    ) -> Result<bool, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::Destroy { room_id, reason, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Tears down whichever room `conn_id` is seated in, if any.
    pub async fn handle_disconnect(
        &self,
        conn_id: ConnectionId,
    ) -> Result<Option<RoomId>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::Disconnect { conn_id, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Returns a snapshot of a live room.
    pub async fn room_info(&self, room_id: RoomId) -> Result<Option<RoomInfo>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::Info { room_id, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// The room `conn_id` is seated in, if any.
    pub async fn seat_of(&self, conn_id: ConnectionId) -> Result<Option<RoomId>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::SeatOf { conn_id, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> Result<usize, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RegistryCommand::Count { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable)
    }

    async fn send(&self, cmd: RegistryCommand) -> Result<(), RoomError> {
        self.commands.send(cmd).await.map_err(|_| RoomError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The registry's private state. Lives inside the spawned task.
struct RoomRegistry {
    config: RoomConfig,
    rooms: HashMap<RoomId, Room>,
    /// Which room and seat each bound connection holds. A connection is
    /// bound to at most one room.
    seats: HashMap<ConnectionId, Seat>,
    next_serial: u64,
    /// Handed to timers so their fires come back through the same queue.
    timer_commands: mpsc::WeakSender<RegistryCommand>,
    receiver: mpsc::Receiver<RegistryCommand>,
}

impl RoomRegistry {
    /// Processes commands until every handle is dropped.
    async fn run(mut self) {
        tracing::info!("room registry started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RegistryCommand::Create { host, word, reply } => {
                    let _ = reply.send(self.create(host, word));
                }
                RegistryCommand::Join { room_id, guest, reply } => {
                    let _ = reply.send(self.join(room_id, guest));
                }
                RegistryCommand::Guess { room_id, from, guess } => {
                    self.relay_guess(room_id, from, guess);
                }
                RegistryCommand::Finished { room_id, from } => {
                    self.mark_finished(room_id, from);
                }
                RegistryCommand::Destroy { room_id, reason, reply } => {
                    let _ = reply.send(self.destroy(&room_id, reason));
                }
                RegistryCommand::Disconnect { conn_id, reply } => {
                    let _ = reply.send(self.disconnect(conn_id));
                }
                RegistryCommand::TimerFired { room_id, serial, kind } => {
                    self.timer_fired(room_id, serial, kind);
                }
                RegistryCommand::Info { room_id, reply } => {
                    let _ = reply.send(self.info(&room_id));
                }
                RegistryCommand::SeatOf { conn_id, reply } => {
                    let _ = reply.send(self.seats.get(&conn_id).map(|seat| seat.room_id.clone()));
                }
                RegistryCommand::Count { reply } => {
                    let _ = reply.send(self.rooms.len());
                }
            }
        }

        // Dropping the rooms cancels their timers.
        tracing::info!(rooms = self.rooms.len(), "room registry stopped");
    }

    fn create(&mut self, host: Peer, word: String) -> Result<RoomId, RoomError> {
        let conn_id = host.conn_id();
        if let Some(seat) = self.seats.get(&conn_id) {
            tracing::debug!(%conn_id, room_id = %seat.room_id, "create from bound connection rejected");
            host.send(ServerMessage::Error {
                message: ALREADY_IN_ROOM_MESSAGE.to_string(),
            });
            return Err(RoomError::AlreadyInRoom(conn_id, seat.room_id.clone()));
        }
        // The word fetch can outlast the connection that asked for it.
        if host.is_closed() {
            tracing::debug!(%conn_id, "host left before the room was ready");
            return Err(RoomError::Disconnected(conn_id));
        }

        let room_id = self.fresh_room_id();
        let serial = self.next_serial;
        self.next_serial += 1;

        let mut room = Room::new(room_id.clone(), serial, word.clone(), host.clone());
        room.arm(RoomTimer::arm(
            TimerKind::IdleExpiry,
            room_id.clone(),
            serial,
            self.config.idle_expiry,
            self.timer_commands.clone(),
        ));

        self.rooms.insert(room_id.clone(), room);
        self.seats.insert(
            conn_id,
            Seat {
                room_id: room_id.clone(),
                role: Role::Host,
            },
        );

        host.send(ServerMessage::RoomCreated {
            room_id: room_id.clone(),
            word,
        });
        tracing::info!(%room_id, %conn_id, "room created");
        Ok(room_id)
    }

    fn join(&mut self, room_id: RoomId, guest: Peer) -> Result<(), RoomError> {
        let conn_id = guest.conn_id();
        if let Some(seat) = self.seats.get(&conn_id) {
            tracing::debug!(%conn_id, bound = %seat.room_id, %room_id, "join from bound connection rejected");
            guest.send(ServerMessage::RoomExpired);
            return Err(RoomError::AlreadyInRoom(conn_id, seat.room_id.clone()));
        }

        let Some(room) = self.rooms.get_mut(&room_id) else {
            tracing::debug!(%room_id, %conn_id, "join for unknown room");
            guest.send(ServerMessage::RoomExpired);
            return Err(RoomError::NotFound(room_id));
        };

        if !room.phase().is_joinable() {
            tracing::debug!(%room_id, %conn_id, phase = %room.phase(), "join for room that is not joinable");
            guest.send(ServerMessage::RoomExpired);
            return Err(RoomError::RoomFull(room_id));
        }
        room.attach_guest(guest.clone())?;

        self.seats.insert(
            conn_id,
            Seat {
                room_id: room_id.clone(),
                role: Role::Guest,
            },
        );

        guest.send(ServerMessage::RoomJoined {
            room_id: room_id.clone(),
            word: room.word().to_string(),
        });
        if let Some(host) = room.peer(Role::Host) {
            host.send(ServerMessage::GuestJoined);
        }
        tracing::info!(%room_id, %conn_id, "guest joined");
        Ok(())
    }

    fn relay_guess(&self, room_id: RoomId, from: Peer, guess: serde_json::Value) {
        let Some((room, role)) = self.resolve(&room_id, &from) else {
            return;
        };
        match room.peer(role.opponent()) {
            Some(opponent) => opponent.send(ServerMessage::Guess { guess }),
            None => tracing::trace!(%room_id, "guess with no opponent seated"),
        }
    }

    fn mark_finished(&mut self, room_id: RoomId, from: Peer) {
        let Some((_, role)) = self.resolve(&room_id, &from) else {
            return;
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return;
        };

        tracing::info!(%room_id, %role, "player finished");
        if !room.mark_finished(role) {
            return;
        }

        room.broadcast(ServerMessage::StartCooldown);
        let serial = room.serial();
        room.arm(RoomTimer::arm(
            TimerKind::Cooldown,
            room_id.clone(),
            serial,
            self.config.cooldown,
            self.timer_commands.clone(),
        ));
        tracing::info!(%room_id, cooldown = ?self.config.cooldown, "both finished, cooldown started");
    }

    /// Finds the room and the sender's seat in it.
    ///
    /// A reference to a room that no longer exists is answered with
    /// `room-expired`. A sender that is not seated in an existing room is
    /// logged and ignored.
    fn resolve(&self, room_id: &RoomId, from: &Peer) -> Option<(&Room, Role)> {
        let Some(room) = self.rooms.get(room_id) else {
            tracing::debug!(%room_id, conn_id = %from.conn_id(), "stale room reference");
            from.send(ServerMessage::RoomExpired);
            return None;
        };
        match self.seats.get(&from.conn_id()) {
            Some(seat) if &seat.room_id == room_id => Some((room, seat.role)),
            _ => {
                tracing::warn!(%room_id, conn_id = %from.conn_id(), "message from non-participant, ignoring");
                None
            }
        }
    }

    /// Removes and tears down a room. Idempotent.
    fn destroy(&mut self, room_id: &RoomId, reason: DestroyReason) -> bool {
        let Some(room) = self.rooms.remove(room_id) else {
            return false;
        };
        for conn_id in room.connections() {
            self.seats.remove(&conn_id);
        }
        room.teardown();
        tracing::info!(%room_id, ?reason, "room destroyed");
        true
    }

    fn disconnect(&mut self, conn_id: ConnectionId) -> Option<RoomId> {
        let room_id = self.seats.get(&conn_id)?.room_id.clone();
        self.destroy(&room_id, DestroyReason::Disconnect);
        Some(room_id)
    }

    fn timer_fired(&mut self, room_id: RoomId, serial: u64, kind: TimerKind) {
        let current = self
            .rooms
            .get(&room_id)
            .is_some_and(|room| room.serial() == serial && room.armed() == Some(kind));
        if !current {
            tracing::trace!(%room_id, %kind, "stale timer fire ignored");
            return;
        }
        self.destroy(&room_id, kind.into());
    }

    fn info(&self, room_id: &RoomId) -> Option<RoomInfo> {
        let room = self.rooms.get(room_id)?;
        Some(RoomInfo {
            room_id: room.id().clone(),
            phase: room.phase(),
            word: room.word().to_string(),
            has_guest: room.has_guest(),
            host_finished: room.is_finished(Role::Host),
            guest_finished: room.is_finished(Role::Guest),
            timer: room.armed(),
        })
    }

    /// Draws random ids until one is not in use.
    fn fresh_room_id(&self) -> RoomId {
        loop {
            let id = generate_room_id();
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Six lowercase hex characters (24 bits of randomness), e.g. `"a1b2c3"`.
fn generate_room_id() -> RoomId {
    let bytes: [u8; 3] = rand::rng().random();
    RoomId::new(bytes.iter().map(|b| format!("{b:02x}")).collect::<String>())
}

/// Spawns the registry task and returns a handle to it.
///
/// The task stops once every handle has been dropped.
pub fn spawn_registry<W: WordProvider>(config: RoomConfig, words: W) -> RegistryHandle<W> {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let word_length = config.word_length;

    let registry = RoomRegistry {
        config,
        rooms: HashMap::new(),
        seats: HashMap::new(),
        next_serial: 1,
        timer_commands: tx.downgrade(),
        receiver: rx,
    };
    tokio::spawn(registry.run());

    RegistryHandle {
        commands: tx,
        words: Arc::new(words),
        word_length,
    }
}
