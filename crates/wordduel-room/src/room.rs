//! The state of one match: two seats, one secret word, one live timer.
//!
//! A [`Room`] is plain data owned by the registry task. It never locks and
//! never awaits; every method runs inside one serialized registry command.

use tokio::sync::mpsc;
use wordduel_protocol::{RoomId, ServerMessage};
use wordduel_transport::ConnectionId;

use crate::scheduler::{RoomTimer, TimerKind};
use crate::{RoomError, RoomPhase};

/// Something the registry wants a connection task to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Write this message to the client.
    Message(ServerMessage),
    /// Close the connection.
    Close,
}

/// Queue feeding one connection's writer. Unbounded so the registry never
/// waits on a slow client; order of pushes is order of delivery.
pub type PeerSender = mpsc::UnboundedSender<Outbound>;

/// A participant's connection as seen by the room layer: its identity plus
/// the queue that reaches it.
#[derive(Debug, Clone)]
pub struct Peer {
    conn_id: ConnectionId,
    sender: PeerSender,
}

impl Peer {
    /// Pairs a connection identity with its outbound queue.
    pub fn new(conn_id: ConnectionId, sender: PeerSender) -> Self {
        Self { conn_id, sender }
    }

    /// The connection this peer refers to.
    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Queues a message. Best-effort: a connection that is already gone is
    /// ignored, since its own disconnect path does the cleanup.
    pub fn send(&self, msg: ServerMessage) {
        let _ = self.sender.send(Outbound::Message(msg));
    }

    /// `true` once the connection task has stopped reading its queue.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Asks the connection task to close the socket. Best-effort.
    pub fn close(&self) {
        let _ = self.sender.send(Outbound::Close);
    }
}

/// The two fixed seats in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// The other seat.
    pub fn opponent(self) -> Self {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

/// One match between a host and (eventually) a guest.
#[derive(Debug)]
pub(crate) struct Room {
    id: RoomId,
    /// Distinguishes this room from any later room reusing `id`.
    serial: u64,
    word: String,
    host: Peer,
    guest: Option<Peer>,
    host_finished: bool,
    guest_finished: bool,
    timer: Option<RoomTimer>,
}

impl Room {
    pub(crate) fn new(id: RoomId, serial: u64, word: String, host: Peer) -> Self {
        Self {
            id,
            serial,
            word,
            host,
            guest: None,
            host_finished: false,
            guest_finished: false,
            timer: None,
        }
    }

    pub(crate) fn id(&self) -> &RoomId {
        &self.id
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub(crate) fn word(&self) -> &str {
        &self.word
    }

    pub(crate) fn peer(&self, role: Role) -> Option<&Peer> {
        match role {
            Role::Host => Some(&self.host),
            Role::Guest => self.guest.as_ref(),
        }
    }

    pub(crate) fn has_guest(&self) -> bool {
        self.guest.is_some()
    }

    pub(crate) fn is_finished(&self, role: Role) -> bool {
        match role {
            Role::Host => self.host_finished,
            Role::Guest => self.guest_finished,
        }
    }

    pub(crate) fn phase(&self) -> RoomPhase {
        if self.guest.is_none() {
            RoomPhase::WaitingForGuest
        } else if self.host_finished && self.guest_finished {
            RoomPhase::Cooldown
        } else {
            RoomPhase::InProgress
        }
    }

    /// Takes the guest seat. First joiner wins.
    pub(crate) fn attach_guest(&mut self, guest: Peer) -> Result<(), RoomError> {
        if self.guest.is_some() {
            return Err(RoomError::RoomFull(self.id.clone()));
        }
        self.guest = Some(guest);
        Ok(())
    }

    /// Records that `role` is done. Returns `true` only on the call that
    /// makes both roles finished, so the cooldown starts exactly once.
    pub(crate) fn mark_finished(&mut self, role: Role) -> bool {
        let was_complete = self.host_finished && self.guest_finished;
        match role {
            Role::Host => self.host_finished = true,
            Role::Guest => self.guest_finished = true,
        }
        !was_complete && self.host_finished && self.guest_finished
    }

    /// Installs `timer` as the room's only live deadline, cancelling any
    /// previous one.
    pub(crate) fn arm(&mut self, timer: RoomTimer) {
        self.timer = Some(timer);
    }

    pub(crate) fn armed(&self) -> Option<TimerKind> {
        self.timer.as_ref().map(RoomTimer::kind)
    }

    /// Sends `msg` to every seated participant.
    pub(crate) fn broadcast(&self, msg: ServerMessage) {
        if let Some(guest) = &self.guest {
            guest.send(msg.clone());
        }
        self.host.send(msg);
    }

    /// Connections currently seated, host first.
    pub(crate) fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        std::iter::once(self.host.conn_id).chain(self.guest.as_ref().map(Peer::conn_id))
    }

    /// Final teardown: tell both clients, close both connections, and
    /// cancel the pending timer by dropping it.
    pub(crate) fn teardown(self) {
        self.broadcast(ServerMessage::RoomExpired);
        self.host.close();
        if let Some(guest) = &self.guest {
            guest.close();
        }
    }
}
