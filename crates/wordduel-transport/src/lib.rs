//! Socket layer for Wordduel.
//!
//! The relay sees only a [`Listener`] that hands out [`Incoming`] sockets,
//! which upgrade into [`Connection`]s, each carrying a [`ConnectionId`]. Room code compares connections by that id
//! and never holds a socket.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WsListener`], [`WsIncoming`] and [`WsConnection`] over
//!   `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WsConnection, WsIncoming, WsListener};

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static ISSUED: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one client channel. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw value. Listeners use [`ConnectionId::issue`] instead.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Hands out the next unused id.
    pub fn issue() -> Self {
        Self(ISSUED.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new client connections.
///
/// Accepting and upgrading are separate steps: [`accept`](Listener::accept)
/// returns as soon as a socket arrives, and the handshake runs later in
/// whatever task calls [`Incoming::upgrade`]. A client that never finishes
/// its handshake therefore never holds up the accept loop.
pub trait Listener: Send + 'static {
    type Incoming: Incoming;

    /// Waits for the next raw client socket.
    async fn accept(&mut self) -> Result<Self::Incoming, TransportError>;

    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// An accepted socket that has not completed its upgrade handshake.
pub trait Incoming: Send + 'static {
    type Conn: Connection;

    fn peer_addr(&self) -> SocketAddr;

    /// Completes the handshake, giving up after `limit`.
    async fn upgrade(self, limit: Duration) -> Result<Self::Conn, TransportError>;
}

/// One client channel.
///
/// Reading and writing are independent: a task waiting in
/// [`next_frame`](Connection::next_frame) must not block
/// [`send_text`](Connection::send_text) from another.
pub trait Connection: Send + Sync + 'static {
    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;

    /// Writes one text frame.
    async fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// The next data frame, text or binary, as raw bytes.
    ///
    /// `Ok(None)` once the peer has closed.
    async fn next_frame(&self) -> Result<Option<Vec<u8>>, TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}
