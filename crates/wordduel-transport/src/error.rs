use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use crate::ConnectionId;

/// Socket-level failures.
///
/// Library errors from the WebSocket implementation are flattened to text so
/// this type does not depend on which backend is compiled in.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("could not listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("tcp accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The TCP connection arrived but the upgrade did not complete.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    #[error("handshake with {peer} did not finish within {limit:?}")]
    HandshakeTimeout { peer: SocketAddr, limit: Duration },

    #[error("write to {0} failed: {1}")]
    Write(ConnectionId, String),

    #[error("read from {0} failed: {1}")]
    Read(ConnectionId, String),
}
