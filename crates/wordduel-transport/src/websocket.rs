//! `tokio-tungstenite` backed [`Listener`], [`Incoming`] and [`Connection`].

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Incoming, Listener, TransportError};

type Socket = WebSocketStream<TcpStream>;

/// Plain `ws://` listener.
pub struct WsListener {
    tcp: TcpListener,
}

impl WsListener {
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let tcp = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::debug!(addr, "websocket listener bound");
        Ok(Self { tcp })
    }
}

impl Listener for WsListener {
    type Incoming = WsIncoming;

    async fn accept(&mut self) -> Result<WsIncoming, TransportError> {
        let (tcp, peer) = self.tcp.accept().await.map_err(TransportError::Accept)?;
        tracing::trace!(%peer, "tcp accepted");
        Ok(WsIncoming { tcp, peer })
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.tcp.local_addr()
    }
}

/// A TCP socket waiting for its WebSocket upgrade request.
pub struct WsIncoming {
    tcp: TcpStream,
    peer: SocketAddr,
}

impl Incoming for WsIncoming {
    type Conn = WsConnection;

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn upgrade(self, limit: Duration) -> Result<WsConnection, TransportError> {
        let peer = self.peer;
        let socket = tokio::time::timeout(limit, tokio_tungstenite::accept_async(self.tcp))
            .await
            .map_err(|_| TransportError::HandshakeTimeout { peer, limit })?
            .map_err(|e| TransportError::Handshake {
                peer,
                reason: e.to_string(),
            })?;

        let id = ConnectionId::issue();
        tracing::debug!(%id, %peer, "websocket upgraded");
        Ok(WsConnection::new(id, peer, socket))
    }
}

/// One upgraded client socket.
///
/// The writer and reader halves sit behind separate locks, so a task parked
/// in `next_frame` never delays a relay write.
pub struct WsConnection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<SplitSink<Socket, Message>>,
    reader: Mutex<SplitStream<Socket>>,
}

impl WsConnection {
    fn new(id: ConnectionId, peer: SocketAddr, socket: Socket) -> Self {
        let (writer, reader) = socket.split();
        Self {
            id,
            peer,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        }
    }
}

impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::text(text.to_owned()))
            .await
            .map_err(|e| TransportError::Write(self.id, e.to_string()))
    }

    async fn next_frame(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut reader = self.reader.lock().await;
        while let Some(frame) = reader.next().await {
            match frame.map_err(|e| TransportError::Read(self.id, e.to_string()))? {
                Message::Text(text) => return Ok(Some(text.as_str().as_bytes().to_vec())),
                Message::Binary(data) => return Ok(Some(data.to_vec())),
                Message::Close(_) => return Ok(None),
                // Control frames; tungstenite answers pings on its own.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        let mut writer = self.writer.lock().await;
        writer
            .close()
            .await
            .map_err(|e| TransportError::Write(self.id, e.to_string()))
    }
}
