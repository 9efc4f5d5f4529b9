//! `WordDuelServer` builder and accept loop.
//!
//! The server ties the layers together: the listener accepts sockets, each
//! socket gets a handler task, and every handler talks to the one room
//! registry through a cloned [`RegistryHandle`].

use wordduel_room::{RegistryHandle, RoomConfig, spawn_registry};
use std::time::Duration;

use wordduel_transport::{Incoming, Listener, WsListener};
use wordduel_words::WordProvider;

use crate::WordDuelError;
use crate::handler::handle_connection;

/// Builder for configuring and starting a Wordduel server.
///
/// # Example
///
/// ```rust,no_run
/// use wordduel::WordDuelServerBuilder;
/// use wordduel_words::StaticWordProvider;
///
/// # async fn demo() -> Result<(), wordduel::WordDuelError> {
/// let server = WordDuelServerBuilder::new()
///     .bind("0.0.0.0:3005")
///     .build(StaticWordProvider::new("crane"))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct WordDuelServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    handshake_timeout: Duration,
}

/// How long an accepted socket may take to finish its WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

impl WordDuelServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3005".to_string(),
            room_config: RoomConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets room deadlines and word length.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Caps the time an accepted socket may take to complete its upgrade.
    pub fn handshake_timeout(mut self, limit: Duration) -> Self {
        self.handshake_timeout = limit;
        self
    }

    /// Binds the listener and starts the room registry.
    pub async fn build<W: WordProvider>(
        self,
        words: W,
    ) -> Result<WordDuelServer<W>, WordDuelError> {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let registry = spawn_registry(self.room_config, words);
        Ok(WordDuelServer {
            listener,
            registry,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

impl Default for WordDuelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Wordduel server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct WordDuelServer<W: WordProvider> {
    listener: WsListener,
    registry: RegistryHandle<W>,
    handshake_timeout: Duration,
}

impl<W: WordProvider> WordDuelServer<W> {
    /// Creates a new builder.
    pub fn builder() -> WordDuelServerBuilder {
        WordDuelServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// A handle to the server's room registry.
    pub fn registry(&self) -> RegistryHandle<W> {
        self.registry.clone()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// The upgrade handshake runs in the connection's own task, so a socket
    /// that never completes it only costs that task, which gives up after
    /// the handshake timeout. Accept errors are logged and skipped.
    pub async fn run(mut self) -> Result<(), WordDuelError> {
        match self.local_addr() {
            Ok(addr) => tracing::info!(%addr, "wordduel server listening"),
            Err(_) => tracing::info!("wordduel server listening"),
        }

        loop {
            match self.listener.accept().await {
                Ok(incoming) => {
                    let registry = self.registry.clone();
                    let limit = self.handshake_timeout;
                    tokio::spawn(async move {
                        let peer = incoming.peer_addr();
                        let conn = match incoming.upgrade(limit).await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(%peer, error = %e, "upgrade failed");
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, registry).await {
                            tracing::debug!(%peer, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
