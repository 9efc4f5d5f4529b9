//! Per-connection handler: decode inbound frames, dispatch them to the
//! registry, and drain the connection's outbound queue.
//!
//! Each accepted connection gets its own Tokio task. The task owns the
//! socket; the registry reaches it only through the [`Peer`] queue, so
//! writes to one socket always happen in the order they were queued.

use tokio::sync::mpsc;
use wordduel_protocol::{ClientMessage, decode_client, encode_server};
use wordduel_room::{Outbound, Peer, RegistryHandle};
use wordduel_transport::{Connection, ConnectionId, WsConnection};
use wordduel_words::WordProvider;

use crate::WordDuelError;

/// Drop guard that reports the disconnect to the registry when the
/// handler exits, however it exits.
///
/// `Drop` is synchronous, so the notification runs as a spawned task.
struct ConnectionGuard<W: WordProvider> {
    conn_id: ConnectionId,
    registry: RegistryHandle<W>,
}

impl<W: WordProvider> Drop for ConnectionGuard<W> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let registry = self.registry.clone();
        tokio::spawn(async move {
            if let Ok(Some(room_id)) = registry.handle_disconnect(conn_id).await {
                tracing::debug!(%conn_id, %room_id, "room closed by disconnect");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<W: WordProvider>(
    conn: WsConnection,
    registry: RegistryHandle<W>,
) -> Result<(), WordDuelError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (tx, mut outbound) = mpsc::unbounded_channel();
    let peer = Peer::new(conn_id, tx);
    let _guard = ConnectionGuard {
        conn_id,
        registry: registry.clone(),
    };

    loop {
        tokio::select! {
            inbound = conn.next_frame() => match inbound {
                Ok(Some(data)) => dispatch(&registry, &peer, &data).await,
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            Some(out) = outbound.recv() => match out {
                Outbound::Message(msg) => {
                    let text = encode_server(&msg)?;
                    conn.send_text(&text).await?;
                }
                Outbound::Close => {
                    tracing::debug!(%conn_id, "closing connection");
                    let _ = conn.close().await;
                    break;
                }
            },
        }
    }

    // _guard drops here and the registry hears about the disconnect.
    Ok(())
}

/// Routes one inbound frame. Malformed frames are logged and dropped; the
/// connection stays open.
///
/// Every arm except `create-room` only enqueues a registry command, so this
/// returns without waiting on anything slower than the registry queue.
async fn dispatch<W: WordProvider>(registry: &RegistryHandle<W>, peer: &Peer, data: &[u8]) {
    let conn_id = peer.conn_id();
    let msg = match decode_client(data) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::warn!(%conn_id, error = %e, "dropping malformed message");
            return;
        }
    };
    tracing::trace!(%conn_id, kind = msg.type_name(), "inbound");

    let result = match msg {
        // The word fetch may take seconds; run it beside the connection loop
        // so relayed guesses and teardown keep flowing meanwhile. The outcome
        // reaches the client through its queue either way.
        ClientMessage::CreateRoom => {
            let registry = registry.clone();
            let host = peer.clone();
            tokio::spawn(async move {
                if let Err(e) = registry.create_room(host).await {
                    tracing::debug!(%conn_id, error = %e, "create-room rejected");
                }
            });
            Ok(())
        }
        ClientMessage::JoinRoom { room_id } => registry.join_room(room_id, peer.clone()).await,
        ClientMessage::SendGuess { room_id, guess } => {
            registry.relay_guess(room_id, peer.clone(), guess).await
        }
        ClientMessage::PlayerFinished { room_id } => {
            registry.mark_finished(room_id, peer.clone()).await
        }
    };

    // The client has already been answered; this is for the log only.
    if let Err(e) = result {
        tracing::debug!(%conn_id, error = %e, "request rejected");
    }
}
