//! Integration tests for the room registry using channel-backed peers.
//!
//! Timing tests run with `start_paused = true`: the Tokio clock only moves
//! when every task is idle, so 10-minute deadlines resolve instantly and
//! deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use wordduel_protocol::{RoomId, ServerMessage};
use wordduel_room::{
    ALREADY_IN_ROOM_MESSAGE, DestroyReason, Outbound, Peer, RegistryHandle, RoomConfig,
    RoomError, RoomPhase, TimerKind, WORD_UNAVAILABLE_MESSAGE, spawn_registry,
};
use wordduel_transport::ConnectionId;
use wordduel_words::{StaticWordProvider, WordError, WordProvider};

// =========================================================================
// Helpers
// =========================================================================

/// A provider whose upstream is always down.
struct DownProvider;

impl WordProvider for DownProvider {
    async fn fetch_word(&self, _length: usize) -> Result<String, WordError> {
        Err(WordError::Status(503))
    }
}

/// Counts how often the word API is called.
#[derive(Clone, Default)]
struct CountingProvider {
    calls: Arc<AtomicUsize>,
}

impl WordProvider for CountingProvider {
    async fn fetch_word(&self, _length: usize) -> Result<String, WordError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("CRANE".into())
    }
}

type Inbox = mpsc::UnboundedReceiver<Outbound>;

fn registry() -> RegistryHandle<StaticWordProvider> {
    spawn_registry(RoomConfig::default(), StaticWordProvider::new("crane"))
}

fn client(id: u64) -> (Peer, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Peer::new(ConnectionId::new(id), tx), rx)
}

/// Everything queued for a client so far.
fn drain(rx: &mut Inbox) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

fn msg(m: ServerMessage) -> Outbound {
    Outbound::Message(m)
}

/// Waits until every command sent before this call has been applied.
async fn settle<W: WordProvider>(registry: &RegistryHandle<W>) {
    registry.room_count().await.unwrap();
}

/// Creates a room hosted by client 1 and seats client 2 as guest, with
/// both inboxes drained.
async fn full_room(
    registry: &RegistryHandle<StaticWordProvider>,
) -> (RoomId, (Peer, Inbox), (Peer, Inbox)) {
    let (host, mut host_rx) = client(1);
    let (guest, mut guest_rx) = client(2);
    let room_id = registry.create_room(host.clone()).await.unwrap();
    registry.join_room(room_id.clone(), guest.clone()).await.unwrap();
    drain(&mut host_rx);
    drain(&mut guest_rx);
    (room_id, (host, host_rx), (guest, guest_rx))
}

// =========================================================================
// create_room
// =========================================================================

#[tokio::test]
async fn test_create_room_sends_id_and_word_to_host() {
    let registry = registry();
    let (host, mut host_rx) = client(1);

    let room_id = registry.create_room(host).await.unwrap();

    assert_eq!(
        drain(&mut host_rx),
        vec![msg(ServerMessage::RoomCreated {
            room_id: room_id.clone(),
            word: "CRANE".into(),
        })]
    );
    assert_eq!(registry.room_count().await.unwrap(), 1);

    let info = registry.room_info(room_id).await.unwrap().unwrap();
    assert_eq!(info.phase, RoomPhase::WaitingForGuest);
    assert_eq!(info.timer, Some(TimerKind::IdleExpiry));
    assert!(!info.has_guest);
}

#[tokio::test]
async fn test_create_room_ids_are_unique() {
    let registry = registry();
    let mut ids = std::collections::HashSet::new();
    for i in 0..50 {
        let (host, _rx) = client(i);
        ids.insert(registry.create_room(host).await.unwrap());
    }
    assert_eq!(ids.len(), 50);
    assert_eq!(registry.room_count().await.unwrap(), 50);
}

#[tokio::test]
async fn test_create_room_word_provider_failure() {
    let registry = spawn_registry(RoomConfig::default(), DownProvider);
    let (host, mut host_rx) = client(1);

    let err = registry.create_room(host).await.unwrap_err();

    assert!(matches!(err, RoomError::WordUnavailable(_)));
    assert_eq!(
        drain(&mut host_rx),
        vec![msg(ServerMessage::Error {
            message: WORD_UNAVAILABLE_MESSAGE.into(),
        })]
    );
    assert_eq!(registry.room_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_create_room_twice_from_same_connection_is_rejected() {
    let registry = registry();
    let (host, mut host_rx) = client(1);

    let first = registry.create_room(host.clone()).await.unwrap();
    drain(&mut host_rx);
    let err = registry.create_room(host).await.unwrap_err();

    assert!(matches!(err, RoomError::AlreadyInRoom(_, ref id) if *id == first));
    assert_eq!(
        drain(&mut host_rx),
        vec![msg(ServerMessage::Error {
            message: ALREADY_IN_ROOM_MESSAGE.into(),
        })]
    );
    assert_eq!(registry.room_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_create_from_seated_guest_skips_word_api() {
    let words = CountingProvider::default();
    let registry = spawn_registry(RoomConfig::default(), words.clone());
    let (host, mut host_rx) = client(1);
    let (guest, mut guest_rx) = client(2);
    let room_id = registry.create_room(host.clone()).await.unwrap();
    registry.join_room(room_id.clone(), guest.clone()).await.unwrap();
    drain(&mut host_rx);
    drain(&mut guest_rx);
    assert_eq!(words.calls.load(Ordering::SeqCst), 1);

    let err = registry.create_room(guest.clone()).await.unwrap_err();

    assert!(matches!(err, RoomError::AlreadyInRoom(_, ref id) if *id == room_id));
    assert_eq!(words.calls.load(Ordering::SeqCst), 1, "word API must not be called");
    assert_eq!(
        drain(&mut guest_rx),
        vec![msg(ServerMessage::Error {
            message: ALREADY_IN_ROOM_MESSAGE.into(),
        })]
    );

    // The guest's seat is untouched.
    registry.relay_guess(room_id, host, json!("STONE")).await.unwrap();
    settle(&registry).await;
    assert_eq!(drain(&mut guest_rx), vec![msg(ServerMessage::Guess { guess: json!("STONE") })]);
}

#[tokio::test]
async fn test_create_for_vanished_host_registers_nothing() {
    let registry = registry();
    let (host, host_rx) = client(1);
    drop(host_rx);

    let err = registry.create_room(host).await.unwrap_err();

    assert!(matches!(err, RoomError::Disconnected(_)));
    assert_eq!(registry.room_count().await.unwrap(), 0);
    assert_eq!(registry.seat_of(ConnectionId::new(1)).await.unwrap(), None);
}

#[tokio::test]
async fn test_seat_of_tracks_binding() {
    let registry = registry();
    let (room_id, (host, _host_rx), (guest, _guest_rx)) = full_room(&registry).await;

    assert_eq!(registry.seat_of(host.conn_id()).await.unwrap(), Some(room_id.clone()));
    assert_eq!(registry.seat_of(guest.conn_id()).await.unwrap(), Some(room_id.clone()));

    registry.destroy_room(room_id, DestroyReason::Requested).await.unwrap();
    assert_eq!(registry.seat_of(guest.conn_id()).await.unwrap(), None);
}

// =========================================================================
// join_room
// =========================================================================

#[tokio::test]
async fn test_join_room_shares_word_and_notifies_host() {
    let registry = registry();
    let (host, mut host_rx) = client(1);
    let (guest, mut guest_rx) = client(2);

    let room_id = registry.create_room(host).await.unwrap();
    let created = drain(&mut host_rx);
    registry.join_room(room_id.clone(), guest).await.unwrap();

    let created_word = match &created[..] {
        [Outbound::Message(ServerMessage::RoomCreated { word, .. })] => word.clone(),
        other => panic!("expected room-created, got {other:?}"),
    };
    assert_eq!(
        drain(&mut guest_rx),
        vec![msg(ServerMessage::RoomJoined {
            room_id: room_id.clone(),
            word: created_word,
        })]
    );
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::GuestJoined)]);

    let info = registry.room_info(room_id).await.unwrap().unwrap();
    assert_eq!(info.phase, RoomPhase::InProgress);
    assert_eq!(info.timer, Some(TimerKind::IdleExpiry));
}

#[tokio::test]
async fn test_join_unknown_room_answers_room_expired() {
    let registry = registry();
    let (guest, mut guest_rx) = client(2);

    let err = registry.join_room(RoomId::new("zzzzzz"), guest).await.unwrap_err();

    assert!(matches!(err, RoomError::NotFound(_)));
    assert_eq!(drain(&mut guest_rx), vec![msg(ServerMessage::RoomExpired)]);
}

#[tokio::test]
async fn test_join_full_room_answers_room_expired() {
    let registry = registry();
    let (room_id, (_host, mut host_rx), (_guest, mut guest_rx)) = full_room(&registry).await;
    let (late, mut late_rx) = client(3);

    let err = registry.join_room(room_id, late).await.unwrap_err();

    assert!(matches!(err, RoomError::RoomFull(_)));
    assert_eq!(drain(&mut late_rx), vec![msg(ServerMessage::RoomExpired)]);
    assert!(drain(&mut host_rx).is_empty());
    assert!(drain(&mut guest_rx).is_empty());
}

#[tokio::test]
async fn test_concurrent_joins_only_one_wins() {
    let registry = registry();
    let (host, _host_rx) = client(1);
    let room_id = registry.create_room(host).await.unwrap();

    let (g1, _g1_rx) = client(2);
    let (g2, _g2_rx) = client(3);
    let r1 = registry.clone();
    let r2 = registry.clone();
    let (id1, id2) = (room_id.clone(), room_id.clone());
    let (a, b) = tokio::join!(
        tokio::spawn(async move { r1.join_room(id1, g1).await }),
        tokio::spawn(async move { r2.join_room(id2, g2).await }),
    );

    let wins = [a.unwrap(), b.unwrap()].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one guest should get the seat");
}

#[tokio::test]
async fn test_host_cannot_join_own_room_as_guest() {
    let registry = registry();
    let (host, mut host_rx) = client(1);
    let room_id = registry.create_room(host.clone()).await.unwrap();
    drain(&mut host_rx);

    let err = registry.join_room(room_id.clone(), host).await.unwrap_err();

    assert!(matches!(err, RoomError::AlreadyInRoom(..)));
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::RoomExpired)]);
    let info = registry.room_info(room_id).await.unwrap().unwrap();
    assert!(!info.has_guest);
}

// =========================================================================
// relay_guess
// =========================================================================

#[tokio::test]
async fn test_relay_guess_both_directions() {
    let registry = registry();
    let (room_id, (host, mut host_rx), (guest, mut guest_rx)) = full_room(&registry).await;

    registry.relay_guess(room_id.clone(), host, json!("STONE")).await.unwrap();
    registry.relay_guess(room_id, guest, json!("CRATE")).await.unwrap();
    settle(&registry).await;

    assert_eq!(drain(&mut guest_rx), vec![msg(ServerMessage::Guess { guess: json!("STONE") })]);
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::Guess { guess: json!("CRATE") })]);
}

#[tokio::test]
async fn test_relay_guess_preserves_order() {
    let registry = registry();
    let (room_id, (host, _host_rx), (_guest, mut guest_rx)) = full_room(&registry).await;

    for g in ["ADIEU", "STONE", "CRANE"] {
        registry.relay_guess(room_id.clone(), host.clone(), json!(g)).await.unwrap();
    }
    settle(&registry).await;

    let guesses: Vec<_> = drain(&mut guest_rx)
        .into_iter()
        .map(|o| match o {
            Outbound::Message(ServerMessage::Guess { guess }) => guess,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(guesses, vec![json!("ADIEU"), json!("STONE"), json!("CRANE")]);
}

#[tokio::test]
async fn test_relay_guess_without_guest_is_noop() {
    let registry = registry();
    let (host, mut host_rx) = client(1);
    let room_id = registry.create_room(host.clone()).await.unwrap();
    drain(&mut host_rx);

    registry.relay_guess(room_id, host, json!("STONE")).await.unwrap();
    settle(&registry).await;

    assert!(drain(&mut host_rx).is_empty());
}

#[tokio::test]
async fn test_relay_guess_from_outsider_is_dropped() {
    let registry = registry();
    let (room_id, (_host, mut host_rx), (_guest, mut guest_rx)) = full_room(&registry).await;
    let (outsider, mut outsider_rx) = client(9);

    registry.relay_guess(room_id, outsider, json!("HACKS")).await.unwrap();
    settle(&registry).await;

    assert!(drain(&mut host_rx).is_empty());
    assert!(drain(&mut guest_rx).is_empty());
    assert!(drain(&mut outsider_rx).is_empty());
}

#[tokio::test]
async fn test_relay_guess_to_unknown_room_answers_room_expired() {
    let registry = registry();
    let (stray, mut stray_rx) = client(9);

    registry.relay_guess(RoomId::new("000000"), stray, json!("STONE")).await.unwrap();
    settle(&registry).await;

    assert_eq!(drain(&mut stray_rx), vec![msg(ServerMessage::RoomExpired)]);
}

// =========================================================================
// mark_finished + cooldown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cooldown_starts_only_after_both_finish() {
    let registry = registry();
    let (room_id, (host, mut host_rx), (guest, mut guest_rx)) = full_room(&registry).await;

    registry.mark_finished(room_id.clone(), host.clone()).await.unwrap();
    registry.mark_finished(room_id.clone(), host).await.unwrap();
    settle(&registry).await;

    assert!(drain(&mut host_rx).is_empty(), "one finish must not start cooldown");
    assert!(drain(&mut guest_rx).is_empty());
    let info = registry.room_info(room_id.clone()).await.unwrap().unwrap();
    assert!(info.host_finished);
    assert!(!info.guest_finished);
    assert_eq!(info.timer, Some(TimerKind::IdleExpiry));

    registry.mark_finished(room_id.clone(), guest.clone()).await.unwrap();
    settle(&registry).await;

    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::StartCooldown)]);
    assert_eq!(drain(&mut guest_rx), vec![msg(ServerMessage::StartCooldown)]);
    let info = registry.room_info(room_id.clone()).await.unwrap().unwrap();
    assert_eq!(info.phase, RoomPhase::Cooldown);
    assert_eq!(info.timer, Some(TimerKind::Cooldown));

    // A repeat finish does not restart the cooldown or re-notify.
    registry.mark_finished(room_id, guest).await.unwrap();
    settle(&registry).await;
    assert!(drain(&mut host_rx).is_empty());
    assert!(drain(&mut guest_rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_elapses_into_teardown() {
    let registry = registry();
    let (room_id, (host, mut host_rx), (guest, mut guest_rx)) = full_room(&registry).await;

    registry.mark_finished(room_id.clone(), host).await.unwrap();
    registry.mark_finished(room_id.clone(), guest).await.unwrap();
    settle(&registry).await;
    drain(&mut host_rx);
    drain(&mut guest_rx);

    tokio::time::sleep(Duration::from_secs(29)).await;
    settle(&registry).await;
    assert_eq!(registry.room_count().await.unwrap(), 1, "not before the cooldown ends");

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle(&registry).await;
    assert_eq!(registry.room_count().await.unwrap(), 0);

    for rx in [&mut host_rx, &mut guest_rx] {
        assert_eq!(drain(rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);
    }

    let (late, mut late_rx) = client(3);
    assert!(registry.join_room(room_id, late).await.is_err());
    assert_eq!(drain(&mut late_rx), vec![msg(ServerMessage::RoomExpired)]);
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_supersedes_idle_expiry() {
    let registry = spawn_registry(
        RoomConfig {
            idle_expiry: Duration::from_secs(600),
            cooldown: Duration::from_secs(30),
            ..RoomConfig::default()
        },
        StaticWordProvider::new("crane"),
    );
    let (room_id, (host, mut host_rx), (guest, _guest_rx)) = full_room(&registry).await;

    tokio::time::sleep(Duration::from_secs(590)).await;
    registry.mark_finished(room_id.clone(), host).await.unwrap();
    registry.mark_finished(room_id.clone(), guest).await.unwrap();
    settle(&registry).await;
    drain(&mut host_rx);

    // The idle deadline at 600 s passes; only the cooldown is live.
    tokio::time::sleep(Duration::from_secs(15)).await;
    settle(&registry).await;
    assert_eq!(registry.room_count().await.unwrap(), 1);
    assert!(drain(&mut host_rx).is_empty());

    tokio::time::sleep(Duration::from_secs(20)).await;
    settle(&registry).await;
    assert_eq!(registry.room_count().await.unwrap(), 0);
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);
}

#[tokio::test]
async fn test_finish_from_outsider_is_dropped() {
    let registry = registry();
    let (room_id, (host, mut host_rx), (_guest, mut guest_rx)) = full_room(&registry).await;
    let (outsider, _outsider_rx) = client(9);

    registry.mark_finished(room_id.clone(), host).await.unwrap();
    registry.mark_finished(room_id.clone(), outsider).await.unwrap();
    settle(&registry).await;

    assert!(drain(&mut host_rx).is_empty());
    assert!(drain(&mut guest_rx).is_empty());
    let info = registry.room_info(room_id).await.unwrap().unwrap();
    assert!(!info.guest_finished);
}

// =========================================================================
// Idle expiry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_unjoined_room_expires_at_deadline() {
    let registry = registry();
    let (host, mut host_rx) = client(1);
    let room_id = registry.create_room(host).await.unwrap();
    drain(&mut host_rx);

    tokio::time::sleep(Duration::from_secs(599)).await;
    settle(&registry).await;
    assert!(registry.room_info(room_id.clone()).await.unwrap().is_some());
    assert!(drain(&mut host_rx).is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle(&registry).await;
    assert!(registry.room_info(room_id).await.unwrap().is_none());
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);
}

#[tokio::test(start_paused = true)]
async fn test_join_does_not_extend_idle_expiry() {
    let registry = registry();
    let (host, mut host_rx) = client(1);
    let (guest, mut guest_rx) = client(2);
    let room_id = registry.create_room(host).await.unwrap();

    tokio::time::sleep(Duration::from_secs(300)).await;
    registry.join_room(room_id.clone(), guest).await.unwrap();
    drain(&mut host_rx);
    drain(&mut guest_rx);

    tokio::time::sleep(Duration::from_secs(301)).await;
    settle(&registry).await;

    assert!(registry.room_info(room_id).await.unwrap().is_none());
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);
    assert_eq!(drain(&mut guest_rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);
}

// =========================================================================
// destroy_room / handle_disconnect
// =========================================================================

#[tokio::test]
async fn test_destroy_room_is_idempotent() {
    let registry = registry();
    let (room_id, (_host, mut host_rx), (_guest, mut guest_rx)) = full_room(&registry).await;

    assert!(registry.destroy_room(room_id.clone(), DestroyReason::Requested).await.unwrap());
    assert!(!registry.destroy_room(room_id, DestroyReason::Requested).await.unwrap());

    for rx in [&mut host_rx, &mut guest_rx] {
        assert_eq!(drain(rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);
    }
}

#[tokio::test]
async fn test_disconnect_guest_tears_down_room() {
    let registry = registry();
    let (room_id, (host, mut host_rx), (guest, guest_rx)) = full_room(&registry).await;
    drop(guest_rx);

    let torn = registry.handle_disconnect(guest.conn_id()).await.unwrap();
    assert_eq!(torn, Some(room_id.clone()));
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);

    // No longer relaying, no longer joinable.
    registry.relay_guess(room_id.clone(), host, json!("STONE")).await.unwrap();
    settle(&registry).await;
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::RoomExpired)]);

    let (late, _late_rx) = client(3);
    assert!(matches!(
        registry.join_room(room_id, late).await,
        Err(RoomError::NotFound(_))
    ));

    // Host's own close arrives after the room is gone.
    assert_eq!(registry.handle_disconnect(ConnectionId::new(1)).await.unwrap(), None);
}

#[tokio::test]
async fn test_disconnect_host_frees_guest_for_new_room() {
    let registry = registry();
    let (_room_id, (host, _host_rx), (guest, mut guest_rx)) = full_room(&registry).await;

    registry.handle_disconnect(host.conn_id()).await.unwrap();
    drain(&mut guest_rx);

    // The guest's seat was released along with the room.
    assert!(registry.create_room(guest).await.is_ok());
}

#[tokio::test]
async fn test_disconnect_unbound_connection_is_noop() {
    let registry = registry();
    let (room_id, (_host, mut host_rx), _guest) = full_room(&registry).await;

    assert_eq!(registry.handle_disconnect(ConnectionId::new(42)).await.unwrap(), None);
    assert!(drain(&mut host_rx).is_empty());
    assert!(registry.room_info(room_id).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_timer_after_disconnect_is_noop() {
    let registry = registry();
    let (host, mut host_rx) = client(1);
    registry.create_room(host.clone()).await.unwrap();
    drain(&mut host_rx);

    registry.handle_disconnect(host.conn_id()).await.unwrap();
    assert_eq!(drain(&mut host_rx), vec![msg(ServerMessage::RoomExpired), Outbound::Close]);

    // Reuse the same connection id for a new room; the old room's
    // deadline must not touch it.
    tokio::time::sleep(Duration::from_secs(300)).await;
    let second = registry.create_room(host).await.unwrap();
    drain(&mut host_rx);

    tokio::time::sleep(Duration::from_secs(301)).await;
    settle(&registry).await;
    assert!(registry.room_info(second).await.unwrap().is_some());
    assert!(drain(&mut host_rx).is_empty());
}
