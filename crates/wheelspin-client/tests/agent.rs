//! Integration tests for the client agent against a real Wheelspin server.

use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use wheelspin::WheelspinServerBuilder;
use wheelspin_client::{
    CONNECTION_LOST_MESSAGE, ClientConfig, ClientEvent, ClientHandle,
    ClientSyncAgent, ConnectionState, NOT_CONNECTED_MESSAGE, Panel,
    ReconnectPolicy, landing_rotation, slice_at_pointer,
};
use wheelspin_protocol::{
    Codec, JsonCodec, Participant, ParticipantId, ServerFrame, SessionState,
};
use wheelspin_session::MemoryStorage;

// =========================================================================
// Helpers
// =========================================================================

async fn start_server_on(bind: &str) -> String {
    let server = WheelspinServerBuilder::new()
        .bind(bind)
        .build(MemoryStorage::new())
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("local addr").to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn start_server() -> String {
    start_server_on("127.0.0.1:0").await
}

/// An address nothing is listening on (at least for now).
fn free_addr() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().to_string()
}

fn config(addr: &str) -> ClientConfig {
    ClientConfig::new(format!("ws://{addr}"))
        .with_frame_interval(Duration::from_millis(1))
        .with_reconnect(ReconnectPolicy {
            base: Duration::from_millis(20),
            max_attempts: 3,
        })
}

type Events = mpsc::Receiver<ClientEvent>;

/// Pulls events until `f` picks one out.
async fn next_matching<T>(
    events: &mut Events,
    mut f: impl FnMut(&ClientEvent) -> Option<T>,
) -> T {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.expect("event channel closed");
            if let Some(value) = f(&event) {
                return value;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

async fn wait_for_state(events: &mut Events, participants: usize) {
    next_matching(events, |e| match e {
        ClientEvent::StateUpdated(s) if s.participants.len() == participants => {
            Some(())
        }
        _ => None,
    })
    .await
}

async fn connected(addr: &str) -> (ClientHandle, Events) {
    let (client, mut events) = ClientSyncAgent::start(config(addr));
    wait_for_state(&mut events, 0).await;
    (client, events)
}

/// Accepts one client on a bare WebSocket listener with no room behind it,
/// so a test can script exactly what the agent receives.
async fn accept_raw(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("timed out waiting for the agent")
        .unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

fn state_frame(names: &[&str]) -> Message {
    let state = SessionState {
        participants: names
            .iter()
            .map(|n| Participant {
                name: n.to_string(),
                id: ParticipantId(format!("id-{n}")),
            })
            .collect(),
        ..SessionState::default()
    };
    Message::text(JsonCodec.encode(&ServerFrame::State { state }).unwrap())
}

async fn reveal(events: &mut Events) -> (String, usize) {
    let started = next_matching(events, |e| match e {
        ClientEvent::RevealStarted {
            winner,
            winner_index,
        } => Some((winner.name.clone(), *winner_index)),
        _ => None,
    })
    .await;
    let finished = next_matching(events, |e| match e {
        ClientEvent::RevealFinished { winner } => Some(winner.name.clone()),
        _ => None,
    })
    .await;
    assert_eq!(started.0, finished);
    started
}

// =========================================================================
// Connection lifecycle
// =========================================================================

#[tokio::test]
async fn test_agent_connects_and_receives_initial_state() {
    let addr = start_server().await;
    let (client, mut events) = ClientSyncAgent::start(config(&addr));

    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Connection(ConnectionState::Connecting))
    );
    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Connection(ConnectionState::Connected))
    );
    match events.recv().await {
        Some(ClientEvent::StateUpdated(state)) => {
            assert!(state.participants.is_empty());
            assert!(!state.is_locked);
        }
        other => panic!("expected StateUpdated, got {other:?}"),
    }
    assert_eq!(client.view().connection, ConnectionState::Connected);
}

#[tokio::test]
async fn test_terminal_after_retries_exhausted() {
    let addr = free_addr();
    let (client, mut events) = ClientSyncAgent::start(config(&addr));

    let message = next_matching(&mut events, |e| match e {
        ClientEvent::Terminal(m) => Some(m.clone()),
        _ => None,
    })
    .await;
    assert_eq!(message, CONNECTION_LOST_MESSAGE);

    let view = client.view();
    assert_eq!(view.terminal_error.as_deref(), Some(CONNECTION_LOST_MESSAGE));
    assert_eq!(view.connection, ConnectionState::Disconnected);

    for _ in 0..100 {
        if client.is_stopped() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(client.is_stopped());
    assert!(client.join("Alice").is_err());
}

#[tokio::test]
async fn test_reconnects_once_server_appears() {
    let addr = free_addr();
    let (client, mut events) = ClientSyncAgent::start(
        config(&addr).with_reconnect(ReconnectPolicy {
            base: Duration::from_millis(50),
            max_attempts: 10,
        }),
    );

    next_matching(&mut events, |e| {
        (*e == ClientEvent::Connection(ConnectionState::Disconnected)).then_some(())
    })
    .await;

    start_server_on(&addr).await;
    next_matching(&mut events, |e| {
        (*e == ClientEvent::Connection(ConnectionState::Connected)).then_some(())
    })
    .await;
    wait_for_state(&mut events, 0).await;
    assert!(client.view().terminal_error.is_none());
}

#[tokio::test]
async fn test_dropped_session_reconnects_with_fresh_retry_budget() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    // base 20ms, 3 attempts
    let (client, mut events) = ClientSyncAgent::start(config(&addr));

    let mut first = accept_raw(&listener).await;
    first.send(state_frame(&[])).await.unwrap();
    wait_for_state(&mut events, 0).await;
    first.close(None).await.unwrap();
    drop(first);

    // The first drop spends one backoff step before this reconnect.
    let mut second = accept_raw(&listener).await;
    second.send(state_frame(&["Alice"])).await.unwrap();
    wait_for_state(&mut events, 1).await;
    assert_eq!(client.view().connection, ConnectionState::Connected);
    assert_eq!(client.view().snapshot.participants[0].name, "Alice");

    drop(listener);
    second.close(None).await.unwrap();
    drop(second);

    let mut retries = 0;
    let message = next_matching(&mut events, |e| match e {
        ClientEvent::Connection(ConnectionState::Connecting) => {
            retries += 1;
            None
        }
        ClientEvent::Terminal(m) => Some(m.clone()),
        _ => None,
    })
    .await;
    assert_eq!(message, CONNECTION_LOST_MESSAGE);
    assert_eq!(retries, 3);
}

#[tokio::test]
async fn test_bad_frames_are_dropped_without_disconnecting() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (client, mut events) = ClientSyncAgent::start(config(&addr));

    let mut ws = accept_raw(&listener).await;
    ws.send(Message::text("{not json")).await.unwrap();
    ws.send(Message::text(r#"{"type":"confetti"}"#)).await.unwrap();
    ws.send(state_frame(&["Alice", "Bob"])).await.unwrap();

    let mut dropped = false;
    next_matching(&mut events, |e| match e {
        ClientEvent::Connection(ConnectionState::Disconnected) => {
            dropped = true;
            None
        }
        ClientEvent::StateUpdated(s) if s.participants.len() == 2 => Some(()),
        _ => None,
    })
    .await;
    assert!(!dropped, "agent disconnected on a bad frame");

    let view = client.view();
    assert_eq!(view.connection, ConnectionState::Connected);
    assert_eq!(view.snapshot.participants.len(), 2);
    assert!(view.error_banner.is_none());
}

#[tokio::test]
async fn test_command_while_offline_shows_banner() {
    let addr = free_addr();
    let (client, mut events) = ClientSyncAgent::start(
        config(&addr).with_reconnect(ReconnectPolicy {
            base: Duration::from_millis(500),
            max_attempts: 5,
        }),
    );
    next_matching(&mut events, |e| {
        (*e == ClientEvent::Connection(ConnectionState::Disconnected)).then_some(())
    })
    .await;

    client.start().unwrap();
    let mut watch = client.watch();
    let view = tokio::time::timeout(
        Duration::from_secs(2),
        watch.wait_for(|v| v.error_banner.is_some()),
    )
    .await
    .expect("timed out")
    .expect("agent stopped")
    .clone();
    assert_eq!(view.active_error(Instant::now()), Some(NOT_CONNECTED_MESSAGE));
}

#[tokio::test]
async fn test_shutdown_stops_agent() {
    let addr = start_server().await;
    let (client, mut events) = connected(&addr).await;

    client.shutdown().await;

    let mut last = None;
    while let Some(event) = events.recv().await {
        last = Some(event);
    }
    assert_eq!(
        last,
        Some(ClientEvent::Connection(ConnectionState::Disconnected))
    );
}

// =========================================================================
// Joining
// =========================================================================

#[tokio::test]
async fn test_join_confirmed_when_listed() {
    let addr = start_server().await;
    let (client, mut events) = connected(&addr).await;

    client.join("  Alice ").unwrap();
    wait_for_state(&mut events, 1).await;

    let view = client.view();
    let user = view.current_user.clone().expect("current user");
    assert_eq!(user.name, "Alice");
    assert!(user.confirmed);
    let page = view.player_view(Instant::now());
    assert_eq!(page.panel, Panel::Game);
    assert!(page.participants[0].highlighted);
}

#[tokio::test]
async fn test_duplicate_join_returns_to_join_panel() {
    let addr = start_server().await;
    let (alice, mut alice_events) = connected(&addr).await;
    let (imposter, mut imposter_events) = connected(&addr).await;

    alice.join("Alice").unwrap();
    wait_for_state(&mut alice_events, 1).await;
    wait_for_state(&mut imposter_events, 1).await;

    imposter.join("Alice").unwrap();
    let message = next_matching(&mut imposter_events, |e| match e {
        ClientEvent::ServerError(m) => Some(m.clone()),
        _ => None,
    })
    .await;
    assert_eq!(message, "Name already exists. Please choose another.");

    let view = imposter.view();
    assert!(view.current_user.is_none());
    let page = view.player_view(Instant::now());
    assert_eq!(page.panel, Panel::Join);
    assert_eq!(page.error.as_deref(), Some(message.as_str()));
    assert!(alice.view().current_user.unwrap().confirmed);
}

#[tokio::test]
async fn test_blank_join_is_not_sent() {
    let addr = start_server().await;
    let (client, mut events) = connected(&addr).await;

    client.join("   ").unwrap();
    client.join("Bob").unwrap();
    wait_for_state(&mut events, 1).await;
    assert_eq!(client.view().snapshot.participants[0].name, "Bob");
}

// =========================================================================
// Reveal
// =========================================================================

#[tokio::test]
async fn test_zero_frame_interval_still_animates() {
    let addr = start_server().await;
    let (alice, mut alice_events) =
        ClientSyncAgent::start(config(&addr).with_frame_interval(Duration::ZERO));
    wait_for_state(&mut alice_events, 0).await;
    let (bob, mut bob_events) = connected(&addr).await;

    alice.join("Alice").unwrap();
    wait_for_state(&mut bob_events, 1).await;
    bob.join("Bob").unwrap();
    wait_for_state(&mut alice_events, 2).await;
    alice.start().unwrap();

    let (_, index) = reveal(&mut alice_events).await;
    assert_eq!(slice_at_pointer(2, alice.view().rotation), Some(index));
}

#[tokio::test]
async fn test_reveal_is_synchronized_across_clients() {
    let addr = start_server().await;
    let (alice, mut alice_events) = connected(&addr).await;
    let (bob, mut bob_events) = connected(&addr).await;
    let (admin, mut admin_events) = connected(&addr).await;

    alice.join("Alice").unwrap();
    wait_for_state(&mut admin_events, 1).await;
    bob.join("Bob").unwrap();
    wait_for_state(&mut admin_events, 2).await;
    assert!(admin.view().admin_view(Instant::now()).start_enabled);

    admin.start().unwrap();

    let a = reveal(&mut alice_events).await;
    let b = reveal(&mut bob_events).await;
    let c = reveal(&mut admin_events).await;
    assert_eq!(a, b);
    assert_eq!(b, c);

    for client in [&alice, &bob, &admin] {
        let view = client.view();
        assert!(!view.is_animating);
        assert_eq!(view.rotation, view.target_rotation);
        assert_eq!(slice_at_pointer(2, view.rotation), Some(a.1));
        assert_eq!(view.player_view(Instant::now()).winner, Some(a.0.clone()));
    }

    let page = admin.view().admin_view(Instant::now());
    assert_eq!(page.game_status, "Started");
    assert_eq!(page.current_winner, a.0);
    assert!(!page.start_enabled);
}

#[tokio::test]
async fn test_late_joiner_snaps_to_winner() {
    let addr = start_server().await;
    let (alice, mut alice_events) = connected(&addr).await;
    let (bob, mut bob_events) = connected(&addr).await;
    alice.join("Alice").unwrap();
    wait_for_state(&mut bob_events, 1).await;
    bob.join("Bob").unwrap();
    wait_for_state(&mut alice_events, 2).await;
    alice.start().unwrap();
    let (winner, index) = reveal(&mut alice_events).await;

    let (late, mut late_events) = ClientSyncAgent::start(config(&addr));
    wait_for_state(&mut late_events, 2).await;

    let view = late.view();
    assert!(!view.is_animating);
    assert_eq!(view.rotation, landing_rotation(index, 2));
    assert_eq!(view.snapshot.winner.as_ref().map(|w| w.name.clone()), Some(winner));

    // No spin is replayed for a draw that happened before we arrived.
    let spun = tokio::time::timeout(Duration::from_millis(100), async {
        while let Some(event) = late_events.recv().await {
            if matches!(event, ClientEvent::RevealStarted { .. }) {
                return true;
            }
        }
        false
    })
    .await;
    assert!(!matches!(spun, Ok(true)));
}

#[tokio::test]
async fn test_reset_clears_every_view() {
    let addr = start_server().await;
    let (alice, mut alice_events) = connected(&addr).await;
    let (admin, mut admin_events) = connected(&addr).await;
    alice.join("Alice").unwrap();
    wait_for_state(&mut alice_events, 1).await;
    wait_for_state(&mut admin_events, 1).await;

    admin.reset().unwrap();
    wait_for_state(&mut alice_events, 0).await;
    wait_for_state(&mut admin_events, 0).await;

    assert!(alice.view().current_user.is_none());
    assert_eq!(
        admin.view().admin_view(Instant::now()).participant_lines,
        ["No participants yet"]
    );
}
