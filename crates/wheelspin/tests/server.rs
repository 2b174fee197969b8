//! Integration tests for the Wheelspin server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use wheelspin::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns its address and room.
async fn start_server_with(storage: MemoryStorage) -> (String, RoomHandle) {
    let server = WheelspinServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(storage)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let room = server.room();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, room)
}

async fn start_server() -> String {
    start_server_with(MemoryStorage::new()).await.0
}

/// Connects and consumes the initial `state` frame.
async fn connect(addr: &str) -> (ClientWs, Value) {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    let first = recv(&mut ws).await;
    assert_eq!(first["type"], "state", "first frame must be state");
    (ws, first)
}

async fn send(ws: &mut ClientWs, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("send");
}

async fn recv(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .expect("recv");
    serde_json::from_str(msg.to_text().expect("text frame")).expect("json")
}

/// Asserts nothing arrives within a short window.
async fn assert_silent(ws: &mut ClientWs) {
    let result =
        tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
    assert!(result.is_err(), "expected no frame, got {result:?}");
}

fn names(frame: &Value) -> Vec<String> {
    frame["state"]["participants"]
        .as_array()
        .expect("participants array")
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connect_receives_default_state() {
    let addr = start_server().await;
    let (_ws, first) = connect(&addr).await;

    assert_eq!(
        first,
        json!({
            "type": "state",
            "state": {
                "participants": [],
                "isLocked": false,
                "gameStarted": false,
                "winner": null
            }
        })
    );
}

#[tokio::test]
async fn test_join_is_broadcast_to_all_clients() {
    let addr = start_server().await;
    let (mut player, _) = connect(&addr).await;
    let (mut admin, _) = connect(&addr).await;

    send(&mut player, json!({"type": "join", "name": "  Alice  "})).await;

    for ws in [&mut player, &mut admin] {
        let frame = recv(ws).await;
        assert_eq!(frame["type"], "state");
        assert_eq!(names(&frame), ["Alice"]);
        let id = frame["state"]["participants"][0]["id"].as_str().unwrap();
        assert_eq!(id.len(), 32);
    }
}

#[tokio::test]
async fn test_duplicate_name_error_only_to_sender() {
    let addr = start_server().await;
    let (mut first, _) = connect(&addr).await;
    let (mut second, _) = connect(&addr).await;

    send(&mut first, json!({"type": "join", "name": "Alice"})).await;
    recv(&mut first).await;
    recv(&mut second).await;

    send(&mut second, json!({"type": "join", "name": "Alice"})).await;
    assert_eq!(
        recv(&mut second).await,
        json!({"type": "error", "message": "Name already exists. Please choose another."})
    );
    assert_silent(&mut first).await;
}

#[tokio::test]
async fn test_full_session_flow() {
    let addr = start_server().await;
    let (mut alice, _) = connect(&addr).await;
    let (mut bob, _) = connect(&addr).await;
    let (mut admin, _) = connect(&addr).await;

    send(&mut alice, json!({"type": "join", "name": "Alice"})).await;
    for ws in [&mut alice, &mut bob, &mut admin] {
        recv(ws).await;
    }
    send(&mut bob, json!({"type": "join", "name": "Bob"})).await;
    for ws in [&mut alice, &mut bob, &mut admin] {
        assert_eq!(names(&recv(ws).await), ["Alice", "Bob"]);
    }

    send(&mut admin, json!({"type": "start"})).await;
    let mut winners = Vec::new();
    for ws in [&mut alice, &mut bob, &mut admin] {
        let frame = recv(ws).await;
        assert_eq!(frame["type"], "winner");
        let index = frame["winnerIndex"].as_u64().unwrap();
        assert!(index < 2);
        winners.push((frame["winner"]["name"].clone(), index));
    }
    assert!(winners.windows(2).all(|w| w[0] == w[1]));

    send(&mut alice, json!({"type": "join", "name": "Carol"})).await;
    assert_eq!(recv(&mut alice).await["message"], "Game is locked. Cannot join.");

    send(&mut admin, json!({"type": "reset"})).await;
    for ws in [&mut alice, &mut bob, &mut admin] {
        let frame = recv(ws).await;
        assert_eq!(frame["state"]["gameStarted"], false);
        assert!(names(&frame).is_empty());
    }
}

#[tokio::test]
async fn test_late_joiner_gets_winner_in_first_frame() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;
    send(&mut ws, json!({"type": "join", "name": "Alice"})).await;
    recv(&mut ws).await;
    send(&mut ws, json!({"type": "join", "name": "Bob"})).await;
    recv(&mut ws).await;
    send(&mut ws, json!({"type": "start"})).await;
    let winner = recv(&mut ws).await;

    let (_late, first) = connect(&addr).await;
    assert_eq!(first["state"]["winner"], winner["winner"]);
    assert_eq!(first["state"]["isLocked"], true);
}

#[tokio::test]
async fn test_start_needs_two_participants() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;
    send(&mut ws, json!({"type": "join", "name": "Alice"})).await;
    recv(&mut ws).await;

    send(&mut ws, json!({"type": "start"})).await;
    assert_eq!(
        recv(&mut ws).await["message"],
        "Need at least 2 participants to start."
    );
}

#[tokio::test]
async fn test_garbage_gets_generic_error() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    ws.send(Message::Text("not json".into())).await.expect("send");
    assert_eq!(
        recv(&mut ws).await,
        json!({"type": "error", "message": "Invalid message format"})
    );

    // The connection survives and keeps working.
    send(&mut ws, json!({"type": "join", "name": "Alice"})).await;
    assert_eq!(names(&recv(&mut ws).await), ["Alice"]);
}

#[tokio::test]
async fn test_unknown_type_is_ignored() {
    let addr = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, json!({"type": "spin-faster"})).await;
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_disconnect_unregisters_connection() {
    let (addr, room) = start_server_with(MemoryStorage::new()).await;
    let (mut ws, _) = connect(&addr).await;
    send(&mut ws, json!({"type": "join", "name": "Alice"})).await;
    recv(&mut ws).await;
    assert_eq!(room.info().await.unwrap().connections, 1);

    ws.close(None).await.expect("close");
    drop(ws);

    let mut connections = 1;
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        connections = room.info().await.unwrap().connections;
        if connections == 0 {
            break;
        }
    }
    assert_eq!(connections, 0);
    // Leaving the socket does not leave the session.
    assert_eq!(room.info().await.unwrap().state.participants.len(), 1);
}

#[tokio::test]
async fn test_state_survives_server_restart() {
    let storage = MemoryStorage::new();
    let (addr, room) = start_server_with(storage.clone()).await;
    let (mut ws, _) = connect(&addr).await;
    send(&mut ws, json!({"type": "join", "name": "Alice"})).await;
    recv(&mut ws).await;
    send(&mut ws, json!({"type": "join", "name": "Bob"})).await;
    let before = recv(&mut ws).await;
    room.shutdown().await.unwrap();

    let (addr, _room) = start_server_with(storage).await;
    let (_ws, first) = connect(&addr).await;
    assert_eq!(first["state"], before["state"]);
}

#[tokio::test]
async fn test_builder_rejects_corrupt_storage() {
    let storage = MemoryStorage::new();
    storage
        .put("wheel/state", "{\"participants\": 5}".into())
        .await
        .unwrap();

    let result = WheelspinServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(storage)
        .await;
    assert!(matches!(result, Err(WheelspinError::Room(_))));
}
