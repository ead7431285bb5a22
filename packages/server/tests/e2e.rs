//! End-to-end tests: boot the real router on an ephemeral port and drive it
//! over actual WebSocket / HTTP connections.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

use idobata_server::infrastructure::registry::WebSocketConnectionRegistry;
use idobata_server::infrastructure::repository::InMemoryMessageRepository;
use idobata_server::ui::Server;
use idobata_server::usecase::{
    CheckHealthUseCase, ConnectParticipantUseCase, DisconnectParticipantUseCase,
    ListHistoryUseCase, SendMessageUseCase,
};
use idobata_shared::time::SystemClock;

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawn a fully wired server (in-memory store) on an ephemeral port and
/// return its address.
async fn spawn_test_server(echo_to_sender: bool) -> String {
    let repository = Arc::new(InMemoryMessageRepository::new());
    let registry = Arc::new(WebSocketConnectionRegistry::new());
    let clock = Arc::new(SystemClock);

    let server = Server::new(
        Arc::new(ConnectParticipantUseCase::new(registry.clone(), clock.clone())),
        Arc::new(DisconnectParticipantUseCase::new(registry.clone(), clock.clone())),
        Arc::new(SendMessageUseCase::new(
            repository.clone(),
            registry.clone(),
            clock.clone(),
            echo_to_sender,
        )),
        Arc::new(ListHistoryUseCase::new(repository.clone())),
        Arc::new(CheckHealthUseCase::new(
            repository.clone(),
            Duration::from_millis(500),
        )),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("failed to read local addr");
    let router = server.into_router();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("test server crashed");
    });

    format!("127.0.0.1:{}", addr.port())
}

/// Connect a WebSocket client to a room.
async fn connect(addr: &str, room_id: &str, client_id: &str) -> WsClient {
    let url = format!("ws://{}/ws/{}?client_id={}", addr, room_id, client_id);
    let (ws, _response) = connect_async(url).await.expect("failed to connect");
    ws
}

/// Read frames until one with the given `type` arrives, skipping the others
/// (presence frames interleave with chat frames).
async fn recv_frame_of_type(ws: &mut WsClient, frame_type: &str) -> Value {
    loop {
        let msg = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("connection closed unexpectedly")
            .expect("websocket error");
        if let tungstenite::Message::Text(text) = msg {
            let frame: Value = serde_json::from_str(&text).expect("frame is not valid JSON");
            if frame["type"] == frame_type {
                return frame;
            }
        }
    }
}

async fn send_text(ws: &mut WsClient, body: &str) {
    ws.send(tungstenite::Message::Text(body.into()))
        .await
        .expect("failed to send");
}

#[tokio::test]
async fn test_end_to_end_chat_between_two_clients() {
    // A and B join "general"; A sends "hi" -> both receive sequence 1;
    // B sends "hello" -> both receive sequence 2; the history endpoint
    // returns both messages in order.
    let addr = spawn_test_server(true).await;

    let mut ws_a = connect(&addr, "general", "alice").await;
    recv_frame_of_type(&mut ws_a, "room_connected").await;

    let mut ws_b = connect(&addr, "general", "bob").await;
    recv_frame_of_type(&mut ws_b, "room_connected").await;
    recv_frame_of_type(&mut ws_a, "participant_joined").await;

    // A sends "hi"
    send_text(&mut ws_a, "hi").await;
    let frame_a = recv_frame_of_type(&mut ws_a, "chat").await;
    let frame_b = recv_frame_of_type(&mut ws_b, "chat").await;
    for frame in [&frame_a, &frame_b] {
        assert_eq!(frame["senderId"], "alice");
        assert_eq!(frame["body"], "hi");
        assert_eq!(frame["sequence"], 1);
    }

    // B sends "hello"
    send_text(&mut ws_b, "hello").await;
    let frame_a = recv_frame_of_type(&mut ws_a, "chat").await;
    let frame_b = recv_frame_of_type(&mut ws_b, "chat").await;
    for frame in [&frame_a, &frame_b] {
        assert_eq!(frame["senderId"], "bob");
        assert_eq!(frame["body"], "hello");
        assert_eq!(frame["sequence"], 2);
    }

    // History returns both messages in order
    let history: Value = reqwest::get(format!(
        "http://{}/api/v1/rooms/general/messages?after=0&limit=10",
        addr
    ))
    .await
    .expect("history request failed")
    .json()
    .await
    .expect("history is not valid JSON");

    let messages = history.as_array().expect("history is not an array");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["senderId"], "alice");
    assert_eq!(messages[0]["body"], "hi");
    assert_eq!(messages[0]["sequence"], 1);
    assert_eq!(messages[1]["senderId"], "bob");
    assert_eq!(messages[1]["body"], "hello");
    assert_eq!(messages[1]["sequence"], 2);
}

#[tokio::test]
async fn test_duplicate_connection_rejected_with_conflict() {
    // The second connection with the same (room, client) pair is refused
    // with HTTP 409 and the first connection keeps working.
    let addr = spawn_test_server(true).await;

    let mut ws_first = connect(&addr, "general", "alice").await;
    recv_frame_of_type(&mut ws_first, "room_connected").await;

    let url = format!("ws://{}/ws/general?client_id=alice", addr);
    let error = connect_async(url).await.expect_err("duplicate was accepted");
    match error {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), 409);
        }
        other => panic!("expected HTTP 409 rejection, got: {:?}", other),
    }

    // The first connection is intact
    send_text(&mut ws_first, "still here").await;
    let frame = recv_frame_of_type(&mut ws_first, "chat").await;
    assert_eq!(frame["body"], "still here");
}

#[tokio::test]
async fn test_invalid_identifiers_rejected_with_bad_request() {
    let addr = spawn_test_server(true).await;

    // client_id with whitespace is refused before the upgrade
    let url = format!("ws://{}/ws/general?client_id=bad%20id", addr);
    let error = connect_async(url).await.expect_err("invalid id was accepted");
    match error {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), 400);
        }
        other => panic!("expected HTTP 400 rejection, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_oversized_message_gets_error_frame_sender_only() {
    let addr = spawn_test_server(true).await;

    let mut ws_a = connect(&addr, "general", "alice").await;
    recv_frame_of_type(&mut ws_a, "room_connected").await;
    let mut ws_b = connect(&addr, "general", "bob").await;
    recv_frame_of_type(&mut ws_b, "room_connected").await;
    recv_frame_of_type(&mut ws_a, "participant_joined").await;

    // 2001 characters exceeds the body limit
    send_text(&mut ws_a, &"x".repeat(2001)).await;
    let frame = recv_frame_of_type(&mut ws_a, "error").await;
    assert_eq!(frame["code"], "validation_error");

    // The connection stays open and the next valid message flows normally
    send_text(&mut ws_a, "short one").await;
    let frame_a = recv_frame_of_type(&mut ws_a, "chat").await;
    let frame_b = recv_frame_of_type(&mut ws_b, "chat").await;
    assert_eq!(frame_a["sequence"], 1);
    assert_eq!(frame_b["body"], "short one");
}

#[tokio::test]
async fn test_no_echo_policy_excludes_sender() {
    let addr = spawn_test_server(false).await;

    let mut ws_a = connect(&addr, "general", "alice").await;
    recv_frame_of_type(&mut ws_a, "room_connected").await;
    let mut ws_b = connect(&addr, "general", "bob").await;
    recv_frame_of_type(&mut ws_b, "room_connected").await;
    recv_frame_of_type(&mut ws_a, "participant_joined").await;

    send_text(&mut ws_a, "no echo please").await;
    let frame_b = recv_frame_of_type(&mut ws_b, "chat").await;
    assert_eq!(frame_b["senderId"], "alice");

    // The sender must not receive their own message: B replies, and the
    // next frame A sees is B's message, not A's own
    send_text(&mut ws_b, "reply").await;
    let frame_a = recv_frame_of_type(&mut ws_a, "chat").await;
    assert_eq!(frame_a["senderId"], "bob");
    assert_eq!(frame_a["body"], "reply");
}

#[tokio::test]
async fn test_disconnect_broadcasts_participant_left() {
    let addr = spawn_test_server(true).await;

    let mut ws_a = connect(&addr, "general", "alice").await;
    recv_frame_of_type(&mut ws_a, "room_connected").await;
    let mut ws_b = connect(&addr, "general", "bob").await;
    recv_frame_of_type(&mut ws_b, "room_connected").await;
    recv_frame_of_type(&mut ws_a, "participant_joined").await;

    // B leaves; A is notified
    ws_b.close(None).await.expect("failed to close");
    let frame = recv_frame_of_type(&mut ws_a, "participant_left").await;
    assert_eq!(frame["clientId"], "bob");
}

#[tokio::test]
async fn test_room_connected_snapshot_lists_existing_participants() {
    let addr = spawn_test_server(true).await;

    let mut ws_a = connect(&addr, "general", "alice").await;
    recv_frame_of_type(&mut ws_a, "room_connected").await;

    // B's snapshot contains both alice and bob, sorted by client id
    let mut ws_b = connect(&addr, "general", "bob").await;
    let snapshot = recv_frame_of_type(&mut ws_b, "room_connected").await;
    assert_eq!(snapshot["roomId"], "general");
    let participants = snapshot["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    assert_eq!(participants[0]["clientId"], "alice");
    assert_eq!(participants[1]["clientId"], "bob");
}

#[tokio::test]
async fn test_rooms_do_not_leak_messages() {
    let addr = spawn_test_server(true).await;

    let mut ws_general = connect(&addr, "general", "alice").await;
    recv_frame_of_type(&mut ws_general, "room_connected").await;
    let mut ws_random = connect(&addr, "random", "bob").await;
    recv_frame_of_type(&mut ws_random, "room_connected").await;

    send_text(&mut ws_general, "general only").await;
    recv_frame_of_type(&mut ws_general, "chat").await;

    // bob (in "random") sees nothing; his own message is the next frame
    send_text(&mut ws_random, "random only").await;
    let frame = recv_frame_of_type(&mut ws_random, "chat").await;
    assert_eq!(frame["body"], "random only");
    assert_eq!(frame["sequence"], 1); // independent per-room sequence

    // And the history endpoints are disjoint
    let history: Value = reqwest::get(format!(
        "http://{}/api/v1/rooms/random/messages?after=0&limit=10",
        addr
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["body"], "random only");
}

#[tokio::test]
async fn test_history_of_unknown_room_is_empty_array() {
    let addr = spawn_test_server(true).await;

    let response = reqwest::get(format!(
        "http://{}/api/v1/rooms/deserted/messages?after=0&limit=10",
        addr
    ))
    .await
    .expect("history request failed");

    assert_eq!(response.status(), 200);
    let history: Value = response.json().await.unwrap();
    assert_eq!(history, serde_json::json!([]));
}

#[tokio::test]
async fn test_health_endpoint_reports_ok() {
    let addr = spawn_test_server(true).await;

    let health: Value = reqwest::get(format!("http://{}/api/v1/health", addr))
        .await
        .expect("health request failed")
        .json()
        .await
        .expect("health is not valid JSON");

    assert_eq!(health["status"], "ok");
    assert_eq!(health["databaseReachable"], true);
}
