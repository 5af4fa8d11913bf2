//! Integration tests for the live match relay.
//!
//! Spins up an actual HTTP server and connects WS clients to validate the
//! full lifecycle: connect → load_game → commands → fan-out → close.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use live_chess::api::router::create_router;
use live_chess::api::state::AppState;
use live_chess::config::AppConfig;

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;
type WsWrite = futures_util::stream::SplitSink<WsStream, Message>;
type WsRead = futures_util::stream::SplitStream<WsStream>;

/// Start the server on an OS-assigned port, return its base URL.
async fn start_server() -> String {
    let state = AppState::new(AppConfig::default());
    let app = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", addr.port())
}

async fn post(base: &str, path: &str, body: serde_json::Value) -> serde_json::Value {
    reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

/// Create a match with alice as white and bob as black, return its id.
async fn seated_match(base: &str) -> String {
    let body = post(base, "/api/matches", serde_json::json!({"name": "friendly"})).await;
    let id = body["id"].as_str().unwrap().to_string();
    let join = format!("/api/matches/{id}/join");
    post(base, &join, serde_json::json!({"player": "alice", "color": "white"})).await;
    post(base, &join, serde_json::json!({"player": "bob", "color": "black"})).await;
    id
}

async fn rest_move(base: &str, id: &str, player: &str, from: &str, to: &str) {
    post(
        base,
        &format!("/api/matches/{id}/moves"),
        serde_json::json!({"player": player, "from": from, "to": to}),
    )
    .await;
}

/// Connect a WS client and consume its initial load_game event.
async fn ws_connect(base: &str, match_id: &str) -> (WsWrite, WsRead) {
    let ws_url = base.replace("http://", "ws://");
    let url = format!("{ws_url}/ws/matches/{match_id}");
    let (stream, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let (write, mut read) = stream.split();
    let first = next_json(&mut read).await;
    assert_eq!(first["type"], "load_game");
    (write, read)
}

async fn send(write: &mut WsWrite, cmd: serde_json::Value) {
    write
        .send(Message::Text(cmd.to_string().into()))
        .await
        .unwrap();
}

/// Read the next text message as JSON, with a timeout.
async fn next_json(read: &mut WsRead) -> serde_json::Value {
    let msg = tokio::time::timeout(Duration::from_secs(5), read.next())
        .await
        .expect("timed out waiting for WS message")
        .expect("stream ended")
        .expect("WS error");

    match msg {
        Message::Text(text) => serde_json::from_str(&text).expect("invalid JSON"),
        other => panic!("expected Text message, got {other:?}"),
    }
}

async fn assert_silent(read: &mut WsRead) {
    let result = tokio::time::timeout(Duration::from_millis(200), read.next()).await;
    assert!(result.is_err(), "expected no message, got {result:?}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_sends_load_game() {
    let base = start_server().await;
    let id = seated_match(&base).await;

    let ws_url = base.replace("http://", "ws://");
    let (stream, _) = tokio_tungstenite::connect_async(format!("{ws_url}/ws/matches/{id}"))
        .await
        .unwrap();
    let (_write, mut read) = stream.split();
    let msg = next_json(&mut read).await;

    assert_eq!(msg["type"], "load_game");
    assert_eq!(msg["id"], id);
    assert_eq!(msg["turn"], "white");
    assert_eq!(msg["status"], "active");
    assert_eq!(msg["players"]["white"], "alice");
    assert_eq!(msg["record"]["pieces"].as_array().unwrap().len(), 32);
}

#[tokio::test]
async fn connect_to_unknown_match_sends_error() {
    let base = start_server().await;
    let ws_url = base.replace("http://", "ws://");
    let (stream, _) = tokio_tungstenite::connect_async(format!("{ws_url}/ws/matches/nope"))
        .await
        .unwrap();
    let (_write, mut read) = stream.split();

    let msg = next_json(&mut read).await;
    assert_eq!(msg["type"], "error");
    assert!(msg["message"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn ws_move_reaches_everyone_but_the_mover_notice() {
    let base = start_server().await;
    let id = seated_match(&base).await;

    let (mut alice_w, mut alice_r) = ws_connect(&base, &id).await;
    let (_watch_w, mut watch_r) = ws_connect(&base, &id).await;

    send(
        &mut alice_w,
        serde_json::json!({"type": "make_move", "player": "alice", "from": "e2", "to": "e4"}),
    )
    .await;

    let snap = next_json(&mut alice_r).await;
    assert_eq!(snap["type"], "load_game");
    assert_eq!(snap["turn"], "black");
    assert_eq!(snap["lastMove"], "e2e4");
    assert_silent(&mut alice_r).await;

    let snap = next_json(&mut watch_r).await;
    assert_eq!(snap["type"], "load_game");
    let note = next_json(&mut watch_r).await;
    assert_eq!(note["type"], "notification");
    assert_eq!(note["message"], "alice (white) played e2e4");
}

#[tokio::test]
async fn ws_errors_go_only_to_sender() {
    let base = start_server().await;
    let id = seated_match(&base).await;

    let (_alice_w, mut alice_r) = ws_connect(&base, &id).await;
    let (mut bob_w, mut bob_r) = ws_connect(&base, &id).await;

    // Bob tries to move on White's turn.
    send(
        &mut bob_w,
        serde_json::json!({"type": "make_move", "player": "bob", "from": "e7", "to": "e5"}),
    )
    .await;

    let err = next_json(&mut bob_r).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["message"], "it is not bob's turn");
    assert_silent(&mut alice_r).await;
}

#[tokio::test]
async fn rest_move_broadcasts_to_all_clients() {
    let base = start_server().await;
    let id = seated_match(&base).await;

    let (_w1, mut r1) = ws_connect(&base, &id).await;
    let (_w2, mut r2) = ws_connect(&base, &id).await;

    rest_move(&base, &id, "alice", "d2", "d4").await;

    for read in [&mut r1, &mut r2] {
        let snap = next_json(read).await;
        assert_eq!(snap["type"], "load_game");
        assert_eq!(snap["moveCount"], 1);
        // Two seats taken, then one move.
        assert_eq!(snap["revision"], 3);
        let note = next_json(read).await;
        assert_eq!(note["message"], "alice (white) played d2d4");
    }
}

#[tokio::test]
async fn checkmate_is_announced() {
    let base = start_server().await;
    let id = seated_match(&base).await;
    let (_w, mut read) = ws_connect(&base, &id).await;

    for (player, from, to) in [("alice", "f2", "f3"), ("bob", "e7", "e5"), ("alice", "g2", "g4")] {
        rest_move(&base, &id, player, from, to).await;
        assert_eq!(next_json(&mut read).await["type"], "load_game");
        assert_eq!(next_json(&mut read).await["type"], "notification");
    }

    rest_move(&base, &id, "bob", "d8", "h4").await;
    let snap = next_json(&mut read).await;
    assert_eq!(snap["status"], "checkmate");
    assert_eq!(snap["winner"], "black");
    assert_eq!(next_json(&mut read).await["message"], "bob (black) played d8h4");
    assert_eq!(next_json(&mut read).await["message"], "checkmate, black wins");
}

#[tokio::test]
async fn check_is_announced() {
    let base = start_server().await;
    let id = seated_match(&base).await;
    let (_w, mut read) = ws_connect(&base, &id).await;

    for (player, from, to) in [("alice", "e2", "e4"), ("bob", "f7", "f6")] {
        rest_move(&base, &id, player, from, to).await;
        next_json(&mut read).await;
        next_json(&mut read).await;
    }

    rest_move(&base, &id, "alice", "d1", "h5").await;
    assert_eq!(next_json(&mut read).await["check"], true);
    next_json(&mut read).await;
    assert_eq!(next_json(&mut read).await["message"], "black is in check");
}

#[tokio::test]
async fn ws_join_and_resign() {
    let base = start_server().await;
    let body = post(&base, "/api/matches", serde_json::json!({})).await;
    let id = body["id"].as_str().unwrap().to_string();

    let (mut alice_w, mut alice_r) = ws_connect(&base, &id).await;
    let (mut carol_w, mut carol_r) = ws_connect(&base, &id).await;

    send(
        &mut alice_w,
        serde_json::json!({"type": "join", "player": "alice", "color": "white"}),
    )
    .await;
    let snap = next_json(&mut alice_r).await;
    assert_eq!(snap["players"]["white"], "alice");
    assert_eq!(next_json(&mut carol_r).await["type"], "load_game");
    assert_eq!(
        next_json(&mut carol_r).await["message"],
        "alice joined the match as white"
    );

    send(&mut carol_w, serde_json::json!({"type": "join", "player": "carol"})).await;
    assert_eq!(
        next_json(&mut alice_r).await["message"],
        "carol joined the match as an observer"
    );
    assert_silent(&mut carol_r).await;

    send(&mut alice_w, serde_json::json!({"type": "resign", "player": "alice"})).await;
    for read in [&mut alice_r, &mut carol_r] {
        let snap = next_json(read).await;
        assert_eq!(snap["status"], "resigned");
        assert_eq!(snap["winner"], "black");
        assert_eq!(next_json(read).await["message"], "alice resigned, black wins");
    }
}

#[tokio::test]
async fn ws_leave_frees_seat() {
    let base = start_server().await;
    let id = seated_match(&base).await;
    let (mut bob_w, mut bob_r) = ws_connect(&base, &id).await;
    let (_w, mut other_r) = ws_connect(&base, &id).await;

    send(&mut bob_w, serde_json::json!({"type": "leave", "player": "bob"})).await;
    let snap = next_json(&mut other_r).await;
    assert!(snap["players"]["black"].is_null());
    assert_eq!(next_json(&mut other_r).await["message"], "bob left the match");
    assert_eq!(next_json(&mut bob_r).await["type"], "load_game");
}

#[tokio::test]
async fn ping_returns_pong() {
    let base = start_server().await;
    let id = seated_match(&base).await;
    let (mut write, mut read) = ws_connect(&base, &id).await;

    send(&mut write, serde_json::json!({"type": "ping"})).await;
    let msg = next_json(&mut read).await;
    assert_eq!(msg["type"], "pong");
    assert!(msg["timestamp"].is_number());
}

#[tokio::test]
async fn matches_are_isolated() {
    let base = start_server().await;
    let first = seated_match(&base).await;
    let second = seated_match(&base).await;

    let (_w1, mut r1) = ws_connect(&base, &first).await;
    let (_w2, mut r2) = ws_connect(&base, &second).await;

    rest_move(&base, &first, "alice", "e2", "e4").await;

    assert_eq!(next_json(&mut r1).await["type"], "load_game");
    assert_silent(&mut r2).await;
}
