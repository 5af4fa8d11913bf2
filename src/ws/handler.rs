//! WebSocket upgrade handler: connects a client to a match's live event
//! stream and runs its commands against the match store.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

use crate::api::models::{match_to_response, parse_color, parse_move};
use crate::api::state::SharedState;
use crate::matches::MatchError;

use super::manager::ClientId;
use super::messages::{self, WsCommand, WsEvent};

/// GET /ws/matches/{id}: upgrade to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, id, state))
}

async fn handle_socket(socket: WebSocket, match_id: String, state: SharedState) {
    let initial_event = {
        let matches = state.matches.read().await;
        match matches.get(&match_id) {
            Some(m) => WsEvent::load_game(match_to_response(m)),
            None => {
                let (mut sink, _) = socket.split();
                let err = WsEvent::error(format!("match not found: {match_id}"));
                let _ = sink.send(Message::Text(err.to_json().into())).await;
                let _ = sink.close().await;
                return;
            }
        }
    };

    let (client_id, mut rx) = state.ws.subscribe(&match_id).await;
    let (mut sink, mut stream) = socket.split();
    let watchers = state.ws.subscriber_count(&match_id).await;
    info!(match_id, client_id, watchers, "WS client connected");

    if sink
        .send(Message::Text(initial_event.to_json().into()))
        .await
        .is_err()
    {
        cleanup(&state, &match_id, client_id).await;
        return;
    }

    // Writer task: manager queue → WS sink.
    let mut writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if sink
                .send(Message::Text(event.to_json().into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader task: client commands.
    let reader_state = state.clone();
    let reader_mid = match_id.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_message(&reader_state, &reader_mid, client_id, &text).await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut writer => { reader.abort(); }
        _ = &mut reader => { writer.abort(); }
    }

    cleanup(&state, &match_id, client_id).await;
}

/// Parse and run one client message. Failures go back to the sender only.
async fn handle_client_message(state: &SharedState, match_id: &str, client_id: ClientId, text: &str) {
    let cmd = match serde_json::from_str::<WsCommand>(text) {
        Ok(c) => c,
        Err(e) => {
            debug!(match_id, client_id, "invalid WS command: {e}");
            reply(state, match_id, client_id, WsEvent::error(format!("invalid command: {e}"))).await;
            return;
        }
    };

    if let Err(message) = run_command(state, match_id, client_id, cmd).await {
        reply(state, match_id, client_id, WsEvent::error(message)).await;
    }
}

async fn run_command(
    state: &SharedState,
    match_id: &str,
    client_id: ClientId,
    cmd: WsCommand,
) -> Result<(), String> {
    match cmd {
        WsCommand::Ping => {
            reply(state, match_id, client_id, WsEvent::pong()).await;
        }
        WsCommand::Join { player, color } => {
            let color = color.as_deref().map(parse_color).transpose()?;
            let (role, snapshot) = with_match(state, match_id, |m| {
                let role = m.join(&player, color)?;
                Ok((role, match_to_response(m)))
            })
            .await?;
            state
                .ws
                .publish_join(match_id, snapshot, &player, role, Some(client_id))
                .await;
        }
        WsCommand::MakeMove {
            player,
            from,
            to,
            promotion,
        } => {
            let mv = parse_move(&from, &to, promotion.as_deref())?;
            let (outcome, snapshot) = with_match(state, match_id, |m| {
                let outcome = m.play(&player, mv)?;
                Ok((outcome, match_to_response(m)))
            })
            .await?;
            state
                .ws
                .publish_move(match_id, snapshot, &player, &outcome, Some(client_id))
                .await;
        }
        WsCommand::Resign { player } => {
            let (text, snapshot) = with_match(state, match_id, |m| {
                m.resign(&player)?;
                Ok((
                    messages::resigned_message(&player, m.status()),
                    match_to_response(m),
                ))
            })
            .await?;
            state.ws.publish_update(match_id, snapshot, text).await;
        }
        WsCommand::Leave { player } => {
            let (freed, snapshot) = with_match(state, match_id, |m| {
                let freed = m.leave(&player);
                Ok((freed, match_to_response(m)))
            })
            .await?;
            if freed.is_some() {
                state
                    .ws
                    .publish_update(match_id, snapshot, messages::left_message(&player))
                    .await;
            } else {
                state
                    .ws
                    .broadcast_except(
                        match_id,
                        Some(client_id),
                        WsEvent::notification(messages::left_message(&player)),
                    )
                    .await;
            }
        }
    }
    Ok(())
}

/// Run `f` against the match under the store's write lock.
async fn with_match<T>(
    state: &SharedState,
    match_id: &str,
    f: impl FnOnce(&mut crate::matches::Match) -> Result<T, MatchError>,
) -> Result<T, String> {
    let mut matches = state.matches.write().await;
    let m = matches
        .get_mut(match_id)
        .ok_or_else(|| format!("match not found: {match_id}"))?;
    f(m).map_err(|e| e.to_string())
}

async fn reply(state: &SharedState, match_id: &str, client_id: ClientId, event: WsEvent) {
    state.ws.send_to(match_id, client_id, event).await;
}

async fn cleanup(state: &SharedState, match_id: &str, client_id: ClientId) {
    state.ws.unsubscribe(match_id, client_id).await;
    debug!(match_id, client_id, "WS session cleaned up");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::AppState;
    use crate::config::AppConfig;
    use crate::matches::Match;
    use crate::ws::messages::WsEventType;

    async fn state_with_match() -> (SharedState, String) {
        let state = AppState::new(AppConfig::default());
        let m = Match::new("friendly");
        let id = m.id.clone();
        state.matches.write().await.insert(id.clone(), m);
        (state, id)
    }

    #[tokio::test]
    async fn handler_type_check() {
        fn assert_handler<F, Fut, R>(_: F)
        where
            F: FnOnce(WebSocketUpgrade, Path<String>, State<SharedState>) -> Fut,
            Fut: std::future::Future<Output = R>,
            R: IntoResponse,
        {
        }
        assert_handler(ws_handler);
    }

    #[tokio::test]
    async fn errors_go_only_to_sender() {
        let (state, id) = state_with_match().await;
        let (me, mut my_rx) = state.ws.subscribe(&id).await;
        let (_other, mut other_rx) = state.ws.subscribe(&id).await;

        handle_client_message(&state, &id, me, r#"{"type":"make_move","player":"x","from":"e2","to":"e4"}"#)
            .await;

        assert_eq!(my_rx.recv().await.unwrap().event_type, WsEventType::Error);
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn garbage_is_reported_to_sender() {
        let (state, id) = state_with_match().await;
        let (me, mut my_rx) = state.ws.subscribe(&id).await;
        handle_client_message(&state, &id, me, "not json").await;
        assert_eq!(my_rx.recv().await.unwrap().event_type, WsEventType::Error);
    }

    #[tokio::test]
    async fn move_skips_mover_notification() {
        let (state, id) = state_with_match().await;
        let (alice, mut alice_rx) = state.ws.subscribe(&id).await;
        let (_watcher, mut watcher_rx) = state.ws.subscribe(&id).await;

        handle_client_message(&state, &id, alice, r#"{"type":"join","player":"alice","color":"white"}"#)
            .await;
        // Seat change: snapshot for everyone, notice for the others.
        assert_eq!(alice_rx.recv().await.unwrap().event_type, WsEventType::LoadGame);
        assert_eq!(watcher_rx.recv().await.unwrap().event_type, WsEventType::LoadGame);
        assert_eq!(
            watcher_rx.recv().await.unwrap().event_type,
            WsEventType::Notification
        );

        handle_client_message(
            &state,
            &id,
            alice,
            r#"{"type":"make_move","player":"alice","from":"e2","to":"e4"}"#,
        )
        .await;

        assert_eq!(alice_rx.recv().await.unwrap().event_type, WsEventType::LoadGame);
        assert!(alice_rx.try_recv().is_err());
        assert_eq!(watcher_rx.recv().await.unwrap().event_type, WsEventType::LoadGame);
        let note = watcher_rx.recv().await.unwrap();
        assert!(note.to_json().contains("alice (white) played e2e4"));
    }

    #[tokio::test]
    async fn ping_gets_pong() {
        let (state, id) = state_with_match().await;
        let (me, mut rx) = state.ws.subscribe(&id).await;
        handle_client_message(&state, &id, me, r#"{"type":"ping"}"#).await;
        assert_eq!(rx.recv().await.unwrap().event_type, WsEventType::Pong);
    }
}
