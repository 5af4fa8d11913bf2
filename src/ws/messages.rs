//! WebSocket message types for live match events.

use serde::{Deserialize, Serialize};

use crate::api::models::MatchResponse;
use crate::matches::{MatchStatus, MoveOutcome, Role};

// ---------------------------------------------------------------------------
// Server → Client events
// ---------------------------------------------------------------------------

/// Envelope sent from server to WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WsEvent {
    /// Discriminator so clients can switch on event type.
    #[serde(rename = "type")]
    pub event_type: WsEventType,
    #[serde(flatten)]
    pub payload: WsPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WsEventType {
    LoadGame,
    Notification,
    Error,
    Pong,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WsPayload {
    LoadGame(Box<MatchResponse>),
    Message(MessagePayload),
    Pong(PongPayload),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PongPayload {
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Client → Server commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsCommand {
    Join {
        player: String,
        color: Option<String>,
    },
    MakeMove {
        player: String,
        from: String,
        to: String,
        promotion: Option<String>,
    },
    Resign {
        player: String,
    },
    Leave {
        player: String,
    },
    Ping,
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

impl WsEvent {
    /// Full match snapshot; clients redraw from it.
    pub fn load_game(snapshot: MatchResponse) -> Self {
        WsEvent {
            event_type: WsEventType::LoadGame,
            payload: WsPayload::LoadGame(Box::new(snapshot)),
        }
    }

    pub fn notification(message: impl Into<String>) -> Self {
        WsEvent {
            event_type: WsEventType::Notification,
            payload: WsPayload::Message(MessagePayload {
                message: message.into(),
            }),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        WsEvent {
            event_type: WsEventType::Error,
            payload: WsPayload::Message(MessagePayload {
                message: message.into(),
            }),
        }
    }

    pub fn pong() -> Self {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        WsEvent {
            event_type: WsEventType::Pong,
            payload: WsPayload::Pong(PongPayload { timestamp: ts }),
        }
    }

    /// Serialize to JSON text for sending over WebSocket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","message":"serialization failed"}"#.to_string())
    }
}

// ---------------------------------------------------------------------------
// Notification text
// ---------------------------------------------------------------------------

pub fn joined_message(player: &str, role: Role) -> String {
    format!("{player} joined the match as {role}")
}

pub fn left_message(player: &str) -> String {
    format!("{player} left the match")
}

pub fn resigned_message(player: &str, status: MatchStatus) -> String {
    match status.winner() {
        Some(winner) => format!("{player} resigned, {winner} wins"),
        None => format!("{player} resigned"),
    }
}

pub fn move_message(player: &str, outcome: &MoveOutcome) -> String {
    format!("{player} ({}) played {}", outcome.mover, outcome.mv)
}

/// Check, checkmate or stalemate announcement following a move.
pub fn status_message(outcome: &MoveOutcome) -> Option<String> {
    match outcome.status {
        MatchStatus::Checkmate { winner } => Some(format!("checkmate, {winner} wins")),
        MatchStatus::Stalemate => Some("stalemate, the game is drawn".to_string()),
        _ if outcome.opponent_in_check => Some(format!("{} is in check", !outcome.mover)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
