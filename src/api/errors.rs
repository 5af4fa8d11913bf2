use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::engine::MoveError;
use crate::matches::MatchError;

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    MatchNotFound(String),
    InvalidRequest(String),
    InvalidMove(MoveError),
    MatchOver,
    NotAPlayer(String),
    NotYourTurn(String),
    SeatTaken(String),
    AlreadySeated { player: String, color: String },
    TooManyMatches(usize),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::MatchNotFound(id) => (
                StatusCode::NOT_FOUND,
                "MATCH_NOT_FOUND",
                format!("Match not found: {id}"),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::InvalidMove(err) => {
                (StatusCode::BAD_REQUEST, "INVALID_MOVE", err.to_string())
            }
            ApiError::MatchOver => (
                StatusCode::CONFLICT,
                "MATCH_OVER",
                "The match is already over".to_string(),
            ),
            ApiError::NotAPlayer(player) => (
                StatusCode::FORBIDDEN,
                "NOT_A_PLAYER",
                format!("{player} is not playing in this match"),
            ),
            ApiError::NotYourTurn(player) => (
                StatusCode::CONFLICT,
                "NOT_YOUR_TURN",
                format!("It is not {player}'s turn"),
            ),
            ApiError::SeatTaken(color) => (
                StatusCode::CONFLICT,
                "SEAT_TAKEN",
                format!("The {color} seat is already taken"),
            ),
            ApiError::AlreadySeated { player, color } => (
                StatusCode::CONFLICT,
                "ALREADY_SEATED",
                format!("{player} already plays {color} in this match"),
            ),
            ApiError::TooManyMatches(limit) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "TOO_MANY_MATCHES",
                format!("Match limit of {limit} reached"),
            ),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<MatchError> for ApiError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::MatchOver => ApiError::MatchOver,
            MatchError::NotAPlayer(p) => ApiError::NotAPlayer(p),
            MatchError::NotYourTurn(p) => ApiError::NotYourTurn(p),
            MatchError::SeatTaken(c) => ApiError::SeatTaken(c.to_string()),
            MatchError::AlreadySeated { player, color } => ApiError::AlreadySeated {
                player,
                color: color.to_string(),
            },
            MatchError::Move(e) => ApiError::InvalidMove(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Color, Square};
    use http_body_util::BodyExt;

    async fn error_to_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn match_not_found_returns_404() {
        let (status, json) = error_to_json(ApiError::MatchNotFound("abc".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "MATCH_NOT_FOUND");
    }

    #[tokio::test]
    async fn invalid_request_returns_400() {
        let (status, json) = error_to_json(ApiError::InvalidRequest("bad input".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "bad input");
    }

    #[tokio::test]
    async fn move_error_keeps_engine_message() {
        let sq = Square::from_algebraic("e4").unwrap();
        let api_err: ApiError = MatchError::Move(MoveError::NoPieceAtStart(sq)).into();
        let (status, json) = error_to_json(api_err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_MOVE");
        assert_eq!(json["error"]["message"], "no piece on e4");
    }

    #[tokio::test]
    async fn seat_and_turn_conflicts_return_409() {
        let (status, json) = error_to_json(MatchError::SeatTaken(Color::Black).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "SEAT_TAKEN");

        let (status, _) = error_to_json(MatchError::NotYourTurn("bob".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn not_a_player_returns_403() {
        let (status, json) = error_to_json(MatchError::NotAPlayer("eve".into()).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["error"]["code"], "NOT_A_PLAYER");
    }
}
