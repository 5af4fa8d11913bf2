use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::info;

use crate::matches::Match;
use crate::ws::messages;

use super::errors::ApiError;
use super::models::*;
use super::state::SharedState;

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let matches = state.matches.read().await.len();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        matches,
        connections: state.ws.total_connections().await,
    })
}

// =========================================================================
// Create / list / get / delete
// =========================================================================

/// POST /api/matches
pub async fn create_match(
    State(state): State<SharedState>,
    Json(input): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), ApiError> {
    let mut matches = state.matches.write().await;
    if matches.len() >= state.config.max_matches {
        return Err(ApiError::TooManyMatches(state.config.max_matches));
    }

    let m = Match::new(input.name.unwrap_or_else(|| "Match".into()));
    let response = match_to_response(&m);
    info!(match_id = %m.id, name = %m.name, "match created");
    matches.insert(m.id.clone(), m);

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/matches
pub async fn list_matches(State(state): State<SharedState>) -> Json<ListMatchesResponse> {
    let matches = state.matches.read().await;
    let mut all: Vec<&Match> = matches.values().collect();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Json(ListMatchesResponse {
        total: all.len(),
        matches: all.into_iter().map(match_to_response).collect(),
    })
}

/// GET /api/matches/:id
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<MatchResponse>, ApiError> {
    let matches = state.matches.read().await;
    let m = matches
        .get(&id)
        .ok_or_else(|| ApiError::MatchNotFound(id.clone()))?;
    Ok(Json(match_to_response(m)))
}

/// DELETE /api/matches/:id
pub async fn delete_match(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .matches
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| ApiError::MatchNotFound(id.clone()))?;

    let dropped = state.ws.close_match(&id).await;
    info!(match_id = %id, dropped, "match deleted");
    Ok(Json(DeleteResponse {
        success: true,
        message: "Match deleted".to_string(),
    }))
}

// =========================================================================
// Seats
// =========================================================================

/// POST /api/matches/:id/join
pub async fn join_match(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let color = input
        .color
        .as_deref()
        .map(parse_color)
        .transpose()
        .map_err(ApiError::InvalidRequest)?;

    let mut matches = state.matches.write().await;
    let m = matches
        .get_mut(&id)
        .ok_or_else(|| ApiError::MatchNotFound(id.clone()))?;
    let role = m.join(&input.player, color)?;
    let snapshot = match_to_response(m);
    drop(matches);

    state
        .ws
        .publish_join(&id, snapshot.clone(), &input.player, role, None)
        .await;

    Ok(Json(JoinResponse {
        role: role_name(role),
        snapshot,
    }))
}

// =========================================================================
// Legal moves
// =========================================================================

/// GET /api/matches/:id/legal-moves
///
/// Without `from`, lists every legal move for the side to move.
pub async fn legal_moves(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<LegalMovesQuery>,
) -> Result<Json<LegalMovesResponse>, ApiError> {
    let matches = state.matches.read().await;
    let m = matches
        .get(&id)
        .ok_or_else(|| ApiError::MatchNotFound(id.clone()))?;

    let moves = match query.from.as_deref() {
        _ if m.status().is_over() => Vec::new(),
        Some(from) => {
            let sq = parse_square(from).map_err(ApiError::InvalidRequest)?;
            m.game().valid_moves(sq).unwrap_or_default()
        }
        None => m.game().legal_moves(),
    };

    Ok(Json(LegalMovesResponse {
        moves: moves.iter().map(legal_move_entry).collect(),
    }))
}

// =========================================================================
// Make move / resign
// =========================================================================

/// POST /api/matches/:id/moves
pub async fn make_move(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<MoveRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    let mv = parse_move(&input.from, &input.to, input.promotion.as_deref())
        .map_err(ApiError::InvalidRequest)?;

    let mut matches = state.matches.write().await;
    let m = matches
        .get_mut(&id)
        .ok_or_else(|| ApiError::MatchNotFound(id.clone()))?;
    let outcome = m.play(&input.player, mv)?;
    let snapshot = match_to_response(m);
    drop(matches); // release write lock before broadcasting

    state
        .ws
        .publish_move(&id, snapshot.clone(), &input.player, &outcome, None)
        .await;

    Ok(Json(snapshot))
}

/// POST /api/matches/:id/resign
pub async fn resign(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(input): Json<ResignRequest>,
) -> Result<Json<MatchResponse>, ApiError> {
    let mut matches = state.matches.write().await;
    let m = matches
        .get_mut(&id)
        .ok_or_else(|| ApiError::MatchNotFound(id.clone()))?;
    m.resign(&input.player)?;
    let text = messages::resigned_message(&input.player, m.status());
    let snapshot = match_to_response(m);
    drop(matches);

    state.ws.publish_update(&id, snapshot.clone(), text).await;
    Ok(Json(snapshot))
}

// =========================================================================
// Tests
// =========================================================================
