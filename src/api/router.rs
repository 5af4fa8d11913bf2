use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::SharedState;
use crate::ws;

/// Build the Axum router with all routes and middleware.
pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Match lifecycle
        .route(
            "/api/matches",
            post(handlers::create_match).get(handlers::list_matches),
        )
        .route(
            "/api/matches/{id}",
            get(handlers::get_match).delete(handlers::delete_match),
        )
        .route("/api/matches/{id}/join", post(handlers::join_match))
        // Play
        .route("/api/matches/{id}/legal-moves", get(handlers::legal_moves))
        .route("/api/matches/{id}/moves", post(handlers::make_move))
        .route("/api/matches/{id}/resign", post(handlers::resign))
        // WebSocket: live match events
        .route("/ws/matches/{id}", get(ws::ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
