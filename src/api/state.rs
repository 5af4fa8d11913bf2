use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::matches::Match;
use crate::ws::WsManager;

/// Matches stored by UUID.
pub type MatchStore = RwLock<HashMap<String, Match>>;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    pub matches: MatchStore,
    pub ws: Arc<WsManager>,
    pub config: AppConfig,
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(AppState {
            matches: RwLock::new(HashMap::new()),
            ws: WsManager::new(),
            config,
            start_time: std::time::Instant::now(),
        })
    }
}
