//! WebSocket connection manager: tracks live connections per match and
//! fans events out to them.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::{self, WsEvent};
use crate::api::models::MatchResponse;
use crate::matches::{MoveOutcome, Role};

/// Sending half of a client's event queue. The session owns the receiver.
pub type ClientSender = mpsc::UnboundedSender<WsEvent>;

/// A unique ID assigned to each connected WebSocket client.
pub type ClientId = u64;

#[derive(Debug)]
pub struct WsManager {
    /// match_id → { client_id → sender }
    subs: RwLock<HashMap<String, HashMap<ClientId, ClientSender>>>,
    next_id: AtomicU64,
}

impl WsManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new client for a match, returning (client_id, receiver).
    pub async fn subscribe(&self, match_id: &str) -> (ClientId, mpsc::UnboundedReceiver<WsEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut subs = self.subs.write().await;
        subs.entry(match_id.to_string()).or_default().insert(id, tx);

        debug!(match_id, client_id = id, "WS client subscribed");
        (id, rx)
    }

    pub async fn unsubscribe(&self, match_id: &str, client_id: ClientId) {
        let mut subs = self.subs.write().await;
        if let Some(clients) = subs.get_mut(match_id) {
            clients.remove(&client_id);
            if clients.is_empty() {
                subs.remove(match_id);
            }
        }
        debug!(match_id, client_id, "WS client unsubscribed");
    }

    /// Drop every subscriber of a match. Their sessions end once the
    /// queues drain.
    pub async fn close_match(&self, match_id: &str) -> usize {
        let removed = self.subs.write().await.remove(match_id);
        removed.map_or(0, |clients| clients.len())
    }

    /// Send an event to every subscriber of a match.
    pub async fn broadcast(&self, match_id: &str, event: WsEvent) {
        self.broadcast_except(match_id, None, event).await;
    }

    /// Send an event to every subscriber except `exclude`.
    pub async fn broadcast_except(
        &self,
        match_id: &str,
        exclude: Option<ClientId>,
        event: WsEvent,
    ) {
        let subs = self.subs.read().await;
        let Some(clients) = subs.get(match_id) else {
            return;
        };
        let mut stale: Vec<ClientId> = Vec::new();
        for (&cid, tx) in clients {
            if Some(cid) == exclude {
                continue;
            }
            if tx.send(event.clone()).is_err() {
                stale.push(cid);
            }
        }
        drop(subs);

        if !stale.is_empty() {
            self.remove_stale(match_id, &stale).await;
        }
    }

    /// Send an event to one client. Returns false if it is gone.
    pub async fn send_to(&self, match_id: &str, client_id: ClientId, event: WsEvent) -> bool {
        let subs = self.subs.read().await;
        let delivered = subs
            .get(match_id)
            .and_then(|clients| clients.get(&client_id))
            .is_some_and(|tx| tx.send(event).is_ok());
        drop(subs);

        if !delivered {
            self.remove_stale(match_id, &[client_id]).await;
        }
        delivered
    }

    async fn remove_stale(&self, match_id: &str, stale: &[ClientId]) {
        let mut subs = self.subs.write().await;
        if let Some(clients) = subs.get_mut(match_id) {
            for cid in stale {
                if clients.remove(cid).is_some() {
                    warn!(match_id, client_id = cid, "removed stale WS client");
                }
            }
            if clients.is_empty() {
                subs.remove(match_id);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Match events
    // -----------------------------------------------------------------------

    /// Fan out a committed move: the new snapshot to everyone, the move
    /// itself to everyone but the mover, then any check or game-end notice.
    pub async fn publish_move(
        &self,
        match_id: &str,
        snapshot: MatchResponse,
        player: &str,
        outcome: &MoveOutcome,
        mover: Option<ClientId>,
    ) {
        self.broadcast(match_id, WsEvent::load_game(snapshot)).await;
        self.broadcast_except(
            match_id,
            mover,
            WsEvent::notification(messages::move_message(player, outcome)),
        )
        .await;
        if let Some(text) = messages::status_message(outcome) {
            self.broadcast(match_id, WsEvent::notification(text)).await;
        }
    }

    /// Announce a seat taken or an observer arriving. Seat changes also
    /// push a fresh snapshot to everyone.
    pub async fn publish_join(
        &self,
        match_id: &str,
        snapshot: MatchResponse,
        player: &str,
        role: Role,
        joiner: Option<ClientId>,
    ) {
        if matches!(role, Role::Player(_)) {
            self.broadcast(match_id, WsEvent::load_game(snapshot)).await;
        }
        self.broadcast_except(
            match_id,
            joiner,
            WsEvent::notification(messages::joined_message(player, role)),
        )
        .await;
    }

    /// Snapshot plus a notice to everyone, used for resignations and seats
    /// being given up.
    pub async fn publish_update(&self, match_id: &str, snapshot: MatchResponse, text: String) {
        self.broadcast(match_id, WsEvent::load_game(snapshot)).await;
        self.broadcast(match_id, WsEvent::notification(text)).await;
    }

    pub async fn subscriber_count(&self, match_id: &str) -> usize {
        let subs = self.subs.read().await;
        subs.get(match_id).map_or(0, |c| c.len())
    }

    /// Total number of active connections across all matches.
    pub async fn total_connections(&self) -> usize {
        let subs = self.subs.read().await;
        subs.values().map(|c| c.len()).sum()
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self {
            subs: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
