//! WebSocket module: real-time match event streaming.
//!
//! - [`messages`]: Typed event/command envelopes and notification text.
//! - [`manager`]: Per-match connection tracking and fan-out.
//! - [`handler`]: Axum WebSocket upgrade handler and command dispatch.

pub mod handler;
pub mod manager;
pub mod messages;

pub use handler::ws_handler;
pub use manager::WsManager;
pub use messages::WsEvent;
