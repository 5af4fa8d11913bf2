//! REST surface over the in-memory match store.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
