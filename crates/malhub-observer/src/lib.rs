//! HTTP transport for the MAL simulation exchange hub.
//!
//! This crate maps the hub's operations onto an Axum server:
//!
//! - **Entity routes** (`/model`, `/attack_graph`, `/performed_nodes`,
//!   `/latest_attack_steps`, `/defender_suggestions`, `/defender_action`,
//!   `/reward_value`): `GET` returns the current value as JSON, `POST`
//!   replaces it (or appends, for performed nodes) and answers `success`
//! - **`POST /reset`** returning every entity to its initial value
//! - **`WebSocket` endpoint** (`/ws/updates`) pushing a notification after
//!   every write via [`tokio::sync::broadcast`]
//! - **Status** as JSON (`/api/status`) and as a minimal HTML page (`/`)
//!
//! # Architecture
//!
//! Handlers hold no state of their own. Each request becomes exactly one
//! [`ExchangeService`] call, which owns all locking, so a request body is
//! applied whole or not at all. Bodies are decoded before the service is
//! called; a shape mismatch is answered with `422` and writes nothing.
//!
//! [`ExchangeService`]: malhub_core::ExchangeService

pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
