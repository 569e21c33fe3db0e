//! Axum router construction for the hub.
//!
//! Assembles all routes (entities + status + `WebSocket`) into a single
//! [`Router`] with CORS middleware enabled so the dashboard can be served
//! from any origin.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the hub.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /api/status` -- per-entity summary
/// - `GET /ws/updates` -- `WebSocket` update stream
/// - `GET|POST` for each of the seven entity routes
/// - `POST /reset` -- reset every entity
///
/// CORS allows any origin, method and header. Request bodies are not
/// size-capped: full models and attack graphs run well past Axum's
/// default 2 MB limit.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status
        .route("/", get(handlers::index))
        .route("/api/status", get(handlers::get_status))
        // WebSocket
        .route("/ws/updates", get(ws::ws_updates))
        // Entities
        .route(
            "/model",
            get(handlers::get_model).post(handlers::post_model),
        )
        .route(
            "/attack_graph",
            get(handlers::get_attack_graph).post(handlers::post_attack_graph),
        )
        .route(
            "/performed_nodes",
            get(handlers::get_performed_nodes).post(handlers::post_performed_nodes),
        )
        .route(
            "/latest_attack_steps",
            get(handlers::get_latest_attack_steps).post(handlers::post_latest_attack_steps),
        )
        .route(
            "/defender_suggestions",
            get(handlers::get_defender_suggestions).post(handlers::post_defender_suggestions),
        )
        .route(
            "/defender_action",
            get(handlers::get_defender_action).post(handlers::post_defender_action),
        )
        .route(
            "/reward_value",
            get(handlers::get_reward_value).post(handlers::post_reward_value),
        )
        .route("/reset", post(handlers::post_reset))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
