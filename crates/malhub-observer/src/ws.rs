//! `WebSocket` handler for real-time hub update streaming.
//!
//! Clients connect to `GET /ws/updates` and receive a JSON-encoded
//! [`HubUpdate`] each time a write completes,
//! so the dashboard can refetch only what changed instead of polling.
//!
//! If a client falls behind, lagged messages are skipped and the client
//! resumes from the most recent update.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use malhub_types::HubUpdate;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming updates.
///
/// # Route
///
/// `GET /ws/updates`
pub async fn ws_updates(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Why a client's stream ended.
#[derive(Debug, Clone, Copy)]
enum StreamEnd {
    ClientLeft,
    SendFailed,
    ChannelClosed,
}

/// Forward each update as a text frame until the client goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.subscribe();
    debug!("update stream opened");

    let end = loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(update) => {
                    if let Err(end) = send_update(&mut socket, &update).await {
                        break end;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "update stream lagged, resuming from newest");
                }
                Err(RecvError::Closed) => break StreamEnd::ChannelClosed,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(payload))) => {
                    if socket.send(Message::Pong(payload)).await.is_err() {
                        break StreamEnd::SendFailed;
                    }
                }
                Some(Ok(Message::Close(_)) | Err(_)) | None => break StreamEnd::ClientLeft,
                // Text, binary and pong frames from clients are ignored.
                Some(Ok(_)) => {}
            },
        }
    };

    debug!(?end, "update stream closed");
}

/// Send one [`HubUpdate`] to the client as JSON text.
///
/// An update that fails to serialize is logged and dropped; the stream
/// stays open for the next one.
async fn send_update(socket: &mut WebSocket, update: &HubUpdate) -> Result<(), StreamEnd> {
    let json = match serde_json::to_string(update) {
        Ok(json) => json,
        Err(e) => {
            warn!(entity = ?update.entity, kind = ?update.kind, "dropping unserializable update: {e}");
            return Ok(());
        }
    };
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_e| StreamEnd::SendFailed)
}
