//! Shared application state for the hub's HTTP server.

use malhub_core::ExchangeService;
use malhub_types::HubUpdate;
use tokio::sync::broadcast;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. All entity state lives in the [`ExchangeService`]; this
/// type only hands it to the handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The exchange service every handler calls into.
    pub hub: ExchangeService,
}

impl AppState {
    /// Create application state around an existing service.
    pub const fn new(hub: ExchangeService) -> Self {
        Self { hub }
    }

    /// Subscribe to the update channel.
    ///
    /// Returns a receiver that yields a [`HubUpdate`] for every write the
    /// service completes.
    pub fn subscribe(&self) -> broadcast::Receiver<HubUpdate> {
        self.hub.subscribe()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ExchangeService::default())
    }
}
