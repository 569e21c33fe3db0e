//! Exchange hub binary for the MAL simulation.
//!
//! Serves the shared state that the simulation driver and the monitoring
//! dashboard exchange each iteration.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `malhub-config.yaml` (or `MALHUB_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the entity store and exchange service
//! 4. Serve the HTTP API until `Ctrl-C` or `SIGTERM`

mod config;
mod error;

use std::sync::Arc;

use malhub_core::ExchangeService;
use malhub_observer::{AppState, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{HubConfig, LogFormat, LoggingConfig};
use crate::error::AppError;

/// Application entry point for the hub.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the server
/// cannot bind.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration.
    let config = HubConfig::load()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!(
        host = config.server.host,
        port = config.server.port,
        lock_timeout_ms = config.store.lock_timeout_ms,
        retention = ?config.store.performed_nodes_retention,
        "malhub-server starting"
    );

    // 3. Create the store and service.
    let hub = ExchangeService::from_config(&config.store);
    let state = Arc::new(AppState::new(hub));

    // 4. Serve until asked to stop.
    start_server(&config.server, state, shutdown_signal()).await?;

    info!("malhub-server shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(logging: &LoggingConfig) -> Result<(), AppError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = match logging.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| AppError::Logging {
        message: e.to_string(),
    })
}

/// Resolve when the process receives `Ctrl-C` or, on Unix, `SIGTERM`.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
}
