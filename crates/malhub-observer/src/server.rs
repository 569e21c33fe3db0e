//! Hub HTTP server lifecycle management.
//!
//! Provides [`start_server`] which binds to a TCP port and serves the
//! router until the supplied shutdown future resolves.

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Configuration for the hub's HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,
    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Bind a TCP listener on the configured host and port.
    ///
    /// The host may be an IP literal or a name such as `localhost`;
    /// names are resolved and the first address that binds is used.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the host does not resolve or no
    /// resolved address can be bound.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                ServerError::Bind(format!("bind failed on {}:{}: {e}", self.host, self.port))
            })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8888
}

/// Start the hub's HTTP server.
///
/// Binds to the configured address, builds the router, and serves
/// requests until `shutdown` resolves. In-flight requests are allowed to
/// finish before this returns.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let router = build_router(state);

    let listener = config.bind().await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    info!(%addr, "hub server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("hub server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the hub's HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_all_interfaces_at_8888() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8888);
    }

    #[tokio::test]
    async fn binds_a_host_name() {
        let config = ServerConfig {
            host: String::from("localhost"),
            port: 0,
        };
        let addr = config.bind().await.and_then(|listener| {
            listener
                .local_addr()
                .map_err(|e| ServerError::Bind(e.to_string()))
        });
        assert!(addr.is_ok_and(|a| a.ip().is_loopback() && a.port() != 0));
    }

    #[tokio::test]
    async fn unresolvable_host_is_a_bind_error() {
        let config = ServerConfig {
            host: String::from("not a host"),
            port: 0,
        };
        assert!(matches!(config.bind().await, Err(ServerError::Bind(_))));
    }
}
