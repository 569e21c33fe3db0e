//! Error types for the hub's HTTP layer.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use malhub_core::HubError;
use tracing::warn;

/// Errors that can occur in the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The exchange service rejected the request.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The request body could not be read.
    #[error("unreadable body: {0}")]
    Body(String),
}

impl ObserverError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Hub(HubError::MalformedInput { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Hub(HubError::ConcurrentAccess { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidQuery(_) | Self::Body(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        warn!(status = status.as_u16(), error = %message, "request rejected");

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
