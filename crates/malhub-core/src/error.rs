//! Error types for the exchange hub.
//!
//! The taxonomy is intentionally small: the hub performs no business
//! validation, so a request either has the wrong shape or could not get
//! at the entity in time.

use std::time::Duration;

use malhub_types::EntityKind;

/// Errors returned by the entity store and exchange service.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The input does not match the entity's shape. Nothing was written.
    #[error("malformed {entity} input: {reason}")]
    MalformedInput {
        /// The entity the input was meant for.
        entity: EntityKind,
        /// What is wrong with the input.
        reason: String,
    },

    /// An entity guard could not be acquired within the configured timeout.
    ///
    /// Fatal to the single request only.
    #[error("timed out after {waited:?} waiting for {}", .entity.map_or("reset gate", EntityKind::as_str))]
    ConcurrentAccess {
        /// The entity whose guard was contended, or `None` for the reset gate.
        entity: Option<EntityKind>,
        /// How long the request waited.
        waited: Duration,
        /// The expired timer.
        #[source]
        source: tokio::time::error::Elapsed,
    },
}

impl HubError {
    /// Build a [`HubError::MalformedInput`] for `entity`.
    pub fn malformed(entity: EntityKind, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            entity,
            reason: reason.into(),
        }
    }

    /// Build a [`HubError::MalformedInput`] from a JSON decoding failure.
    pub fn from_json(entity: EntityKind, source: &serde_json::Error) -> Self {
        Self::malformed(entity, source.to_string())
    }
}
