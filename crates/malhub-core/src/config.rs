//! Store configuration.
//!
//! Deserialized from the `store` section of the hub's YAML config file.
//! Every field has a default so an empty section is valid.

use std::time::Duration;

use serde::Deserialize;

/// Tuning for the [`EntityStore`](crate::store::EntityStore).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Upper bound in milliseconds on waiting for any entity guard.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Keep only the newest N performed node records. `None` keeps the
    /// whole log for the life of the process.
    #[serde(default)]
    pub performed_nodes_retention: Option<usize>,
}

impl StoreConfig {
    /// The guard timeout as a [`Duration`].
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            performed_nodes_retention: None,
        }
    }
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}
