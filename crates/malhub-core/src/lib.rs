//! Shared-state exchange hub for the MAL simulation driver and dashboard.
//!
//! The driver publishes model, attack graph, alert and suggestion state
//! per iteration; the dashboard polls it and publishes back the chosen
//! defender action and reward. This crate is the single point of truth
//! both sides read and write.
//!
//! # Architecture
//!
//! - [`store::EntityStore`] holds the seven entities, each behind its own
//!   lock, plus a reset gate that makes [`reset_all`] atomic across them.
//! - [`query`] filters the performed node log by iteration.
//! - [`service::ExchangeService`] is the operation surface the transport
//!   calls: one get/set pair per entity, an append for the log, and reset.
//!   It validates input shape and publishes a [`HubUpdate`] per write.
//!
//! The hub performs no simulation logic and no cross-entity validation.
//!
//! [`reset_all`]: store::EntityStore::reset_all
//! [`HubUpdate`]: malhub_types::HubUpdate

pub mod config;
pub mod error;
pub mod query;
pub mod service;
pub mod store;

pub use config::StoreConfig;
pub use error::HubError;
pub use query::PerformedNodeFilter;
pub use service::ExchangeService;
pub use store::{EntityStore, StoreSnapshot};
