//! Shared entity definitions for the MAL simulation exchange hub.
//!
//! The hub sits between a simulation driver and a monitoring dashboard.
//! Both sides exchange the seven entities defined here as JSON, and the
//! dashboard consumes the `TypeScript` bindings generated from them by
//! `ts-rs`.
//!
//! # Modules
//!
//! - [`entities`] -- The seven shared-state entities and their initial values
//! - [`kind`] -- [`EntityKind`] naming each entity for logs and notifications
//! - [`update`] -- Change notifications and the hub status summary

pub mod entities;
pub mod kind;
pub mod update;

pub use entities::{
    AttackGraphSnapshot, DefenderActionChoice, DefenderSuggestion, DefenderSuggestions,
    Iteration, LatestAttackSteps, ModelSnapshot, NodeId, PerformedNode, RewardValue,
    unix_time_now,
};
pub use kind::EntityKind;
pub use update::{HubStatus, HubUpdate, UpdateKind};
