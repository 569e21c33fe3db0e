//! Change notifications and the status summary served to the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::entities::Iteration;
use crate::kind::EntityKind;

/// How an entity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum UpdateKind {
    /// The entity was overwritten with a new value.
    Replaced,
    /// Records were appended to the performed node log.
    Appended,
    /// Every entity was returned to its initial value.
    Reset,
}

/// Notification published after a write completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HubUpdate {
    /// The entity that changed; `None` for a reset, which touches all of them.
    pub entity: Option<EntityKind>,
    /// What kind of write happened.
    pub kind: UpdateKind,
    /// The highest iteration carried by the written value, when it has one.
    #[ts(type = "number | null")]
    pub iteration: Option<Iteration>,
    /// Number of records written (1 for a replace, 0 for a reset).
    #[ts(type = "number")]
    pub records: usize,
    /// When the write completed.
    pub at: DateTime<Utc>,
}

impl HubUpdate {
    /// An update for a full overwrite of `entity`.
    pub fn replaced(entity: EntityKind, iteration: Option<Iteration>) -> Self {
        Self {
            entity: Some(entity),
            kind: UpdateKind::Replaced,
            iteration,
            records: 1,
            at: Utc::now(),
        }
    }

    /// An update for `records` log entries appended up to `iteration`.
    pub fn appended(iteration: Option<Iteration>, records: usize) -> Self {
        Self {
            entity: Some(EntityKind::PerformedNodes),
            kind: UpdateKind::Appended,
            iteration,
            records,
            at: Utc::now(),
        }
    }

    /// An update for a full reset.
    pub fn reset() -> Self {
        Self {
            entity: None,
            kind: UpdateKind::Reset,
            iteration: None,
            records: 0,
            at: Utc::now(),
        }
    }
}

/// Summary of the hub's current contents, one field per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HubStatus {
    /// Number of assets in the model.
    #[ts(type = "number")]
    pub model_assets: usize,
    /// Number of attack steps in the attack graph.
    #[ts(type = "number")]
    pub attack_steps: usize,
    /// Number of records in the performed node log.
    #[ts(type = "number")]
    pub performed_nodes: usize,
    /// Highest iteration in the performed node log.
    #[ts(type = "number | null")]
    pub latest_performed_iteration: Option<Iteration>,
    /// Highest iteration key of the latest attack steps.
    #[ts(type = "number | null")]
    pub latest_attack_step_iteration: Option<Iteration>,
    /// Number of agents with suggestions.
    #[ts(type = "number")]
    pub suggestion_agents: usize,
    /// Total suggestions across all agents.
    #[ts(type = "number")]
    pub suggestions: usize,
    /// Iteration of the selected defender action.
    #[ts(type = "number")]
    pub selected_action_iteration: Iteration,
    /// Iteration of the reward value.
    #[ts(type = "number")]
    pub reward_iteration: Iteration,
}
