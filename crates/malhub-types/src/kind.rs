//! Names for the seven entities held by the hub.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One of the seven top-level pieces of shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// The serialized MAL instance model.
    Model,
    /// The serialized attack graph.
    AttackGraph,
    /// The append-only log of performed nodes.
    PerformedNodes,
    /// Alert logs for the attack steps active in the latest iteration.
    LatestAttackSteps,
    /// Defender action candidates grouped by agent.
    DefenderSuggestions,
    /// The defender action chosen on the dashboard.
    SelectedAction,
    /// The reward signal for the latest iteration.
    RewardValue,
}

impl EntityKind {
    /// Every entity, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Model,
        Self::AttackGraph,
        Self::PerformedNodes,
        Self::LatestAttackSteps,
        Self::DefenderSuggestions,
        Self::SelectedAction,
        Self::RewardValue,
    ];

    /// The `snake_case` name used on the wire and in log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::AttackGraph => "attack_graph",
            Self::PerformedNodes => "performed_nodes",
            Self::LatestAttackSteps => "latest_attack_steps",
            Self::DefenderSuggestions => "defender_suggestions",
            Self::SelectedAction => "selected_action",
            Self::RewardValue => "reward_value",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
