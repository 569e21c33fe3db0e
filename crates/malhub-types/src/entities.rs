//! The seven shared-state entities exchanged through the hub.
//!
//! Model and attack graph payloads are produced by `maltoolbox` and are
//! treated as opaque JSON objects. Everything else is a small typed record
//! tied to the simulation loop by its [`Iteration`].
//!
//! Each type's [`Default`] is the value the hub starts with and returns to
//! on reset.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// Externally-assigned step number of the simulation loop.
///
/// Signed because the hub uses `-1` to mean "nothing selected yet".
pub type Iteration = i64;

/// Identifier of an attack-graph node.
pub type NodeId = i64;

/// Current wall-clock time as fractional Unix seconds.
#[allow(clippy::cast_precision_loss)]
pub fn unix_time_now() -> f64 {
    // Microsecond timestamps stay well inside f64's exact integer range.
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

// ---------------------------------------------------------------------------
// Model and attack graph
// ---------------------------------------------------------------------------

/// A serialized MAL instance model, as produced by `Model._to_dict()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ModelSnapshot {
    /// Model-level metadata (name, language version, ...).
    #[ts(type = "Record<string, unknown>")]
    pub metadata: Map<String, Value>,
    /// Assets keyed by asset id.
    #[ts(type = "Record<string, unknown>")]
    pub assets: Map<String, Value>,
}

/// A serialized attack graph, as produced by `AttackGraph._to_dict()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AttackGraphSnapshot {
    /// Attack step descriptors keyed by attack step id.
    #[ts(type = "Record<string, unknown>")]
    pub attack_steps: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Performed node log
// ---------------------------------------------------------------------------

/// A node that was performed during an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PerformedNode {
    /// Iteration in which the node was performed.
    #[ts(type = "number")]
    pub iteration: Iteration,
    /// The performed node.
    #[ts(type = "number")]
    pub node_id: NodeId,
}

impl PerformedNode {
    /// Create a record for `node_id` performed in `iteration`.
    pub const fn new(iteration: Iteration, node_id: NodeId) -> Self {
        Self { iteration, node_id }
    }
}

// ---------------------------------------------------------------------------
// Latest attack steps
// ---------------------------------------------------------------------------

/// Alert logs of the attack steps active in the latest iteration.
///
/// Keys are iterations; JSON carries them as decimal strings. The initial
/// value maps iteration `0` to an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct LatestAttackSteps(
    /// Alert log descriptors keyed by iteration.
    #[ts(type = "Record<number, Array<unknown>>")]
    pub BTreeMap<Iteration, Vec<Value>>,
);

impl Default for LatestAttackSteps {
    fn default() -> Self {
        Self(BTreeMap::from([(0, Vec::new())]))
    }
}

impl LatestAttackSteps {
    /// Highest iteration present, if any.
    pub fn latest_iteration(&self) -> Option<Iteration> {
        self.0.keys().next_back().copied()
    }
}

// ---------------------------------------------------------------------------
// Defender suggestions
// ---------------------------------------------------------------------------

/// A defense step suggested by one defender agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DefenderSuggestion {
    /// Relative confidence of the suggesting agent.
    pub weight: f64,
    /// The action descriptor, opaque to the hub.
    #[ts(type = "Record<string, unknown>")]
    pub action: Map<String, Value>,
    /// Iteration the suggestion applies to.
    #[ts(type = "number")]
    pub iteration: Iteration,
    /// Unix seconds when the suggestion was uploaded. Filled in on
    /// arrival when the producer omits it.
    #[serde(default = "unix_time_now")]
    pub time_uploaded: f64,
}

/// Suggestions keyed by agent id, then by suggested node id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct DefenderSuggestions(
    /// Per-agent suggestion tables. Node ids travel as string keys.
    #[ts(as = "BTreeMap<String, BTreeMap<String, DefenderSuggestion>>")]
    pub BTreeMap<String, BTreeMap<NodeId, DefenderSuggestion>>,
);

impl DefenderSuggestions {
    /// Iterate every suggestion across all agents.
    pub fn iter_suggestions(&self) -> impl Iterator<Item = &DefenderSuggestion> {
        self.0.values().flat_map(BTreeMap::values)
    }
}

// ---------------------------------------------------------------------------
// Selected action and reward
// ---------------------------------------------------------------------------

/// The defender action chosen on the dashboard.
///
/// `node_id` is `None` when the defender chooses to do nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DefenderActionChoice {
    /// Iteration the choice applies to; `-1` before any choice.
    #[ts(type = "number")]
    pub iteration: Iteration,
    /// The chosen defense node.
    #[ts(type = "number | null")]
    pub node_id: Option<NodeId>,
}

impl Default for DefenderActionChoice {
    fn default() -> Self {
        Self {
            iteration: -1,
            node_id: None,
        }
    }
}

/// The reward for the latest iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RewardValue {
    /// Iteration the reward belongs to; `-1` before any reward.
    #[ts(type = "number")]
    pub iteration: Iteration,
    /// The reward signal.
    pub reward: f64,
}

impl Default for RewardValue {
    fn default() -> Self {
        Self {
            iteration: -1,
            reward: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_attack_steps_starts_with_iteration_zero() {
        let steps = LatestAttackSteps::default();
        assert_eq!(steps.0.len(), 1);
        assert_eq!(steps.0.get(&0).map(Vec::len), Some(0));
        assert_eq!(steps.latest_iteration(), Some(0));
    }

    #[test]
    fn latest_attack_steps_uses_string_keys_on_the_wire() {
        let json = r#"{"3": [{"step": "a"}], "1": []}"#;
        let steps: Result<LatestAttackSteps, _> = serde_json::from_str(json);
        assert!(steps.is_ok());
        let steps = steps.ok().unwrap_or_default();
        assert_eq!(steps.latest_iteration(), Some(3));

        let out = serde_json::to_value(&steps).ok().unwrap_or_default();
        assert!(out.get("1").is_some_and(Value::is_array));
        assert_eq!(out["3"][0]["step"], "a");
    }

    #[test]
    fn suggestion_without_upload_time_is_stamped() {
        let before = unix_time_now();
        let json = r#"{"weight": 0.5, "action": {}, "iteration": 2}"#;
        let parsed: Result<DefenderSuggestion, _> = serde_json::from_str(json);
        assert!(parsed.is_ok());
        let suggestion = parsed.ok();
        let uploaded = suggestion.map_or(0.0, |s| s.time_uploaded);
        assert!(uploaded >= before);
    }

    #[test]
    fn suggestion_keeps_explicit_upload_time() {
        let json = r#"{"weight": 1.0, "action": {"x": 1}, "iteration": 0, "time_uploaded": 12.5}"#;
        let parsed: Option<DefenderSuggestion> = serde_json::from_str(json).ok();
        assert_eq!(parsed.map(|s| s.time_uploaded), Some(12.5));
    }

    #[test]
    fn nested_suggestions_parse_integer_node_keys() {
        let json = r#"{"agent-1": {"17": {"weight": 0.1, "action": {}, "iteration": 4, "time_uploaded": 1.0}}}"#;
        let parsed: Option<DefenderSuggestions> = serde_json::from_str(json).ok();
        let parsed = parsed.unwrap_or_default();
        let agent = parsed.0.get("agent-1");
        assert!(agent.is_some_and(|table| table.contains_key(&17)));
        assert_eq!(parsed.iter_suggestions().count(), 1);
    }

    #[test]
    fn initial_selected_action_and_reward() {
        let action = DefenderActionChoice::default();
        assert_eq!(action.iteration, -1);
        assert_eq!(action.node_id, None);

        let json = serde_json::to_value(action).ok().unwrap_or_default();
        assert!(json["node_id"].is_null());

        let reward = RewardValue::default();
        assert_eq!(reward.iteration, -1);
        assert!(reward.reward.abs() < f64::EPSILON);
    }

    #[test]
    fn model_requires_both_maps() {
        let missing_assets: Result<ModelSnapshot, _> = serde_json::from_str(r#"{"metadata": {}}"#);
        assert!(missing_assets.is_err());

        let wrong_type: Result<ModelSnapshot, _> =
            serde_json::from_str(r#"{"metadata": [], "assets": {}}"#);
        assert!(wrong_type.is_err());
    }

    #[test]
    fn performed_node_rejects_non_integer_ids() {
        let parsed: Result<PerformedNode, _> =
            serde_json::from_str(r#"{"iteration": 1, "node_id": "seven"}"#);
        assert!(parsed.is_err());
    }
}
