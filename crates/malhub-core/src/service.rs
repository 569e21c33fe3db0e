//! The exchange service: the operation surface transports call into.
//!
//! One get/set pair per entity, an append for the performed node log, a
//! reset, and a status summary. Every `set` is a total overwrite and is
//! visible to any call that starts after it returns.
//!
//! After each successful write a [`HubUpdate`] is published on a
//! broadcast channel so transports can push changes instead of having
//! clients poll. Publishing happens after the entity guard is released
//! and never blocks, so two concurrent writes to one entity may announce
//! in the opposite order from the one they landed in. An update says
//! *that* an entity changed; subscribers refetch it for the current
//! value instead of trusting [`HubUpdate::iteration`].
//!
//! No operation checks one entity against another. A selected action may
//! name an iteration that has no suggestions, and iterations may arrive
//! out of order or repeated.

use std::sync::Arc;

use malhub_types::{
    AttackGraphSnapshot, DefenderActionChoice, DefenderSuggestions, EntityKind, HubStatus,
    HubUpdate, LatestAttackSteps, ModelSnapshot, PerformedNode, RewardValue,
};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::HubError;
use crate::query::{self, PerformedNodeFilter};
use crate::store::EntityStore;

/// Capacity of the update broadcast channel.
///
/// A subscriber that falls further behind than this receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest update.
const UPDATE_CAPACITY: usize = 256;

/// Decode a JSON request body into an entity value.
///
/// Shape mismatches become [`HubError::MalformedInput`] for `entity`.
pub fn decode<T: DeserializeOwned>(entity: EntityKind, body: &[u8]) -> Result<T, HubError> {
    serde_json::from_slice(body).map_err(|e| HubError::from_json(entity, &e))
}

/// Operation surface over a shared [`EntityStore`].
///
/// Cheap to clone; clones share the store and the update channel.
#[derive(Debug, Clone)]
pub struct ExchangeService {
    store: Arc<EntityStore>,
    updates: broadcast::Sender<HubUpdate>,
}

impl ExchangeService {
    /// Create a service over an existing store.
    pub fn new(store: Arc<EntityStore>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self { store, updates }
    }

    /// Create a service over a fresh store built from `config`.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(Arc::new(EntityStore::new(config)))
    }

    /// The underlying store.
    pub const fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    /// Subscribe to updates published after each write.
    pub fn subscribe(&self) -> broadcast::Receiver<HubUpdate> {
        self.updates.subscribe()
    }

    // -----------------------------------------------------------------------
    // Model and attack graph
    // -----------------------------------------------------------------------

    /// Current model.
    pub async fn get_model(&self) -> Result<ModelSnapshot, HubError> {
        self.store.model().await
    }

    /// Replace the model.
    pub async fn set_model(&self, model: ModelSnapshot) -> Result<(), HubError> {
        let assets = model.assets.len();
        self.store.set_model(model).await?;
        debug!(entity = %EntityKind::Model, assets, "model replaced");
        self.publish(HubUpdate::replaced(EntityKind::Model, None));
        Ok(())
    }

    /// Current attack graph.
    pub async fn get_attack_graph(&self) -> Result<AttackGraphSnapshot, HubError> {
        self.store.attack_graph().await
    }

    /// Replace the attack graph.
    pub async fn set_attack_graph(&self, graph: AttackGraphSnapshot) -> Result<(), HubError> {
        let attack_steps = graph.attack_steps.len();
        self.store.set_attack_graph(graph).await?;
        debug!(entity = %EntityKind::AttackGraph, attack_steps, "attack graph replaced");
        self.publish(HubUpdate::replaced(EntityKind::AttackGraph, None));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Performed node log
    // -----------------------------------------------------------------------

    /// Performed nodes selected by `filter`, in append order.
    pub async fn get_performed_nodes(
        &self,
        filter: PerformedNodeFilter,
    ) -> Result<Vec<PerformedNode>, HubError> {
        self.store
            .with_performed_nodes(|log| filter.apply(log))
            .await
    }

    /// Append `records` after the existing log. Returns the new log length.
    pub async fn append_performed_nodes(
        &self,
        records: Vec<PerformedNode>,
    ) -> Result<usize, HubError> {
        let appended = records.len();
        let iteration = query::latest_iteration(&records);
        let total = self.store.append_performed_nodes(records).await?;
        debug!(
            entity = %EntityKind::PerformedNodes,
            appended,
            total,
            iteration,
            "performed nodes appended"
        );
        self.publish(HubUpdate::appended(iteration, appended));
        Ok(total)
    }

    // -----------------------------------------------------------------------
    // Latest attack steps and defender suggestions
    // -----------------------------------------------------------------------

    /// Current latest attack steps.
    pub async fn get_latest_attack_steps(&self) -> Result<LatestAttackSteps, HubError> {
        self.store.latest_attack_steps().await
    }

    /// Replace the latest attack steps.
    pub async fn set_latest_attack_steps(&self, steps: LatestAttackSteps) -> Result<(), HubError> {
        let iteration = steps.latest_iteration();
        self.store.set_latest_attack_steps(steps).await?;
        debug!(entity = %EntityKind::LatestAttackSteps, iteration, "latest attack steps replaced");
        self.publish(HubUpdate::replaced(EntityKind::LatestAttackSteps, iteration));
        Ok(())
    }

    /// Current defender suggestions.
    pub async fn get_defender_suggestions(&self) -> Result<DefenderSuggestions, HubError> {
        self.store.defender_suggestions().await
    }

    /// Replace the defender suggestions.
    ///
    /// # Errors
    ///
    /// [`HubError::MalformedInput`] if any weight or upload time is not
    /// a finite number.
    pub async fn set_defender_suggestions(
        &self,
        suggestions: DefenderSuggestions,
    ) -> Result<(), HubError> {
        if let Some(bad) = suggestions
            .iter_suggestions()
            .find(|s| !s.weight.is_finite() || !s.time_uploaded.is_finite())
        {
            return Err(HubError::malformed(
                EntityKind::DefenderSuggestions,
                format!(
                    "non-finite weight or upload time in suggestion for iteration {}",
                    bad.iteration
                ),
            ));
        }

        let iteration = suggestions.iter_suggestions().map(|s| s.iteration).max();
        let agents = suggestions.0.len();
        self.store.set_defender_suggestions(suggestions).await?;
        debug!(
            entity = %EntityKind::DefenderSuggestions,
            agents,
            iteration,
            "defender suggestions replaced"
        );
        self.publish(HubUpdate::replaced(EntityKind::DefenderSuggestions, iteration));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Selected action and reward
    // -----------------------------------------------------------------------

    /// Current selected defender action.
    pub async fn get_selected_action(&self) -> Result<DefenderActionChoice, HubError> {
        self.store.selected_action().await
    }

    /// Replace the selected defender action.
    pub async fn set_selected_action(&self, choice: DefenderActionChoice) -> Result<(), HubError> {
        self.store.set_selected_action(choice).await?;
        debug!(
            entity = %EntityKind::SelectedAction,
            iteration = choice.iteration,
            node_id = choice.node_id,
            "defender action selected"
        );
        self.publish(HubUpdate::replaced(
            EntityKind::SelectedAction,
            Some(choice.iteration),
        ));
        Ok(())
    }

    /// Current reward value.
    pub async fn get_reward_value(&self) -> Result<RewardValue, HubError> {
        self.store.reward_value().await
    }

    /// Replace the reward value.
    ///
    /// # Errors
    ///
    /// [`HubError::MalformedInput`] if the reward is not a finite number.
    pub async fn set_reward_value(&self, value: RewardValue) -> Result<(), HubError> {
        if !value.reward.is_finite() {
            return Err(HubError::malformed(
                EntityKind::RewardValue,
                format!("reward must be finite, got {}", value.reward),
            ));
        }
        self.store.set_reward_value(value).await?;
        debug!(
            entity = %EntityKind::RewardValue,
            iteration = value.iteration,
            reward = value.reward,
            "reward value set"
        );
        self.publish(HubUpdate::replaced(
            EntityKind::RewardValue,
            Some(value.iteration),
        ));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reset and status
    // -----------------------------------------------------------------------

    /// Return every entity to its initial value.
    pub async fn reset(&self) -> Result<(), HubError> {
        self.store.reset_all().await?;
        info!("hub reset to initial state");
        self.publish(HubUpdate::reset());
        Ok(())
    }

    /// Summary of the current contents, one field per entity.
    pub async fn status(&self) -> Result<HubStatus, HubError> {
        let snapshot = self.store.snapshot().await?;
        Ok(HubStatus {
            model_assets: snapshot.model.assets.len(),
            attack_steps: snapshot.attack_graph.attack_steps.len(),
            performed_nodes: snapshot.performed_nodes.len(),
            latest_performed_iteration: query::latest_iteration(&snapshot.performed_nodes),
            latest_attack_step_iteration: snapshot.latest_attack_steps.latest_iteration(),
            suggestion_agents: snapshot.defender_suggestions.0.len(),
            suggestions: snapshot.defender_suggestions.iter_suggestions().count(),
            selected_action_iteration: snapshot.selected_action.iteration,
            reward_iteration: snapshot.reward_value.iteration,
        })
    }

    fn publish(&self, update: HubUpdate) {
        // send fails only when nobody is subscribed, which is normal.
        let _ = self.updates.send(update);
    }
}

impl Default for ExchangeService {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}
