//! In-memory entity store.
//!
//! Each of the seven entities lives behind its own [`RwLock`], so a
//! writer on one entity never blocks readers or writers of another.
//! A store-wide reset gate sits in front of them: single-entity
//! operations hold it shared, [`EntityStore::reset_all`] holds it
//! exclusively. Shared holders never contend with each other, and no
//! operation can observe a partially reset store.
//!
//! Lock order is always gate first, then entity. Every acquisition is
//! bounded by the configured lock timeout. Reads clone the value out and
//! release both guards before returning.

use std::future::Future;
use std::time::Duration;

use malhub_types::{
    AttackGraphSnapshot, DefenderActionChoice, DefenderSuggestions, EntityKind, LatestAttackSteps,
    ModelSnapshot, PerformedNode, RewardValue,
};
use tokio::sync::RwLock;
use tracing::warn;

use crate::config::StoreConfig;
use crate::error::HubError;

/// Owned copy of all seven entities.
///
/// The [`Default`] value is the state of a freshly started hub.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    /// Current model.
    pub model: ModelSnapshot,
    /// Current attack graph.
    pub attack_graph: AttackGraphSnapshot,
    /// The whole performed node log.
    pub performed_nodes: Vec<PerformedNode>,
    /// Current latest attack steps.
    pub latest_attack_steps: LatestAttackSteps,
    /// Current defender suggestions.
    pub defender_suggestions: DefenderSuggestions,
    /// Current selected defender action.
    pub selected_action: DefenderActionChoice,
    /// Current reward value.
    pub reward_value: RewardValue,
}

/// Holds the current value of every entity.
///
/// Constructed once per process and shared behind an
/// [`Arc`](std::sync::Arc).
#[derive(Debug)]
pub struct EntityStore {
    reset_gate: RwLock<()>,
    model: RwLock<ModelSnapshot>,
    attack_graph: RwLock<AttackGraphSnapshot>,
    performed_nodes: RwLock<Vec<PerformedNode>>,
    latest_attack_steps: RwLock<LatestAttackSteps>,
    defender_suggestions: RwLock<DefenderSuggestions>,
    selected_action: RwLock<DefenderActionChoice>,
    reward_value: RwLock<RewardValue>,
    lock_timeout: Duration,
    retention: Option<usize>,
}

impl EntityStore {
    /// Create a store with every entity at its initial value.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            reset_gate: RwLock::new(()),
            model: RwLock::default(),
            attack_graph: RwLock::default(),
            performed_nodes: RwLock::default(),
            latest_attack_steps: RwLock::default(),
            defender_suggestions: RwLock::default(),
            selected_action: RwLock::default(),
            reward_value: RwLock::default(),
            lock_timeout: config.lock_timeout(),
            retention: config.performed_nodes_retention,
        }
    }

    // -----------------------------------------------------------------------
    // Model and attack graph
    // -----------------------------------------------------------------------

    /// Current model.
    pub async fn model(&self) -> Result<ModelSnapshot, HubError> {
        self.read(EntityKind::Model, &self.model).await
    }

    /// Replace the model.
    pub async fn set_model(&self, value: ModelSnapshot) -> Result<(), HubError> {
        self.replace(EntityKind::Model, &self.model, value).await
    }

    /// Current attack graph.
    pub async fn attack_graph(&self) -> Result<AttackGraphSnapshot, HubError> {
        self.read(EntityKind::AttackGraph, &self.attack_graph).await
    }

    /// Replace the attack graph.
    pub async fn set_attack_graph(&self, value: AttackGraphSnapshot) -> Result<(), HubError> {
        self.replace(EntityKind::AttackGraph, &self.attack_graph, value)
            .await
    }

    // -----------------------------------------------------------------------
    // Performed node log
    // -----------------------------------------------------------------------

    /// Run `f` over the performed node log while holding its read guard.
    ///
    /// Lets queries filter in place instead of cloning the whole log.
    pub async fn with_performed_nodes<R>(
        &self,
        f: impl FnOnce(&[PerformedNode]) -> R,
    ) -> Result<R, HubError> {
        let _gate = self.gate_shared().await?;
        let log = self
            .guard(Some(EntityKind::PerformedNodes), self.performed_nodes.read())
            .await?;
        Ok(f(&log))
    }

    /// Append `records` to the end of the log, in the order given.
    ///
    /// The records land contiguously: concurrent appends serialize on the
    /// log's write guard. Returns the log length afterwards.
    pub async fn append_performed_nodes(
        &self,
        records: Vec<PerformedNode>,
    ) -> Result<usize, HubError> {
        let _gate = self.gate_shared().await?;
        let mut log = self
            .guard(Some(EntityKind::PerformedNodes), self.performed_nodes.write())
            .await?;
        log.extend(records);
        if let Some(limit) = self.retention {
            let excess = log.len().saturating_sub(limit);
            if excess > 0 {
                log.drain(..excess);
            }
        }
        Ok(log.len())
    }

    // -----------------------------------------------------------------------
    // Latest attack steps and defender suggestions
    // -----------------------------------------------------------------------

    /// Current latest attack steps.
    pub async fn latest_attack_steps(&self) -> Result<LatestAttackSteps, HubError> {
        self.read(EntityKind::LatestAttackSteps, &self.latest_attack_steps)
            .await
    }

    /// Replace the latest attack steps.
    pub async fn set_latest_attack_steps(&self, value: LatestAttackSteps) -> Result<(), HubError> {
        self.replace(EntityKind::LatestAttackSteps, &self.latest_attack_steps, value)
            .await
    }

    /// Current defender suggestions.
    pub async fn defender_suggestions(&self) -> Result<DefenderSuggestions, HubError> {
        self.read(EntityKind::DefenderSuggestions, &self.defender_suggestions)
            .await
    }

    /// Replace the defender suggestions.
    pub async fn set_defender_suggestions(
        &self,
        value: DefenderSuggestions,
    ) -> Result<(), HubError> {
        self.replace(
            EntityKind::DefenderSuggestions,
            &self.defender_suggestions,
            value,
        )
        .await
    }

    // -----------------------------------------------------------------------
    // Selected action and reward
    // -----------------------------------------------------------------------

    /// Current selected defender action.
    pub async fn selected_action(&self) -> Result<DefenderActionChoice, HubError> {
        self.read(EntityKind::SelectedAction, &self.selected_action)
            .await
    }

    /// Replace the selected defender action.
    pub async fn set_selected_action(&self, value: DefenderActionChoice) -> Result<(), HubError> {
        self.replace(EntityKind::SelectedAction, &self.selected_action, value)
            .await
    }

    /// Current reward value.
    pub async fn reward_value(&self) -> Result<RewardValue, HubError> {
        self.read(EntityKind::RewardValue, &self.reward_value).await
    }

    /// Replace the reward value.
    pub async fn set_reward_value(&self, value: RewardValue) -> Result<(), HubError> {
        self.replace(EntityKind::RewardValue, &self.reward_value, value)
            .await
    }

    // -----------------------------------------------------------------------
    // Whole-store operations
    // -----------------------------------------------------------------------

    /// Return every entity to its initial value in one atomic step.
    ///
    /// Holds the reset gate exclusively, so no other operation runs
    /// between the first and the last entity being reset.
    pub async fn reset_all(&self) -> Result<(), HubError> {
        let _gate = self.guard(None, self.reset_gate.write()).await?;

        *self.guard(Some(EntityKind::Model), self.model.write()).await? = ModelSnapshot::default();
        *self
            .guard(Some(EntityKind::AttackGraph), self.attack_graph.write())
            .await? = AttackGraphSnapshot::default();
        self.guard(Some(EntityKind::PerformedNodes), self.performed_nodes.write())
            .await?
            .clear();
        *self
            .guard(
                Some(EntityKind::LatestAttackSteps),
                self.latest_attack_steps.write(),
            )
            .await? = LatestAttackSteps::default();
        *self
            .guard(
                Some(EntityKind::DefenderSuggestions),
                self.defender_suggestions.write(),
            )
            .await? = DefenderSuggestions::default();
        *self
            .guard(Some(EntityKind::SelectedAction), self.selected_action.write())
            .await? = DefenderActionChoice::default();
        *self
            .guard(Some(EntityKind::RewardValue), self.reward_value.write())
            .await? = RewardValue::default();

        Ok(())
    }

    /// Copy out every entity.
    ///
    /// Each entity is read consistently and none can be caught mid-reset,
    /// but writes to different entities may land between the reads.
    pub async fn snapshot(&self) -> Result<StoreSnapshot, HubError> {
        let _gate = self.gate_shared().await?;
        Ok(StoreSnapshot {
            model: self.clone_slot(EntityKind::Model, &self.model).await?,
            attack_graph: self
                .clone_slot(EntityKind::AttackGraph, &self.attack_graph)
                .await?,
            performed_nodes: self
                .clone_slot(EntityKind::PerformedNodes, &self.performed_nodes)
                .await?,
            latest_attack_steps: self
                .clone_slot(EntityKind::LatestAttackSteps, &self.latest_attack_steps)
                .await?,
            defender_suggestions: self
                .clone_slot(EntityKind::DefenderSuggestions, &self.defender_suggestions)
                .await?,
            selected_action: self
                .clone_slot(EntityKind::SelectedAction, &self.selected_action)
                .await?,
            reward_value: self
                .clone_slot(EntityKind::RewardValue, &self.reward_value)
                .await?,
        })
    }

    // -----------------------------------------------------------------------
    // Guard helpers
    // -----------------------------------------------------------------------

    async fn read<T: Clone>(&self, entity: EntityKind, slot: &RwLock<T>) -> Result<T, HubError> {
        let _gate = self.gate_shared().await?;
        self.clone_slot(entity, slot).await
    }

    async fn replace<T>(&self, entity: EntityKind, slot: &RwLock<T>, value: T) -> Result<(), HubError> {
        let _gate = self.gate_shared().await?;
        *self.guard(Some(entity), slot.write()).await? = value;
        Ok(())
    }

    /// Clone a slot's value. The caller must already hold the gate.
    async fn clone_slot<T: Clone>(
        &self,
        entity: EntityKind,
        slot: &RwLock<T>,
    ) -> Result<T, HubError> {
        let value = self.guard(Some(entity), slot.read()).await?;
        Ok(value.clone())
    }

    async fn gate_shared(&self) -> Result<tokio::sync::RwLockReadGuard<'_, ()>, HubError> {
        self.guard(None, self.reset_gate.read()).await
    }

    async fn guard<G>(
        &self,
        entity: Option<EntityKind>,
        acquire: impl Future<Output = G>,
    ) -> Result<G, HubError> {
        tokio::time::timeout(self.lock_timeout, acquire)
            .await
            .map_err(|source| {
                warn!(
                    entity = entity.map_or("reset_gate", EntityKind::as_str),
                    timeout = ?self.lock_timeout,
                    "guard acquisition timed out"
                );
                HubError::ConcurrentAccess {
                    entity,
                    waited: self.lock_timeout,
                    source,
                }
            })
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}
