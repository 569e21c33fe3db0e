//! Request body extraction for entity writes.
//!
//! [`EntityJson`] reads the raw body and decodes it through
//! [`malhub_core::service::decode`], so a shape mismatch surfaces as
//! [`HubError::MalformedInput`](malhub_core::HubError::MalformedInput)
//! naming the entity, rather than Axum's generic JSON rejection.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use malhub_core::service::decode;
use malhub_types::{
    AttackGraphSnapshot, DefenderActionChoice, DefenderSuggestions, EntityKind, LatestAttackSteps,
    ModelSnapshot, PerformedNode, RewardValue,
};
use serde::de::DeserializeOwned;

use crate::error::ObserverError;

/// A value that can be posted to one of the hub's entity routes.
pub trait EntityPayload: DeserializeOwned {
    /// The entity this payload writes.
    const KIND: EntityKind;
}

impl EntityPayload for ModelSnapshot {
    const KIND: EntityKind = EntityKind::Model;
}

impl EntityPayload for AttackGraphSnapshot {
    const KIND: EntityKind = EntityKind::AttackGraph;
}

impl EntityPayload for Vec<PerformedNode> {
    const KIND: EntityKind = EntityKind::PerformedNodes;
}

impl EntityPayload for LatestAttackSteps {
    const KIND: EntityKind = EntityKind::LatestAttackSteps;
}

impl EntityPayload for DefenderSuggestions {
    const KIND: EntityKind = EntityKind::DefenderSuggestions;
}

impl EntityPayload for DefenderActionChoice {
    const KIND: EntityKind = EntityKind::SelectedAction;
}

impl EntityPayload for RewardValue {
    const KIND: EntityKind = EntityKind::RewardValue;
}

/// JSON body extractor for an [`EntityPayload`].
#[derive(Debug)]
pub struct EntityJson<T>(pub T);

impl<S, T> FromRequest<S> for EntityJson<T>
where
    S: Send + Sync,
    T: EntityPayload,
{
    type Rejection = ObserverError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ObserverError::Body(e.body_text()))?;
        let value = decode::<T>(T::KIND, &body)?;
        Ok(Self(value))
    }
}
