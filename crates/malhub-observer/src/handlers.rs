//! HTTP endpoint handlers for the hub.
//!
//! Every handler makes exactly one [`ExchangeService`] call through the
//! shared [`AppState`]. Writes answer with a plain-text `success`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/status` | Per-entity summary |
//! | `GET`/`POST` | `/model` | Instance model |
//! | `GET`/`POST` | `/attack_graph` | Attack graph |
//! | `GET`/`POST` | `/performed_nodes` | Performed node log (`?iter=N`, `?from_iter=N`); `POST` appends |
//! | `GET`/`POST` | `/latest_attack_steps` | Alert logs of the latest attack steps |
//! | `GET`/`POST` | `/defender_suggestions` | Defender suggestions per agent |
//! | `GET`/`POST` | `/defender_action` | Selected defender action |
//! | `GET`/`POST` | `/reward_value` | Reward for the latest iteration |
//! | `POST` | `/reset` | Reset every entity |
//!
//! [`ExchangeService`]: malhub_core::ExchangeService

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use malhub_core::PerformedNodeFilter;
use malhub_types::{
    AttackGraphSnapshot, DefenderActionChoice, DefenderSuggestions, Iteration, LatestAttackSteps,
    ModelSnapshot, PerformedNode, RewardValue,
};

use crate::error::ObserverError;
use crate::extract::EntityJson;
use crate::state::AppState;

/// Body returned by every successful write.
const ACK: &str = "success";

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /performed_nodes` endpoint.
#[derive(Debug, Default, serde::Deserialize)]
pub struct PerformedNodesQuery {
    /// Only records of exactly this iteration. Wins over `from_iter`.
    pub iter: Option<Iteration>,
    /// Only records of this iteration or later.
    pub from_iter: Option<Iteration>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing what the hub currently holds.
pub async fn index(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let status = state.hub.status().await?;
    let performed_iter = status
        .latest_performed_iteration
        .map_or_else(|| String::from("-"), |i| i.to_string());
    let steps_iter = status
        .latest_attack_step_iteration
        .map_or_else(|| String::from("-"), |i| i.to_string());
    let action_iter = status.selected_action_iteration;
    let reward_iter = status.reward_iteration;
    let assets = status.model_assets;
    let attack_steps = status.attack_steps;
    let performed = status.performed_nodes;
    let agents = status.suggestion_agents;
    let suggestions = status.suggestions;

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>MAL Simulation Hub</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>MAL Simulation Hub</h1>
    <p class="subtitle">Shared state between the simulation driver and the dashboard</p>

    <div>
        <div class="metric">
            <div class="label">Model assets</div>
            <div class="value">{assets}</div>
        </div>
        <div class="metric">
            <div class="label">Attack steps</div>
            <div class="value">{attack_steps}</div>
        </div>
        <div class="metric">
            <div class="label">Performed nodes</div>
            <div class="value">{performed}</div>
        </div>
        <div class="metric">
            <div class="label">Last performed iteration</div>
            <div class="value">{performed_iter}</div>
        </div>
        <div class="metric">
            <div class="label">Alert iteration</div>
            <div class="value">{steps_iter}</div>
        </div>
        <div class="metric">
            <div class="label">Suggestions</div>
            <div class="value">{suggestions} / {agents} agents</div>
        </div>
        <div class="metric">
            <div class="label">Action iteration</div>
            <div class="value">{action_iter}</div>
        </div>
        <div class="metric">
            <div class="label">Reward iteration</div>
            <div class="value">{reward_iter}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/status">/api/status</a> -- Entity summary</li>
        <li><a href="/model">/model</a> -- Instance model</li>
        <li><a href="/attack_graph">/attack_graph</a> -- Attack graph</li>
        <li><a href="/performed_nodes">/performed_nodes</a> -- Performed nodes (?iter=N or ?from_iter=N)</li>
        <li><a href="/latest_attack_steps">/latest_attack_steps</a> -- Latest alert logs</li>
        <li><a href="/defender_suggestions">/defender_suggestions</a> -- Defender suggestions</li>
        <li><a href="/defender_action">/defender_action</a> -- Selected defender action</li>
        <li><a href="/reward_value">/reward_value</a> -- Latest reward</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li style="list-style:none;"><code>ws://host:port/ws/updates</code> -- Live update stream</li>
    </ul>
</body>
</html>"#
    )))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return the per-entity summary.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    Ok(Json(state.hub.status().await?))
}

// ---------------------------------------------------------------------------
// /model
// ---------------------------------------------------------------------------

/// Return the instance model.
pub async fn get_model(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelSnapshot>, ObserverError> {
    Ok(Json(state.hub.get_model().await?))
}

/// Replace the instance model.
pub async fn post_model(
    State(state): State<Arc<AppState>>,
    EntityJson(model): EntityJson<ModelSnapshot>,
) -> Result<&'static str, ObserverError> {
    state.hub.set_model(model).await?;
    Ok(ACK)
}

// ---------------------------------------------------------------------------
// /attack_graph
// ---------------------------------------------------------------------------

/// Return the attack graph.
pub async fn get_attack_graph(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AttackGraphSnapshot>, ObserverError> {
    Ok(Json(state.hub.get_attack_graph().await?))
}

/// Replace the attack graph.
pub async fn post_attack_graph(
    State(state): State<Arc<AppState>>,
    EntityJson(graph): EntityJson<AttackGraphSnapshot>,
) -> Result<&'static str, ObserverError> {
    state.hub.set_attack_graph(graph).await?;
    Ok(ACK)
}

// ---------------------------------------------------------------------------
// /performed_nodes
// ---------------------------------------------------------------------------

/// Return performed nodes, optionally filtered by iteration.
///
/// # Query Parameters
///
/// - `iter`: only records of exactly this iteration
/// - `from_iter`: only records of this iteration or later
///
/// `iter` takes precedence when both are given.
pub async fn get_performed_nodes(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PerformedNodesQuery>, QueryRejection>,
) -> Result<Json<Vec<PerformedNode>>, ObserverError> {
    let Query(params) = params.map_err(|e| ObserverError::InvalidQuery(e.body_text()))?;
    let filter = PerformedNodeFilter::from_params(params.iter, params.from_iter);
    Ok(Json(state.hub.get_performed_nodes(filter).await?))
}

/// Append performed nodes to the log.
pub async fn post_performed_nodes(
    State(state): State<Arc<AppState>>,
    EntityJson(records): EntityJson<Vec<PerformedNode>>,
) -> Result<&'static str, ObserverError> {
    state.hub.append_performed_nodes(records).await?;
    Ok(ACK)
}

// ---------------------------------------------------------------------------
// /latest_attack_steps
// ---------------------------------------------------------------------------

/// Return the alert logs of the latest attack steps.
pub async fn get_latest_attack_steps(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LatestAttackSteps>, ObserverError> {
    Ok(Json(state.hub.get_latest_attack_steps().await?))
}

/// Replace the latest attack steps.
pub async fn post_latest_attack_steps(
    State(state): State<Arc<AppState>>,
    EntityJson(steps): EntityJson<LatestAttackSteps>,
) -> Result<&'static str, ObserverError> {
    state.hub.set_latest_attack_steps(steps).await?;
    Ok(ACK)
}

// ---------------------------------------------------------------------------
// /defender_suggestions
// ---------------------------------------------------------------------------

/// Return the defender suggestions.
pub async fn get_defender_suggestions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DefenderSuggestions>, ObserverError> {
    Ok(Json(state.hub.get_defender_suggestions().await?))
}

/// Replace the defender suggestions.
pub async fn post_defender_suggestions(
    State(state): State<Arc<AppState>>,
    EntityJson(suggestions): EntityJson<DefenderSuggestions>,
) -> Result<&'static str, ObserverError> {
    state.hub.set_defender_suggestions(suggestions).await?;
    Ok(ACK)
}

// ---------------------------------------------------------------------------
// /defender_action
// ---------------------------------------------------------------------------

/// Return the selected defender action.
pub async fn get_defender_action(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DefenderActionChoice>, ObserverError> {
    Ok(Json(state.hub.get_selected_action().await?))
}

/// Select the defender action for the next step.
pub async fn post_defender_action(
    State(state): State<Arc<AppState>>,
    EntityJson(choice): EntityJson<DefenderActionChoice>,
) -> Result<&'static str, ObserverError> {
    state.hub.set_selected_action(choice).await?;
    Ok(ACK)
}

// ---------------------------------------------------------------------------
// /reward_value
// ---------------------------------------------------------------------------

/// Return the reward value.
pub async fn get_reward_value(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RewardValue>, ObserverError> {
    Ok(Json(state.hub.get_reward_value().await?))
}

/// Set the reward for the latest iteration.
pub async fn post_reward_value(
    State(state): State<Arc<AppState>>,
    EntityJson(value): EntityJson<RewardValue>,
) -> Result<&'static str, ObserverError> {
    state.hub.set_reward_value(value).await?;
    Ok(ACK)
}

// ---------------------------------------------------------------------------
// POST /reset
// ---------------------------------------------------------------------------

/// Reset every entity to its initial value.
pub async fn post_reset(State(state): State<Arc<AppState>>) -> Result<&'static str, ObserverError> {
    state.hub.reset().await?;
    Ok(ACK)
}
