//! Integration tests for the hub's HTTP endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic, routing and
//! error mapping without needing a live network connection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use malhub_observer::router::build_router;
use malhub_observer::state::AppState;
use malhub_types::{EntityKind, UpdateKind};
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_router() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::default());
    let router = build_router(Arc::clone(&state));
    (state, router)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn get(router: &Router, path: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post(router: &Router, path: &str, body: &Value) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_string(response.into_body()).await)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let (_, router) = make_router();

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_initial_values() {
    let (_, router) = make_router();

    let (status, model) = get(&router, "/model").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(model, json!({"metadata": {}, "assets": {}}));

    let (_, graph) = get(&router, "/attack_graph").await;
    assert_eq!(graph, json!({"attack_steps": {}}));

    let (_, nodes) = get(&router, "/performed_nodes").await;
    assert_eq!(nodes, json!([]));

    let (_, steps) = get(&router, "/latest_attack_steps").await;
    assert_eq!(steps, json!({"0": []}));

    let (_, suggestions) = get(&router, "/defender_suggestions").await;
    assert_eq!(suggestions, json!({}));

    let (_, action) = get(&router, "/defender_action").await;
    assert_eq!(action, json!({"iteration": -1, "node_id": null}));

    let (_, reward) = get(&router, "/reward_value").await;
    assert_eq!(reward, json!({"iteration": -1, "reward": 0.0}));
}

#[tokio::test]
async fn test_post_model_replaces() {
    let (_, router) = make_router();

    let first = json!({"metadata": {"name": "one"}, "assets": {"1": {"type": "Host"}}});
    let second = json!({"metadata": {"name": "two"}, "assets": {}});

    let (status, ack) = post(&router, "/model", &first).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, "success");
    let (status, _) = post(&router, "/model", &second).await;
    assert_eq!(status, StatusCode::OK);

    let (_, model) = get(&router, "/model").await;
    assert_eq!(model, second);
}

#[tokio::test]
async fn test_post_attack_graph() {
    let (_, router) = make_router();
    let graph = json!({"attack_steps": {"12": {"name": "Host:access", "type": "or"}}});

    let (status, _) = post(&router, "/attack_graph", &graph).await;
    assert_eq!(status, StatusCode::OK);

    let (_, got) = get(&router, "/attack_graph").await;
    assert_eq!(got, graph);
}

#[tokio::test]
async fn test_post_attack_graph_larger_than_two_megabytes() {
    let (state, router) = make_router();
    let steps: serde_json::Map<String, Value> = (0..30_000)
        .map(|id| {
            (
                id.to_string(),
                json!({
                    "name": format!("Host{id}:fullAccess"),
                    "type": "or",
                    "ttc": {"type": "function", "name": "VeryHardAndUncertain"},
                    "children": [id],
                    "parents": [],
                }),
            )
        })
        .collect();
    let graph = json!({ "attack_steps": steps });
    assert!(graph.to_string().len() > 2_097_152);

    let (status, body) = post(&router, "/attack_graph", &graph).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let stored = state.hub.get_attack_graph().await.unwrap();
    assert_eq!(stored.attack_steps.len(), 30_000);
}

#[tokio::test]
async fn test_performed_nodes_append_and_filter() {
    let (_, router) = make_router();

    let first = json!([
        {"iteration": 0, "node_id": 1},
        {"iteration": 0, "node_id": 2}
    ]);
    let second = json!([
        {"iteration": 1, "node_id": 3},
        {"iteration": 2, "node_id": 4}
    ]);
    assert_eq!(post(&router, "/performed_nodes", &first).await.0, StatusCode::OK);
    assert_eq!(post(&router, "/performed_nodes", &second).await.0, StatusCode::OK);

    let (_, all) = get(&router, "/performed_nodes").await;
    assert_eq!(all.as_array().unwrap().len(), 4);
    assert_eq!(all[2], json!({"iteration": 1, "node_id": 3}));

    let (_, exact) = get(&router, "/performed_nodes?iter=0").await;
    assert_eq!(exact, first);

    let (_, from) = get(&router, "/performed_nodes?from_iter=1").await;
    assert_eq!(from, second);

    let (_, both) = get(&router, "/performed_nodes?iter=2&from_iter=0").await;
    assert_eq!(both, json!([{"iteration": 2, "node_id": 4}]));
}

#[tokio::test]
async fn test_performed_nodes_invalid_query() {
    let (_, router) = make_router();

    let (status, body) = get(&router, "/performed_nodes?iter=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_latest_attack_steps_replaces() {
    let (_, router) = make_router();

    let first = json!({"1": [{"node": 5, "log": "alert"}]});
    let second = json!({"2": []});
    assert_eq!(post(&router, "/latest_attack_steps", &first).await.0, StatusCode::OK);
    assert_eq!(post(&router, "/latest_attack_steps", &second).await.0, StatusCode::OK);

    let (_, steps) = get(&router, "/latest_attack_steps").await;
    assert_eq!(steps, second);
}

#[tokio::test]
async fn test_defender_suggestions_round_trip() {
    let (_, router) = make_router();

    let suggestions = json!({
        "defender-a": {
            "7": {"weight": 0.8, "action": {"kind": "disable"}, "iteration": 3, "time_uploaded": 1700000000.5}
        }
    });
    assert_eq!(
        post(&router, "/defender_suggestions", &suggestions).await.0,
        StatusCode::OK
    );

    let (_, got) = get(&router, "/defender_suggestions").await;
    assert_eq!(got, suggestions);
}

#[tokio::test]
async fn test_defender_suggestions_stamp_upload_time() {
    let (_, router) = make_router();

    let suggestions = json!({
        "defender-a": {"7": {"weight": 0.8, "action": {}, "iteration": 3}}
    });
    assert_eq!(
        post(&router, "/defender_suggestions", &suggestions).await.0,
        StatusCode::OK
    );

    let (_, got) = get(&router, "/defender_suggestions").await;
    assert!(got["defender-a"]["7"]["time_uploaded"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_defender_action_without_matching_suggestion() {
    let (_, router) = make_router();

    let choice = json!({"iteration": 99, "node_id": 4});
    let (status, ack) = post(&router, "/defender_action", &choice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, "success");

    let (_, got) = get(&router, "/defender_action").await;
    assert_eq!(got, choice);
}

#[tokio::test]
async fn test_defender_action_null_node() {
    let (_, router) = make_router();

    let choice = json!({"iteration": 2, "node_id": null});
    assert_eq!(post(&router, "/defender_action", &choice).await.0, StatusCode::OK);

    let (_, got) = get(&router, "/defender_action").await;
    assert_eq!(got, choice);
}

#[tokio::test]
async fn test_reward_value() {
    let (_, router) = make_router();

    let reward = json!({"iteration": 4, "reward": -2.5});
    assert_eq!(post(&router, "/reward_value", &reward).await.0, StatusCode::OK);

    let (_, got) = get(&router, "/reward_value").await;
    assert_eq!(got, reward);
}

#[tokio::test]
async fn test_malformed_input_is_rejected_without_mutation() {
    let (_, router) = make_router();

    let (status, body) = post(
        &router,
        "/reward_value",
        &json!({"iteration": "four", "reward": 1.0}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["status"], 422);
    assert!(body["error"].as_str().unwrap().contains("reward_value"));

    let (_, reward) = get(&router, "/reward_value").await;
    assert_eq!(reward, json!({"iteration": -1, "reward": 0.0}));

    let (status, _) = post(&router, "/model", &json!({"metadata": {}})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(
        &router,
        "/performed_nodes",
        &json!([{"iteration": 0, "node_id": 1}, {"iteration": 0}]),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (_, nodes) = get(&router, "/performed_nodes").await;
    assert_eq!(nodes, json!([]));
}

#[tokio::test]
async fn test_reset_restores_initial_state() {
    let (_, router) = make_router();

    post(&router, "/model", &json!({"metadata": {"a": 1}, "assets": {}})).await;
    post(&router, "/performed_nodes", &json!([{"iteration": 0, "node_id": 1}])).await;
    post(&router, "/latest_attack_steps", &json!({"3": [{}]})).await;
    post(&router, "/defender_action", &json!({"iteration": 3, "node_id": 1})).await;
    post(&router, "/reward_value", &json!({"iteration": 3, "reward": 9.0})).await;

    for _ in 0..2 {
        let response = router
            .clone()
            .oneshot(Request::post("/reset").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_to_string(response.into_body()).await, "success");
    }

    assert_eq!(get(&router, "/model").await.1, json!({"metadata": {}, "assets": {}}));
    assert_eq!(get(&router, "/performed_nodes").await.1, json!([]));
    assert_eq!(get(&router, "/latest_attack_steps").await.1, json!({"0": []}));
    assert_eq!(
        get(&router, "/defender_action").await.1,
        json!({"iteration": -1, "node_id": null})
    );
    assert_eq!(
        get(&router, "/reward_value").await.1,
        json!({"iteration": -1, "reward": 0.0})
    );
}

#[tokio::test]
async fn test_status_endpoint() {
    let (_, router) = make_router();

    post(
        &router,
        "/performed_nodes",
        &json!([{"iteration": 5, "node_id": 1}, {"iteration": 2, "node_id": 2}]),
    )
    .await;

    let (status, body) = get(&router, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["performed_nodes"], 2);
    assert_eq!(body["latest_performed_iteration"], 5);
    assert_eq!(body["reward_iteration"], -1);
}

#[tokio::test]
async fn test_writes_reach_subscribers() {
    let (state, router) = make_router();
    let mut rx = state.subscribe();

    post(&router, "/reward_value", &json!({"iteration": 1, "reward": 0.5})).await;

    let update = rx.recv().await.unwrap();
    assert_eq!(update.entity, Some(EntityKind::RewardValue));
    assert_eq!(update.kind, UpdateKind::Replaced);
    assert_eq!(update.iteration, Some(1));
}

#[tokio::test]
async fn test_concurrent_appends_over_http() {
    let (_, router) = make_router();

    let mut handles = Vec::new();
    for caller in 0..8 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            let records: Vec<Value> = (0..10)
                .map(|seq| json!({"iteration": caller, "node_id": seq}))
                .collect();
            post(&router, "/performed_nodes", &Value::Array(records)).await.0
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }

    let (_, all) = get(&router, "/performed_nodes").await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 80);
    for chunk in all.chunks(10) {
        let caller = &chunk[0]["iteration"];
        assert!(chunk.iter().all(|n| &n["iteration"] == caller));
    }
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let (_, router) = make_router();

    let response = router
        .oneshot(
            Request::get("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
