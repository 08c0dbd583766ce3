//! End-to-end exercises of the Registry API over a real bound socket,
//! driving handlers through an actual HTTP client rather than calling
//! them in-process.

use std::net::SocketAddr;
use std::sync::Arc;

use mesh_registry::{build_router, AppState};
use mesh_store::{MemoryStore, Store};
use mesh_wire::{DiscoverAgentsResponse, HealthResponse, HeartbeatRequest, HeartbeatResponse, RegisterRequest, RegisterResponse};

async fn spawn_server() -> (SocketAddr, Arc<dyn Store>) {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone());
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (addr, store)
}

fn register_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "namespace": "default",
        "agent_type": "worker",
        "endpoint": format!("http://{name}.local"),
        "health_interval_seconds": 5,
    })
}

#[tokio::test]
async fn register_then_discover_round_trips() {
    let (addr, _store) = spawn_server().await;
    let client = reqwest::Client::new();

    let response: RegisterResponse = client
        .post(format!("http://{addr}/agents/register_with_metadata"))
        .json(&register_body("greeter"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(response.wiring.is_empty());

    let discover: DiscoverAgentsResponse = client
        .get(format!("http://{addr}/agents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(discover.count, 1);
    assert_eq!(discover.agents[0].name, "greeter");
}

#[tokio::test]
async fn heartbeat_unknown_agent_returns_404() {
    let (addr, _store) = spawn_server().await;
    let client = reqwest::Client::new();

    let request = HeartbeatRequest {
        agent_id: mesh_types::AgentId::random(),
        status_hint: None,
        metadata: None,
        known_resource_version: None,
    };

    let status = client
        .post(format!("http://{addr}/heartbeat"))
        .json(&request)
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn heartbeat_omits_wiring_when_resource_version_unchanged() {
    let (addr, _store) = spawn_server().await;
    let client = reqwest::Client::new();

    let registered: RegisterResponse = client
        .post(format!("http://{addr}/agents/register_with_metadata"))
        .json(&register_body("solo"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let request = HeartbeatRequest {
        agent_id: registered.agent_id,
        status_hint: None,
        metadata: None,
        known_resource_version: None,
    };
    let first: HeartbeatResponse = client
        .post(format!("http://{addr}/heartbeat"))
        .json(&request)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let request = HeartbeatRequest {
        agent_id: registered.agent_id,
        status_hint: None,
        metadata: None,
        known_resource_version: Some(first.resource_version),
    };
    let second: HeartbeatResponse = client
        .post(format!("http://{addr}/heartbeat"))
        .json(&request)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Each heartbeat still bumps the resource version (its own timestamp
    // changed), but wiring is omitted because the caller's last known
    // version matched what was on record before this heartbeat's bump.
    assert!(second.resource_version > first.resource_version);
    assert!(second.wiring.is_none());
}

#[tokio::test]
async fn health_reports_agent_count() {
    let (addr, _store) = spawn_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("http://{addr}/agents/register_with_metadata"))
        .json(&register_body("a"))
        .send()
        .await
        .unwrap();

    let health: HealthResponse = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health.agent_count, 1);
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn delete_unknown_agent_returns_404() {
    let (addr, _store) = spawn_server().await;
    let client = reqwest::Client::new();

    let status = client
        .delete(format!("http://{addr}/agents/{}", mesh_types::AgentId::random()))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
}
