//! HTTP handlers implementing the Registry API endpoints.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use mesh_resolver::{resolve_dependency, AgentFilter};
use mesh_store::UpsertAgent;
use mesh_types::{AgentId, AgentRecord, DependencyDescriptor, WiringEntry};
use mesh_wire::{
    AgentSummary, CapabilityRow, DiscoverAgentsResponse, DiscoverCapabilitiesResponse, DiscoverQuery,
    HealthResponse, HeartbeatRequest, HeartbeatResponse, RegisterRequest, RegisterResponse,
};
use tracing::info;

use crate::error::{RegistryError, Result};
use crate::query::{agent_filter, capability_filter};
use crate::state::AppState;

/// Recomputes the wiring array for `dependencies` against the current
/// healthy-agent population.
async fn compute_wiring(state: &AppState, dependencies: &[DependencyDescriptor]) -> Result<Vec<WiringEntry>> {
    if dependencies.is_empty() {
        return Ok(Vec::new());
    }

    let mut healthy_filter = AgentFilter::default();
    healthy_filter.status = Some(mesh_types::AgentStatus::Healthy);
    let (healthy_agents, _version) = state.store.list_agents(&healthy_filter).await?;

    Ok(dependencies
        .iter()
        .enumerate()
        .map(|(dependency_index, descriptor)| WiringEntry {
            dependency_index,
            candidates: resolve_dependency(descriptor, &healthy_agents, false),
        })
        .collect())
}

/// `POST /agents/register_with_metadata`
pub async fn register_with_metadata(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    if request.name.trim().is_empty() || request.namespace.trim().is_empty() {
        return Err(RegistryError::InvalidRequest(
            "name and namespace must not be empty".into(),
        ));
    }

    let now = Utc::now();
    let upsert = UpsertAgent {
        id: request.id,
        name: request.name,
        namespace: request.namespace,
        agent_type: request.agent_type,
        endpoint: request.endpoint,
        capabilities: request.capabilities,
        dependencies: request.dependencies,
        labels: request.labels,
        security_context: request.security_context,
        health_interval_seconds: request.health_interval_seconds,
        timeout_threshold_seconds: request
            .timeout_threshold_seconds
            .unwrap_or(mesh_types::DEFAULT_TIMEOUT_THRESHOLD_SECONDS),
        eviction_threshold_seconds: request
            .eviction_threshold_seconds
            .unwrap_or(mesh_types::DEFAULT_EVICTION_THRESHOLD_SECONDS),
    };

    let dependencies = upsert.dependencies.clone();
    let (agent_id, resource_version) = state.store.upsert_agent(upsert, now).await?;
    let wiring = compute_wiring(&state, &dependencies).await?;

    info!(%agent_id, %resource_version, "agent registered");

    Ok(Json(RegisterResponse {
        agent_id,
        resource_version,
        wiring,
    }))
}

/// `POST /heartbeat`
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(request): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>> {
    let HeartbeatRequest {
        agent_id,
        known_resource_version,
        ..
    } = request;

    // Read the record as it stood before this heartbeat's own bump: that is
    // the version the caller could actually have observed in a prior
    // response, so it is what `known_resource_version` must be compared
    // against to tell whether wiring has changed since.
    let agent = state
        .store
        .get_agent(agent_id)
        .await?
        .ok_or(RegistryError::UnknownAgent)?;
    let wiring_unchanged = known_resource_version == Some(agent.resource_version());
    let dependencies = agent.dependencies().to_vec();

    let resource_version = state.store.touch_heartbeat(agent_id, Utc::now()).await?;

    let wiring = if wiring_unchanged {
        None
    } else {
        Some(compute_wiring(&state, &dependencies).await?)
    };

    Ok(Json(HeartbeatResponse {
        resource_version,
        wiring,
    }))
}

fn summarize(agent: &AgentRecord) -> AgentSummary {
    AgentSummary {
        id: agent.agent_id(),
        name: agent.name().to_string(),
        namespace: agent.namespace().to_string(),
        endpoint: agent.endpoint().to_string(),
        status: agent.status(),
        capabilities: agent.capabilities().to_vec(),
        labels: agent.labels().clone(),
    }
}

/// `GET /agents`
pub async fn discover_agents(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<DiscoverAgentsResponse>> {
    let filter = agent_filter(&query)?;
    let (agents, resource_version) = state.store.list_agents(&filter).await?;

    let agents: Vec<AgentSummary> = agents.iter().map(summarize).collect();
    let count = agents.len();

    Ok(Json(DiscoverAgentsResponse {
        agents,
        count,
        resource_version,
    }))
}

/// `GET /capabilities`
pub async fn discover_capabilities(
    State(state): State<AppState>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<DiscoverCapabilitiesResponse>> {
    let agent_side = agent_filter(&query)?;
    let cap_side = capability_filter(&query)?;
    let (agents, resource_version) = state.store.list_agents(&agent_side).await?;

    let mut rows = Vec::new();
    for agent in &agents {
        for capability in agent.capabilities() {
            if !cap_side.matches(capability, query.fuzzy_match) {
                continue;
            }
            rows.push(CapabilityRow {
                agent_id: agent.agent_id(),
                agent_name: agent.name().to_string(),
                agent_endpoint: agent.endpoint().to_string(),
                agent_status: agent.status(),
                capability_name: capability.name().to_string(),
                capability_version: capability.version().to_string(),
                capability_stability: capability.stability(),
                capability_category: capability.category().to_string(),
                tags: capability.tags().to_vec(),
            });
        }
    }

    let count = rows.len();

    Ok(Json(DiscoverCapabilitiesResponse {
        capabilities: rows,
        count,
        resource_version,
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        resource_version: state.store.current_resource_version().await,
        agent_count: state.store.agent_count().await,
    })
}

/// `DELETE /agents/:id`
pub async fn delete_agent(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    let agent_id = AgentId::from_str(&id).map_err(|_| RegistryError::InvalidQuery {
        field: "id",
        reason: "not a valid agent id".into(),
    })?;

    if state.store.delete_agent(agent_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RegistryError::UnknownAgent)
    }
}

