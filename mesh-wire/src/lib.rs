//! JSON wire types for the Registry API (see `POST /agents/register_with_metadata`,
//! `POST /heartbeat`, `GET /agents`, `GET /capabilities`, `GET /health`).
//!
//! These types are shared verbatim by `mesh-registry` (the server) and
//! `mesh-client` (the agent-side client) so the two halves of the wire
//! contract can never drift. Domain types from `mesh-types` (`Capability`,
//! `DependencyDescriptor`, `AgentId`, `AgentStatus`, `WiringEntry`) are
//! embedded directly rather than duplicated into parallel wire-only structs,
//! since both ends of this wire are owned by this workspace.

#![warn(missing_docs, clippy::pedantic)]

use std::collections::BTreeMap;

use mesh_types::{AgentId, AgentStatus, Capability, DependencyDescriptor, ResourceVersion, WiringEntry};
use serde::{Deserialize, Serialize};

/// Body of `POST /agents/register_with_metadata`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Optional caller-supplied stable identifier; the registry assigns one
    /// if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AgentId>,
    /// Agent display name. Combined with `namespace`, uniquely identifies the agent.
    pub name: String,
    /// Logical namespace.
    pub namespace: String,
    /// Free-form agent type/kind string.
    pub agent_type: String,
    /// URL at which peers and the registry can reach this agent.
    pub endpoint: String,
    /// Declared capabilities.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    /// Declared dependency descriptors.
    #[serde(default)]
    pub dependencies: Vec<DependencyDescriptor>,
    /// Free-form labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Declared security context string.
    #[serde(default)]
    pub security_context: String,
    /// Heartbeat cadence in seconds.
    pub health_interval_seconds: u64,
    /// Seconds of silence before demotion to `degraded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_threshold_seconds: Option<u64>,
    /// Seconds of silence before demotion to `expired`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eviction_threshold_seconds: Option<u64>,
}

/// Response to a successful registration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// The agent's (possibly newly assigned) stable identifier.
    pub agent_id: AgentId,
    /// Resource version at which this registration was committed.
    pub resource_version: ResourceVersion,
    /// Wiring for each declared dependency, indexed by `dependency_index`.
    pub wiring: Vec<WiringEntry>,
}

/// Body of `POST /heartbeat`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    /// Identifier of the heartbeating agent.
    pub agent_id: AgentId,
    /// Optional status hint; informational only, the registry still computes
    /// status itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_hint: Option<AgentStatus>,
    /// Optional free-form metadata carried for observability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// The resource version the caller last observed; if it still matches
    /// and nothing has changed, `wiring` is omitted from the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_resource_version: Option<ResourceVersion>,
}

/// Response to a heartbeat.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeartbeatResponse {
    /// Resource version as of this heartbeat.
    pub resource_version: ResourceVersion,
    /// Present unless `known_resource_version` matched and nothing changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiring: Option<Vec<WiringEntry>>,
}

/// Query parameters accepted by `GET /agents` and `GET /capabilities`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiscoverQuery {
    /// Restrict to a single namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Restrict to agents offering a capability with this name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    /// Restrict to capabilities in this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability_category: Option<String>,
    /// Restrict to agents in this status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    /// Comma-separated `k=v` pairs, all of which must match the agent's labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
    /// Semver range the capability version must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_constraint: Option<String>,
    /// Comma-separated tags, all of which must be present on the capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Enables case-insensitive substring matching with an edit-distance
    /// ranking factor, instead of exact matching.
    #[serde(default)]
    pub fuzzy_match: bool,
    /// Whether to include capabilities with `stability: deprecated`.
    #[serde(default)]
    pub include_deprecated: bool,
}

/// One row of `GET /agents`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Agent identifier.
    pub id: AgentId,
    /// Agent display name.
    pub name: String,
    /// Logical namespace.
    pub namespace: String,
    /// Endpoint at which the agent can be reached.
    pub endpoint: String,
    /// Current liveness status.
    pub status: AgentStatus,
    /// Declared capabilities.
    pub capabilities: Vec<Capability>,
    /// Free-form labels.
    pub labels: BTreeMap<String, String>,
}

/// Response to `GET /agents`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoverAgentsResponse {
    /// Matching agents, sorted deterministically by `(namespace, name, agent_id)`.
    pub agents: Vec<AgentSummary>,
    /// Number of matching agents.
    pub count: usize,
    /// Resource version at which this query was computed.
    pub resource_version: ResourceVersion,
}

/// One row of `GET /capabilities`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CapabilityRow {
    /// Owning agent's identifier.
    pub agent_id: AgentId,
    /// Owning agent's display name.
    pub agent_name: String,
    /// Owning agent's endpoint.
    pub agent_endpoint: String,
    /// Owning agent's current liveness status.
    pub agent_status: AgentStatus,
    /// Capability name.
    pub capability_name: String,
    /// Capability version.
    pub capability_version: String,
    /// Capability stability.
    pub capability_stability: mesh_types::Stability,
    /// Capability category.
    pub capability_category: String,
    /// Capability tags.
    pub tags: Vec<String>,
}

/// Response to `GET /capabilities`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoverCapabilitiesResponse {
    /// Matching capability rows.
    pub capabilities: Vec<CapabilityRow>,
    /// Number of matching rows.
    pub count: usize,
    /// Resource version at which this query was computed.
    pub resource_version: ResourceVersion,
}

/// Response to `GET /health`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    /// Current resource version.
    pub resource_version: ResourceVersion,
    /// Number of agent records currently held by the store.
    pub agent_count: usize,
}

/// Body returned alongside non-2xx responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error code, e.g. `"unknown_agent"`.
    pub error: String,
    /// Human-readable detail.
    pub message: String,
}
