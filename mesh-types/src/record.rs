//! The Agent Record: identity, network, declared, and state fields persisted
//! by the Store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AgentId, AgentStatus, Capability, DependencyDescriptor};

/// A single process-wide monotonically increasing counter. Every mutation to
/// the Store increments it; clients treat it as an opaque cursor.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVersion(u64);

impl ResourceVersion {
    /// The initial resource version, before any mutation has occurred.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the next resource version in sequence.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw integer value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for ResourceVersion {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The registry's authoritative record of a single agent: its identity,
/// network endpoint, declared capabilities/dependencies, and current
/// liveness state.
///
/// `(namespace, name)` uniquely identifies an agent across restarts; a
/// restart registering under the same identity overwrites this record and
/// bumps `resource_version`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRecord {
    agent_id: AgentId,
    name: String,
    namespace: String,
    agent_type: String,
    endpoint: String,
    capabilities: Vec<Capability>,
    dependencies: Vec<DependencyDescriptor>,
    labels: BTreeMap<String, String>,
    security_context: String,
    health_interval_seconds: u64,
    timeout_threshold_seconds: u64,
    eviction_threshold_seconds: u64,
    status: AgentStatus,
    last_heartbeat_at: DateTime<Utc>,
    first_seen_at: DateTime<Utc>,
    resource_version: ResourceVersion,
}

/// Default timeout applied when a registration omits `timeout_threshold_seconds`.
pub const DEFAULT_TIMEOUT_THRESHOLD_SECONDS: u64 = 30;
/// Default eviction applied when a registration omits `eviction_threshold_seconds`.
pub const DEFAULT_EVICTION_THRESHOLD_SECONDS: u64 = 90;

impl AgentRecord {
    /// Constructs a new record at `first_seen_at`, in `Pending` status, with
    /// `resource_version` zero. The Store is responsible for assigning the
    /// first real resource version on insert.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        agent_id: AgentId,
        name: String,
        namespace: String,
        agent_type: String,
        endpoint: String,
        capabilities: Vec<Capability>,
        dependencies: Vec<DependencyDescriptor>,
        labels: BTreeMap<String, String>,
        security_context: String,
        health_interval_seconds: u64,
        timeout_threshold_seconds: u64,
        eviction_threshold_seconds: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            agent_id,
            name,
            namespace,
            agent_type,
            endpoint,
            capabilities,
            dependencies,
            labels,
            security_context,
            health_interval_seconds,
            timeout_threshold_seconds,
            eviction_threshold_seconds,
            status: AgentStatus::Pending,
            last_heartbeat_at: now,
            first_seen_at: now,
            resource_version: ResourceVersion::zero(),
        }
    }

    /// `(namespace, name)` tuple that uniquely identifies this agent across restarts.
    #[must_use]
    pub fn identity_key(&self) -> (&str, &str) {
        (&self.namespace, &self.name)
    }

    /// Server-assigned or caller-supplied stable identifier.
    #[must_use]
    pub const fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Agent display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical namespace the agent was registered under.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Free-form agent type/kind string.
    #[must_use]
    pub fn agent_type(&self) -> &str {
        &self.agent_type
    }

    /// URL at which peers and the registry can reach the agent. Opaque to the registry.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Declared capabilities, in registration order.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Declared dependency descriptors, in registration order.
    #[must_use]
    pub fn dependencies(&self) -> &[DependencyDescriptor] {
        &self.dependencies
    }

    /// Free-form labels used by label-selector matching.
    #[must_use]
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    /// Declared security context string, opaque to the registry.
    #[must_use]
    pub fn security_context(&self) -> &str {
        &self.security_context
    }

    /// Configured heartbeat cadence.
    #[must_use]
    pub const fn health_interval_seconds(&self) -> u64 {
        self.health_interval_seconds
    }

    /// Seconds of silence after which the Health Timer demotes to `Degraded`.
    #[must_use]
    pub const fn timeout_threshold_seconds(&self) -> u64 {
        self.timeout_threshold_seconds
    }

    /// Seconds of silence after which the Health Timer demotes to `Expired`.
    #[must_use]
    pub const fn eviction_threshold_seconds(&self) -> u64 {
        self.eviction_threshold_seconds
    }

    /// Current liveness status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Timestamp of the most recent accepted heartbeat (or registration, for
    /// a record that has never received one).
    #[must_use]
    pub const fn last_heartbeat_at(&self) -> DateTime<Utc> {
        self.last_heartbeat_at
    }

    /// Timestamp at which this identity was first registered.
    #[must_use]
    pub const fn first_seen_at(&self) -> DateTime<Utc> {
        self.first_seen_at
    }

    /// Current resource version; bumped on every Store mutation to this record.
    #[must_use]
    pub const fn resource_version(&self) -> ResourceVersion {
        self.resource_version
    }

    /// Sets the status in place. Callers (the Store) are responsible for
    /// bumping `resource_version` alongside any call that changes observable
    /// state.
    pub fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
    }

    /// Records a heartbeat at `at`. `last_heartbeat_at` never decreases;
    /// callers must never invoke this with an `at` older than the current value.
    pub fn record_heartbeat(&mut self, at: DateTime<Utc>) {
        debug_assert!(at >= self.last_heartbeat_at, "heartbeat timestamps must be monotonic");
        self.last_heartbeat_at = at;
        self.status = AgentStatus::Healthy;
    }

    /// Replaces the declared fields from a fresh registration of the same
    /// identity, preserving `first_seen_at`.
    #[allow(clippy::too_many_arguments)]
    pub fn reregister(
        &mut self,
        agent_id: AgentId,
        agent_type: String,
        endpoint: String,
        capabilities: Vec<Capability>,
        dependencies: Vec<DependencyDescriptor>,
        labels: BTreeMap<String, String>,
        security_context: String,
        health_interval_seconds: u64,
        timeout_threshold_seconds: u64,
        eviction_threshold_seconds: u64,
        now: DateTime<Utc>,
    ) {
        self.agent_id = agent_id;
        self.agent_type = agent_type;
        self.endpoint = endpoint;
        self.capabilities = capabilities;
        self.dependencies = dependencies;
        self.labels = labels;
        self.security_context = security_context;
        self.health_interval_seconds = health_interval_seconds;
        self.timeout_threshold_seconds = timeout_threshold_seconds;
        self.eviction_threshold_seconds = eviction_threshold_seconds;
        self.last_heartbeat_at = now;
        self.status = AgentStatus::Pending;
    }

    /// Assigns a new resource version, returning it.
    pub fn bump_resource_version(&mut self, next: ResourceVersion) -> ResourceVersion {
        self.resource_version = next;
        next
    }
}
