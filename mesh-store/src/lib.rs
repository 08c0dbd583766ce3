//! The Store: durable, single-writer, multi-reader persistence
//! for the agent table and the resource-version counter.
//!
//! Two implementations are provided: [`MemoryStore`] for tests and
//! in-process embedding, and [`SledStore`] for the production
//! `mesh-registryd` binary. Both implement the same [`Store`] trait so
//! `mesh-registry` never needs to know which backend it is talking to.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod memory;
mod sled_store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesh_resolver::AgentFilter;
use mesh_types::{AgentId, AgentRecord, AgentStatus, Capability, DependencyDescriptor, ResourceVersion};
use std::collections::BTreeMap;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// Current on-disk record schema tag. Bumped whenever [`AgentRecord`]'s
/// serialized shape changes in a way older readers cannot interpret.
pub const SCHEMA_VERSION: u32 = 1;

/// Input to [`Store::upsert_agent`]: the declared fields of a
/// registration request, already validated by the caller (`mesh-registry`).
#[derive(Clone, Debug)]
pub struct UpsertAgent {
    /// Caller-supplied stable identifier, if any.
    pub id: Option<AgentId>,
    /// Agent display name.
    pub name: String,
    /// Logical namespace.
    pub namespace: String,
    /// Free-form agent type/kind string.
    pub agent_type: String,
    /// URL at which peers and the registry can reach the agent.
    pub endpoint: String,
    /// Declared capabilities.
    pub capabilities: Vec<Capability>,
    /// Declared dependency descriptors.
    pub dependencies: Vec<DependencyDescriptor>,
    /// Free-form labels.
    pub labels: BTreeMap<String, String>,
    /// Declared security context string.
    pub security_context: String,
    /// Heartbeat cadence in seconds.
    pub health_interval_seconds: u64,
    /// Seconds of silence before demotion to `degraded`.
    pub timeout_threshold_seconds: u64,
    /// Seconds of silence before demotion to `expired`.
    pub eviction_threshold_seconds: u64,
}

/// Durable, single-writer, multi-reader persistence for the agent table.
///
/// Implementations guarantee: every mutation is flushed before the method
/// returns (durability); operations observe the effects of all prior
/// operations on the same store (single-writer consistency); no reader ever
/// observes a partially applied write.
#[async_trait]
pub trait Store: Send + Sync {
    /// Idempotently creates or updates the agent identified by
    /// `(upsert.namespace, upsert.name)`. Returns the assigned `agent_id`
    /// (new or reused) and the resulting resource version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Full`] if the store has no remaining capacity.
    async fn upsert_agent(&self, upsert: UpsertAgent, now: DateTime<Utc>) -> Result<(AgentId, ResourceVersion)>;

    /// Fetches a single agent record by id.
    ///
    /// # Errors
    ///
    /// This method does not error on a missing id; it returns `Ok(None)`.
    async fn get_agent(&self, id: AgentId) -> Result<Option<AgentRecord>>;

    /// Lists agents matching `filter`, sorted deterministically by
    /// `(namespace, name, agent_id)`, alongside the resource version at
    /// which the snapshot was taken.
    async fn list_agents(&self, filter: &AgentFilter) -> Result<(Vec<AgentRecord>, ResourceVersion)>;

    /// Updates `last_heartbeat_at` and promotes status to `healthy`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownAgent`] if `id` is not present.
    async fn touch_heartbeat(&self, id: AgentId, at: DateTime<Utc>) -> Result<ResourceVersion>;

    /// Transitions `id` to `status`. A no-op (returns `Ok(None)`) if the
    /// agent is already in the target status; otherwise bumps the resource
    /// version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownAgent`] if `id` is not present.
    async fn set_status(&self, id: AgentId, status: AgentStatus) -> Result<Option<ResourceVersion>>;

    /// Removes the agent record entirely. Returns `true` if a record was
    /// removed, `false` if `id` was already absent.
    async fn delete_agent(&self, id: AgentId) -> Result<bool>;

    /// The resource version as of the most recent mutation.
    async fn current_resource_version(&self) -> ResourceVersion;

    /// Number of agent records currently held, regardless of status.
    async fn agent_count(&self) -> usize;

    /// Flushes any buffered writes to durable storage. Backup procedure
    /// is: call this, then copy the underlying file(s) while the
    /// registry process is stopped or paused.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the underlying flush fails.
    async fn checkpoint(&self) -> Result<()>;
}
