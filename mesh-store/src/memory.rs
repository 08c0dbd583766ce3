//! In-memory [`Store`] implementation, used by `mesh-registry`'s test suite
//! and by any embedder that does not need cross-restart durability.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesh_resolver::AgentFilter;
use mesh_types::{AgentId, AgentRecord, AgentStatus, ResourceVersion};
use tokio::sync::Mutex;

use crate::{Result, Store, StoreError, UpsertAgent};

#[derive(Default)]
struct State {
    agents: HashMap<AgentId, AgentRecord>,
    identity_index: HashMap<(String, String), AgentId>,
    resource_version: ResourceVersion,
}

impl State {
    fn next_version(&mut self) -> ResourceVersion {
        self.resource_version = self.resource_version.next();
        self.resource_version
    }
}

/// Non-durable `Store` backed by a single [`tokio::sync::Mutex`]. All
/// operations serialize through that lock, which is the same single-writer
/// discipline [`crate::SledStore`] provides, minus the flush to disk.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_agent(&self, upsert: UpsertAgent, now: DateTime<Utc>) -> Result<(AgentId, ResourceVersion)> {
        let mut state = self.state.lock().await;
        let identity = (upsert.namespace.clone(), upsert.name.clone());

        if let Some(&existing_id) = state.identity_index.get(&identity) {
            let version = state.next_version();
            let agent_id = upsert.id.unwrap_or(existing_id);
            let record = state
                .agents
                .get_mut(&existing_id)
                .expect("identity index points to a missing record");
            record.reregister(
                agent_id,
                upsert.agent_type,
                upsert.endpoint,
                upsert.capabilities,
                upsert.dependencies,
                upsert.labels,
                upsert.security_context,
                upsert.health_interval_seconds,
                upsert.timeout_threshold_seconds,
                upsert.eviction_threshold_seconds,
                now,
            );
            record.bump_resource_version(version);

            if agent_id != existing_id {
                let record = state.agents.remove(&existing_id).expect("just updated");
                state.agents.insert(agent_id, record);
                state.identity_index.insert(identity, agent_id);
            }

            return Ok((agent_id, version));
        }

        let agent_id = upsert.id.unwrap_or_else(AgentId::random);
        let mut record = AgentRecord::new(
            agent_id,
            upsert.name,
            upsert.namespace,
            upsert.agent_type,
            upsert.endpoint,
            upsert.capabilities,
            upsert.dependencies,
            upsert.labels,
            upsert.security_context,
            upsert.health_interval_seconds,
            upsert.timeout_threshold_seconds,
            upsert.eviction_threshold_seconds,
            now,
        );
        let version = state.next_version();
        record.bump_resource_version(version);

        state.identity_index.insert(identity, agent_id);
        state.agents.insert(agent_id, record);

        Ok((agent_id, version))
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<AgentRecord>> {
        let state = self.state.lock().await;
        Ok(state.agents.get(&id).cloned())
    }

    async fn list_agents(&self, filter: &AgentFilter) -> Result<(Vec<AgentRecord>, ResourceVersion)> {
        let state = self.state.lock().await;
        let mut matching: Vec<AgentRecord> = state
            .agents
            .values()
            .filter(|agent| filter.matches(agent))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            (a.namespace(), a.name(), a.agent_id().as_uuid()).cmp(&(
                b.namespace(),
                b.name(),
                b.agent_id().as_uuid(),
            ))
        });
        Ok((matching, state.resource_version))
    }

    async fn touch_heartbeat(&self, id: AgentId, at: DateTime<Utc>) -> Result<ResourceVersion> {
        let mut state = self.state.lock().await;
        let version = state.next_version();
        let record = state.agents.get_mut(&id).ok_or(StoreError::UnknownAgent)?;
        record.record_heartbeat(at);
        record.bump_resource_version(version);
        Ok(version)
    }

    async fn set_status(&self, id: AgentId, status: AgentStatus) -> Result<Option<ResourceVersion>> {
        let mut state = self.state.lock().await;
        {
            let record = state.agents.get(&id).ok_or(StoreError::UnknownAgent)?;
            if record.status() == status {
                return Ok(None);
            }
        }
        let version = state.next_version();
        let record = state.agents.get_mut(&id).expect("checked above");
        record.set_status(status);
        record.bump_resource_version(version);
        Ok(Some(version))
    }

    async fn delete_agent(&self, id: AgentId) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(record) = state.agents.remove(&id) else {
            return Ok(false);
        };
        state
            .identity_index
            .remove(&(record.namespace().to_string(), record.name().to_string()));
        state.next_version();
        Ok(true)
    }

    async fn current_resource_version(&self) -> ResourceVersion {
        self.state.lock().await.resource_version
    }

    async fn agent_count(&self) -> usize {
        self.state.lock().await.agents.len()
    }

    async fn checkpoint(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;

    fn upsert(namespace: &str, name: &str) -> UpsertAgent {
        UpsertAgent {
            id: None,
            name: name.to_string(),
            namespace: namespace.to_string(),
            agent_type: "worker".to_string(),
            endpoint: format!("http://{name}.local"),
            capabilities: vec![],
            dependencies: vec![],
            labels: BTreeMap::new(),
            security_context: String::new(),
            health_interval_seconds: 10,
            timeout_threshold_seconds: 30,
            eviction_threshold_seconds: 90,
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_identity_and_bumps_version() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (id1, v1) = store.upsert_agent(upsert("n", "a"), now).await.unwrap();
        let (id2, v2) = store.upsert_agent(upsert("n", "a"), now).await.unwrap();

        assert_eq!(id1, id2);
        assert!(v2 > v1);
        assert_eq!(store.agent_count().await, 1);
    }

    #[tokio::test]
    async fn heartbeat_unknown_agent_errors() {
        let store = MemoryStore::new();
        let err = store
            .touch_heartbeat(AgentId::random(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownAgent));
    }

    #[tokio::test]
    async fn set_status_is_noop_when_already_in_target_state() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let (id, _) = store.upsert_agent(upsert("n", "a"), now).await.unwrap();

        // New agents start Pending; setting Pending again must be a no-op.
        let result = store.set_status(id, AgentStatus::Pending).await.unwrap();
        assert!(result.is_none());

        let result = store.set_status(id, AgentStatus::Healthy).await.unwrap();
        assert!(result.is_some());
    }

    #[tokio::test]
    async fn list_agents_sorted_deterministically() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.upsert_agent(upsert("n", "zeta"), now).await.unwrap();
        store.upsert_agent(upsert("n", "alpha"), now).await.unwrap();

        let (agents, _) = store.list_agents(&AgentFilter::default()).await.unwrap();
        assert_eq!(agents[0].name(), "alpha");
        assert_eq!(agents[1].name(), "zeta");
    }
}
