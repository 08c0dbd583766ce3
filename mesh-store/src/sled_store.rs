//! `sled`-backed [`Store`] implementation for `mesh-registryd`.
//!
//! A primary `agents` tree keyed by `agent_id`, an `identity_index` tree
//! mapping `(namespace, name)` to `agent_id` for idempotent upserts, and a
//! `meta` tree holding the process-wide resource-version counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mesh_resolver::AgentFilter;
use mesh_types::{AgentId, AgentRecord, AgentStatus, ResourceVersion};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{Result, Store, StoreError, UpsertAgent, SCHEMA_VERSION};

const RESOURCE_VERSION_KEY: &[u8] = b"resource_version";

#[derive(Serialize, Deserialize)]
struct Envelope {
    schema_version: u32,
    record: AgentRecord,
}

/// Durable, embedded key/value store backed by `sled`.
///
/// All mutating operations take an internal async [`Mutex`] before touching
/// any tree, so that a read-modify-write spanning `agents` and
/// `identity_index` is never observed half-applied by a concurrent reader:
/// readers only ever see the state before or after a full mutation, never a
/// partial one.
pub struct SledStore {
    db: sled::Db,
    agents: sled::Tree,
    identity_index: sled::Tree,
    meta: sled::Tree,
    writer: Mutex<()>,
}

impl SledStore {
    /// Opens (creating if absent) a sled database rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] if the database exists but cannot be
    /// opened, which callers should treat as fatal at startup.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = sled::open(path)?;
        let agents = db.open_tree("agents")?;
        let identity_index = db.open_tree("identity_index")?;
        let meta = db.open_tree("meta")?;
        Ok(Self {
            db,
            agents,
            identity_index,
            meta,
            writer: Mutex::new(()),
        })
    }

    fn identity_key(namespace: &str, name: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(namespace.len() + name.len() + 1);
        key.extend_from_slice(namespace.as_bytes());
        key.push(0);
        key.extend_from_slice(name.as_bytes());
        key
    }

    fn decode_record(bytes: &[u8]) -> Result<AgentRecord> {
        let envelope: Envelope = serde_json::from_slice(bytes)?;
        if envelope.schema_version > SCHEMA_VERSION {
            return Err(StoreError::Incompatible {
                found: envelope.schema_version,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(envelope.record)
    }

    fn encode_record(record: &AgentRecord) -> Result<Vec<u8>> {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            record: record.clone(),
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    fn load_resource_version(&self) -> Result<ResourceVersion> {
        match self.meta.get(RESOURCE_VERSION_KEY)? {
            Some(bytes) => {
                let raw = u64::from_le_bytes(bytes.as_ref().try_into().map_err(|_| StoreError::Corrupt {
                    reason: "resource_version record has the wrong width".into(),
                })?);
                Ok(ResourceVersion::from(raw))
            }
            None => Ok(ResourceVersion::zero()),
        }
    }

    fn store_resource_version(&self, version: ResourceVersion) -> Result<()> {
        self.meta
            .insert(RESOURCE_VERSION_KEY, &version.value().to_le_bytes())?;
        Ok(())
    }

    fn next_resource_version(&self) -> Result<ResourceVersion> {
        let next = self.load_resource_version()?.next();
        self.store_resource_version(next)?;
        Ok(next)
    }

    fn flush_all(&self) -> Result<()> {
        self.agents.flush()?;
        self.identity_index.flush()?;
        self.meta.flush()?;
        Ok(())
    }
}

#[async_trait]
impl Store for SledStore {
    async fn upsert_agent(&self, upsert: UpsertAgent, now: DateTime<Utc>) -> Result<(AgentId, ResourceVersion)> {
        let _guard = self.writer.lock().await;
        let identity_key = Self::identity_key(&upsert.namespace, &upsert.name);

        let (agent_id, mut record) = match self.identity_index.get(&identity_key)? {
            Some(existing_bytes) => {
                let existing_id: AgentId = serde_json::from_slice(&existing_bytes)?;
                let mut record = Self::decode_record(
                    &self
                        .agents
                        .get(existing_id.as_uuid().as_bytes())?
                        .ok_or(StoreError::Corrupt {
                            reason: "identity index points at a missing agent row".into(),
                        })?,
                )?;
                let agent_id = upsert.id.unwrap_or(existing_id);
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
                if agent_id != existing_id {
                    self.agents.remove(existing_id.as_uuid().as_bytes())?;
                }
                (agent_id, record)
            }
            None => {
                let agent_id = upsert.id.unwrap_or_else(AgentId::random);
                let record = AgentRecord::new(
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
                (agent_id, record)
            }
        };

        let version = self.next_resource_version()?;
        record.bump_resource_version(version);

        self.agents
            .insert(agent_id.as_uuid().as_bytes(), Self::encode_record(&record)?)?;
        self.identity_index
            .insert(identity_key, serde_json::to_vec(&agent_id)?)?;
        self.flush_all()?;

        Ok((agent_id, version))
    }

    async fn get_agent(&self, id: AgentId) -> Result<Option<AgentRecord>> {
        match self.agents.get(id.as_uuid().as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode_record(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list_agents(&self, filter: &AgentFilter) -> Result<(Vec<AgentRecord>, ResourceVersion)> {
        let mut matching = Vec::new();
        for entry in self.agents.iter() {
            let (_, bytes) = entry?;
            let record = Self::decode_record(&bytes)?;
            if filter.matches(&record) {
                matching.push(record);
            }
        }
        matching.sort_by(|a, b| {
            (a.namespace(), a.name(), a.agent_id().as_uuid()).cmp(&(
                b.namespace(),
                b.name(),
                b.agent_id().as_uuid(),
            ))
        });
        Ok((matching, self.load_resource_version()?))
    }

    async fn touch_heartbeat(&self, id: AgentId, at: DateTime<Utc>) -> Result<ResourceVersion> {
        let _guard = self.writer.lock().await;
        let mut record = Self::decode_record(
            &self
                .agents
                .get(id.as_uuid().as_bytes())?
                .ok_or(StoreError::UnknownAgent)?,
        )?;
        record.record_heartbeat(at);
        let version = self.next_resource_version()?;
        record.bump_resource_version(version);
        self.agents
            .insert(id.as_uuid().as_bytes(), Self::encode_record(&record)?)?;
        self.flush_all()?;
        Ok(version)
    }

    async fn set_status(&self, id: AgentId, status: AgentStatus) -> Result<Option<ResourceVersion>> {
        let _guard = self.writer.lock().await;
        let mut record = Self::decode_record(
            &self
                .agents
                .get(id.as_uuid().as_bytes())?
                .ok_or(StoreError::UnknownAgent)?,
        )?;
        if record.status() == status {
            return Ok(None);
        }
        record.set_status(status);
        let version = self.next_resource_version()?;
        record.bump_resource_version(version);
        self.agents
            .insert(id.as_uuid().as_bytes(), Self::encode_record(&record)?)?;
        self.flush_all()?;
        Ok(Some(version))
    }

    async fn delete_agent(&self, id: AgentId) -> Result<bool> {
        let _guard = self.writer.lock().await;
        let Some(bytes) = self.agents.remove(id.as_uuid().as_bytes())? else {
            return Ok(false);
        };
        let record = Self::decode_record(&bytes)?;
        self.identity_index
            .remove(Self::identity_key(record.namespace(), record.name()))?;
        self.next_resource_version()?;
        self.flush_all()?;
        Ok(true)
    }

    async fn current_resource_version(&self) -> ResourceVersion {
        self.load_resource_version().unwrap_or(ResourceVersion::zero())
    }

    async fn agent_count(&self) -> usize {
        self.agents.len()
    }

    async fn checkpoint(&self) -> Result<()> {
        self.db.flush()?;
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
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc::now();
        let agent_id = {
            let store = SledStore::open(dir.path()).unwrap();
            let (id, _) = store.upsert_agent(upsert("n", "a"), now).await.unwrap();
            store.checkpoint().await.unwrap();
            id
        };

        let store = SledStore::open(dir.path()).unwrap();
        let record = store.get_agent(agent_id).await.unwrap().expect("persisted");
        assert_eq!(record.name(), "a");
    }

    #[tokio::test]
    async fn upsert_same_identity_reuses_agent_id_and_bumps_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let now = Utc::now();
        let (id1, v1) = store.upsert_agent(upsert("n", "a"), now).await.unwrap();
        let (id2, v2) = store.upsert_agent(upsert("n", "a"), now).await.unwrap();
        assert_eq!(id1, id2);
        assert!(v2 > v1);
    }
}
