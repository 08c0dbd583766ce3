//! The Health Timer: a cooperative scan loop that transitions
//! agent status purely by comparing `now - last_heartbeat_at` against each
//! agent's configured thresholds. Never performs network I/O; never blocks
//! on anything beyond the Store.

#![warn(missing_docs, clippy::pedantic)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mesh_resolver::AgentFilter;
use mesh_store::Store;
use mesh_types::{AgentId, AgentStatus};
use tracing::{debug, warn};

/// Lower bound on the computed scan interval.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_secs(1);
/// Upper bound on the computed scan interval.
pub const MAX_SCAN_INTERVAL: Duration = Duration::from_secs(10);

/// Pure state-machine step: given the current status and how long an agent
/// has been silent relative to its configured thresholds, returns the
/// status a scan should transition it to.
///
/// Only `healthy` and `degraded` are ever demoted by a scan; `pending` only
/// ever advances on a successful heartbeat (see [`mesh_types::AgentRecord::record_heartbeat`])
/// and `expired` agents are retained as-is until a fresh registration or
/// heartbeat arrives — a scan never promotes a record.
#[must_use]
pub fn target_status(
    current: AgentStatus,
    now: DateTime<Utc>,
    last_heartbeat_at: DateTime<Utc>,
    timeout_threshold: Duration,
    eviction_threshold: Duration,
) -> AgentStatus {
    let silence = (now - last_heartbeat_at)
        .to_std()
        .unwrap_or(Duration::ZERO);

    match current {
        AgentStatus::Healthy => {
            if silence > eviction_threshold {
                AgentStatus::Expired
            } else if silence > timeout_threshold {
                AgentStatus::Degraded
            } else {
                AgentStatus::Healthy
            }
        }
        AgentStatus::Degraded => {
            if silence > eviction_threshold {
                AgentStatus::Expired
            } else {
                AgentStatus::Degraded
            }
        }
        AgentStatus::Pending | AgentStatus::Expired => current,
    }
}

/// Computes the scan cadence for the current agent population: half the
/// smallest `timeout_threshold_seconds` across all registered agents,
/// bounded to `[MIN_SCAN_INTERVAL, MAX_SCAN_INTERVAL]`. An empty population
/// uses the upper bound.
#[must_use]
pub fn scan_interval(timeout_thresholds: impl Iterator<Item = Duration>) -> Duration {
    let smallest = timeout_thresholds.min();
    match smallest {
        Some(smallest) => (smallest / 2).clamp(MIN_SCAN_INTERVAL, MAX_SCAN_INTERVAL),
        None => MAX_SCAN_INTERVAL,
    }
}

/// Runs the Health Timer loop against `store` until `shutdown` resolves.
///
/// Each scan takes a snapshot of every agent record, computes the target
/// status per-agent, and issues `set_status` only for agents whose target
/// differs from their current status (the Store's `set_status` is itself a
/// no-op when already in the target state, but skipping the call avoids an
/// unnecessary resource-version bump on an unrelated fast path).
pub async fn run(store: Arc<dyn Store>, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
    loop {
        let (agents, _version) = match store.list_agents(&AgentFilter::default()).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(?err, "health timer failed to snapshot agent table");
                (Vec::new(), mesh_types::ResourceVersion::zero())
            }
        };

        let interval = scan_interval(
            agents
                .iter()
                .map(|a| Duration::from_secs(a.timeout_threshold_seconds())),
        );

        let now = Utc::now();
        for agent in &agents {
            let target = target_status(
                agent.status(),
                now,
                agent.last_heartbeat_at(),
                Duration::from_secs(agent.timeout_threshold_seconds()),
                Duration::from_secs(agent.eviction_threshold_seconds()),
            );
            if target != agent.status() {
                if let Err(err) = store.set_status(agent.agent_id(), target).await {
                    warn!(agent_id = %agent.agent_id(), ?err, "health timer failed to transition agent status");
                } else {
                    debug!(agent_id = %agent.agent_id(), from = %agent.status(), to = %target, "health timer transitioned agent status");
                }
            }
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            _ = &mut shutdown => {
                debug!("health timer shutting down");
                return;
            }
        }
    }
}

/// Handle controlling a spawned Health Timer task.
pub struct HealthTimerHandle {
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    join: tokio::task::JoinHandle<()>,
}

impl HealthTimerHandle {
    /// Spawns the Health Timer as a background task against `store`.
    #[must_use]
    pub fn spawn(store: Arc<dyn Store>) -> Self {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let join = tokio::spawn(run(store, rx));
        Self {
            shutdown_tx: Some(tx),
            join,
        }
    }

    /// Signals the timer to stop and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }
}

/// Re-exported for callers that need to identify which agent a status
/// change applies to without depending on `mesh-types` directly.
pub type AgentIdentifier = AgentId;

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn healthy_stays_healthy_at_exact_boundary() {
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(30);
        let target = target_status(AgentStatus::Healthy, now, last, secs(30), secs(90));
        assert_eq!(target, AgentStatus::Healthy, "boundary demotion must use strict inequality");
    }

    #[test]
    fn healthy_demotes_to_degraded_past_timeout() {
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(31);
        let target = target_status(AgentStatus::Healthy, now, last, secs(30), secs(90));
        assert_eq!(target, AgentStatus::Degraded);
    }

    #[test]
    fn degraded_demotes_to_expired_past_eviction() {
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(91);
        let target = target_status(AgentStatus::Degraded, now, last, secs(30), secs(90));
        assert_eq!(target, AgentStatus::Expired);
    }

    #[test]
    fn healthy_can_jump_straight_to_expired() {
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(1000);
        let target = target_status(AgentStatus::Healthy, now, last, secs(30), secs(90));
        assert_eq!(target, AgentStatus::Expired);
    }

    #[test]
    fn expired_and_pending_are_never_touched_by_a_scan() {
        let now = Utc::now();
        let last = now - chrono::Duration::seconds(5);
        assert_eq!(
            target_status(AgentStatus::Expired, now, last, secs(30), secs(90)),
            AgentStatus::Expired
        );
        assert_eq!(
            target_status(AgentStatus::Pending, now, last, secs(30), secs(90)),
            AgentStatus::Pending
        );
    }

    #[test]
    fn scan_interval_is_half_the_smallest_timeout_bounded() {
        assert_eq!(scan_interval(vec![secs(4)].into_iter()), secs(2));
        assert_eq!(scan_interval(vec![secs(1)].into_iter()), MIN_SCAN_INTERVAL);
        assert_eq!(scan_interval(vec![secs(100)].into_iter()), MAX_SCAN_INTERVAL);
        assert_eq!(scan_interval(std::iter::empty()), MAX_SCAN_INTERVAL);
    }

    #[tokio::test]
    async fn expiration_is_monotonic_with_no_intervening_heartbeat() {
        let store: Arc<dyn Store> = Arc::new(mesh_store::MemoryStore::new());
        let now = Utc::now();
        let (id, _) = store
            .upsert_agent(
                mesh_store::UpsertAgent {
                    id: None,
                    name: "a".into(),
                    namespace: "n".into(),
                    agent_type: "worker".into(),
                    endpoint: "http://a.local".into(),
                    capabilities: vec![],
                    dependencies: vec![],
                    labels: Default::default(),
                    security_context: String::new(),
                    health_interval_seconds: 5,
                    timeout_threshold_seconds: 5,
                    eviction_threshold_seconds: 15,
                },
                now,
            )
            .await
            .unwrap();
        store.touch_heartbeat(id, now).await.unwrap();

        let record = store.get_agent(id).await.unwrap().unwrap();
        let first = target_status(
            record.status(),
            now + chrono::Duration::seconds(6),
            record.last_heartbeat_at(),
            secs(5),
            secs(15),
        );
        let second = target_status(
            record.status(),
            now + chrono::Duration::seconds(16),
            record.last_heartbeat_at(),
            secs(5),
            secs(15),
        );
        assert_eq!(first, AgentStatus::Degraded);
        assert_eq!(second, AgentStatus::Expired);
    }
}
