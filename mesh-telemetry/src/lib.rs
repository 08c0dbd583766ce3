//! Tracing setup and health-snapshot types shared by the registry binary
//! and agent runtimes.
//!
//! Library crates in this workspace never install a subscriber themselves —
//! only [`init_subscriber`], called once from a binary's `main`, does that.
//! Library code only ever emits `tracing` events.

#![warn(missing_docs, clippy::pedantic)]

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber with an `env_filter` driven by
/// `RUST_LOG`, falling back to `debug` or `info` depending on `debug`.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed; callers should
/// invoke this exactly once, at process startup.
pub fn init_subscriber(debug: bool) {
    let default_directive = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Coarse health state surfaced by both `GET /health` (registry) and an
/// agent's own in-process self-check.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Fully operational.
    Ok,
    /// Operational but with reduced capability (e.g. the store is slow, or
    /// an agent's wiring cache is stale past its heartbeat interval).
    Degraded,
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

/// A point-in-time health report. The registry's `GET /health` handler
/// builds one from `(agent_count, resource_version)`; an agent can build one
/// from its own wiring-cache staleness to expose locally without running a
/// second HTTP server for it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Overall state.
    pub status: HealthState,
    /// Resource version as of this snapshot, when applicable.
    pub resource_version: Option<mesh_types::ResourceVersion>,
    /// Number of agent records held, when applicable.
    pub agent_count: Option<usize>,
}

impl HealthSnapshot {
    /// Builds a registry-side snapshot. `status` is `Degraded` whenever the
    /// caller judges the store to be in a non-nominal state (e.g. a recent
    /// checkpoint failure); this function does not itself probe anything.
    #[must_use]
    pub const fn registry(status: HealthState, resource_version: mesh_types::ResourceVersion, agent_count: usize) -> Self {
        Self {
            status,
            resource_version: Some(resource_version),
            agent_count: Some(agent_count),
        }
    }

    /// Builds an agent-side snapshot describing only whether its wiring
    /// cache is fresh.
    #[must_use]
    pub const fn agent(status: HealthState) -> Self {
        Self {
            status,
            resource_version: None,
            agent_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_state_display() {
        assert_eq!(HealthState::Ok.to_string(), "ok");
        assert_eq!(HealthState::Degraded.to_string(), "degraded");
    }

    #[test]
    fn registry_snapshot_carries_counts() {
        let snapshot = HealthSnapshot::registry(HealthState::Ok, mesh_types::ResourceVersion::from(3), 2);
        assert_eq!(snapshot.agent_count, Some(2));
    }
}
