//! Agent liveness status.

use serde::{Deserialize, Serialize};

/// Liveness state of an [`crate::AgentRecord`].
///
/// Transitions are driven exclusively by timestamp comparison (see
/// `mesh-health`); this type carries no transition logic of its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Registered but no heartbeat received yet.
    Pending,
    /// Heartbeat received within `timeout_threshold_seconds`.
    Healthy,
    /// No heartbeat for longer than `timeout_threshold_seconds` but less than
    /// `eviction_threshold_seconds`.
    Degraded,
    /// No heartbeat for longer than `eviction_threshold_seconds`. Excluded
    /// from resolver candidate sets but retained in the store.
    Expired,
}

impl AgentStatus {
    /// Whether a resolver should consider an agent in this status as a
    /// candidate. Only `Healthy` agents are eligible.
    #[must_use]
    pub const fn is_resolvable(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}
