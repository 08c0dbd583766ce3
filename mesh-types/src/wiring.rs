//! Wiring: the registry's deterministic mapping from an agent's dependency
//! descriptors to concrete peer endpoints. Always derived, never persisted.

use serde::{Deserialize, Serialize};

use crate::AgentId;

/// One ranked candidate peer satisfying a dependency.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WiringCandidate {
    /// Identifier of the peer agent offering the matched capability.
    pub agent_id: AgentId,
    /// Endpoint at which the peer can be reached.
    pub endpoint: String,
    /// Name of the capability that satisfied the dependency.
    pub capability_name: String,
    /// Version of the capability that satisfied the dependency.
    pub capability_version: String,
}

/// The ranked candidate list for a single dependency descriptor, identified
/// by its position in the owning agent's `dependencies` list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WiringEntry {
    /// Index into the requesting agent's declared `dependencies` array.
    pub dependency_index: usize,
    /// Ranked candidates; empty when the dependency is currently unsatisfied.
    pub candidates: Vec<WiringCandidate>,
}
