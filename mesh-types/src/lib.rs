//! Core shared data model for MCP Mesh: agent identity, capability
//! descriptors, dependency descriptors, the agent record, and derived
//! wiring entries.

#![warn(missing_docs, clippy::pedantic)]

mod capability;
mod dependency;
mod error;
mod ids;
mod record;
mod status;
mod wiring;

/// Capability descriptors and supporting builders.
pub use capability::{Capability, CapabilityBuilder, Stability};
/// Dependency descriptors and supporting builders.
pub use dependency::{DependencyDescriptor, DependencyDescriptorBuilder, DependencyKind};
/// Error type and result alias shared across the mesh crates.
pub use error::{Error, Result};
/// Unique identifier for agents within the mesh.
pub use ids::AgentId;
/// The registry's authoritative per-agent record and its resource-version counter.
pub use record::{
    AgentRecord, ResourceVersion, DEFAULT_EVICTION_THRESHOLD_SECONDS,
    DEFAULT_TIMEOUT_THRESHOLD_SECONDS,
};
/// Agent liveness status.
pub use status::AgentStatus;
/// Derived wiring types returned by the resolver.
pub use wiring::{WiringCandidate, WiringEntry};
