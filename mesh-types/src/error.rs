//! Shared error definitions for the mesh data model.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the mesh crates that depend on [`mesh-types`](crate).
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing or validating mesh data-model types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided agent identifier could not be parsed.
    #[error("invalid agent id: {source}")]
    InvalidAgentId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Capability definition failed validation.
    #[error("invalid capability: {reason}")]
    InvalidCapability {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// A capability or dependency version string was not valid semver.
    #[error("invalid version `{value}`: {source}")]
    InvalidVersion {
        /// The offending version string.
        value: String,
        /// Underlying semver parse error.
        #[source]
        source: semver::Error,
    },

    /// A dependency descriptor's `version_constraint` was not a valid semver range.
    #[error("invalid version constraint `{value}`: {source}")]
    InvalidVersionConstraint {
        /// The offending constraint string.
        value: String,
        /// Underlying semver parse error.
        #[source]
        source: semver::Error,
    },

    /// Dependency descriptor failed validation.
    #[error("invalid dependency: {reason}")]
    InvalidDependency {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Agent record failed validation.
    #[error("invalid agent record: {reason}")]
    InvalidRecord {
        /// Human-readable reason for rejection.
        reason: String,
    },
}
