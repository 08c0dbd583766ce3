//! Configuration loading errors.

use thiserror::Error;

/// Errors raised while resolving configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither `MCP_MESH_REGISTRY_URL` nor the `MCP_MESH_REGISTRY_HOST` /
    /// `MCP_MESH_REGISTRY_PORT` pair was set.
    #[error(
        "no registry location configured: set MCP_MESH_REGISTRY_URL, or both \
         MCP_MESH_REGISTRY_HOST and MCP_MESH_REGISTRY_PORT"
    )]
    MissingRegistryLocation,

    /// A configured value was present but failed to parse.
    #[error("invalid value for {field}: {value}")]
    InvalidValue {
        /// Name of the offending environment variable.
        field: &'static str,
        /// The unparsed value that failed validation.
        value: String,
    },
}
