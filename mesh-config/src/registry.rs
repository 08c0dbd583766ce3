//! `mesh-registryd` CLI arguments, layered over environment variables.

use std::path::PathBuf;

use clap::Parser;

/// Command-line configuration for the registry binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "mesh-registryd")]
#[command(about = "Pull-based MCP Mesh registry service")]
#[command(version)]
pub struct RegistryArgs {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "MCP_MESH_REGISTRY_BIND_HOST", default_value = "0.0.0.0")]
    pub bind_host: String,

    /// Port to bind the HTTP server to.
    #[arg(long, env = "MCP_MESH_REGISTRY_BIND_PORT", default_value_t = 8080)]
    pub bind_port: u16,

    /// Path to the embedded `sled` database directory.
    #[arg(long, env = "MCP_MESH_REGISTRY_STORE_PATH", default_value = "./mesh-registry-data")]
    pub store_path: PathBuf,

    /// Verbose logging toggle.
    #[arg(long, env = "MCP_MESH_DEBUG")]
    pub debug: bool,

    /// Grace period, in seconds, allowed for in-flight requests to drain on
    /// shutdown before the process exits unconditionally.
    #[arg(long, env = "MCP_MESH_REGISTRY_SHUTDOWN_GRACE_SECONDS", default_value_t = 5)]
    pub shutdown_grace_seconds: u64,
}
