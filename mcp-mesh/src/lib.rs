//! MCP Mesh: a pull-based service mesh for MCP agents.
//!
//! Depend on this crate via `cargo add mcp-mesh`. It bundles the internal
//! registry and agent-side runtime crates behind feature flags so downstream
//! users can enable only the components their process needs — a registry
//! binary pulls in `registry`, while an agent process pulls in `client`,
//! `tools`, and `runtime`.

#![warn(missing_docs, clippy::pedantic)]

/// Shared domain types: agent identity, capabilities, dependency
/// descriptors, and wiring records. Always available.
pub use mesh_types as types;

/// JSON wire contract for the Registry API. Always available.
pub use mesh_wire as wire;

/// Dependency resolution and wiring computation (enabled by the `registry`
/// feature).
#[cfg(feature = "registry")]
pub use mesh_resolver as resolver;

/// Agent record storage backends (enabled by the `registry` feature).
#[cfg(feature = "registry")]
pub use mesh_store as store;

/// Health timer and expiry sweep (enabled by the `registry` feature).
#[cfg(feature = "registry")]
pub use mesh_health as health;

/// The Registry API server (enabled by the `registry` feature).
#[cfg(feature = "registry")]
pub use mesh_registry as registry;

/// Agent-side Registry Client and wiring cache (enabled by the `client`
/// feature).
#[cfg(feature = "client")]
pub use mesh_client as client;

/// Agent lifecycle, scheduler, and Heartbeat Loop (enabled by the `runtime`
/// feature).
#[cfg(feature = "runtime")]
pub use mesh_runtime as runtime;

/// Dependency Injector and Tool Invocation Proxy (enabled by the `tools`
/// feature).
#[cfg(feature = "tools")]
pub use mesh_tools as tools;

/// Environment-driven agent configuration (enabled by the `config`
/// feature).
#[cfg(feature = "config")]
pub use mesh_config as config;

/// Structured logging setup (enabled by the `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use mesh_telemetry as telemetry;
