//! Environment-variable and CLI configuration, split along the
//! same registry/agent seam as the rest of the workspace.
//!
//! `mesh-registryd` (the registry binary) layers its `clap` CLI over these
//! environment variables via `env = "..."` attributes. Agent processes are
//! typically embedded in a host binary rather than run standalone, so
//! [`AgentConfig`] is loaded directly from the process environment instead.

#![warn(missing_docs, clippy::pedantic)]

mod agent;
mod error;
mod registry;

pub use agent::AgentConfig;
pub use error::ConfigError;
pub use registry::RegistryArgs;
