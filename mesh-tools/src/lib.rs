//! Agent-side tool plumbing: the Dependency Injector and Tool Invocation
//! Proxy that let a registered tool body call its declared dependencies
//! without knowing whether they resolved to a local implementation or a
//! peer reached over the mesh.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod injector;
mod proxy;
/// Tool registry and execution runtime.
pub mod registry;

pub use error::{Result, ToolError, Transport};
pub use injector::{DependencyInjector, ResolvedDependency};
pub use proxy::{ToolInvocationProxy, DEFAULT_TIMEOUT};
pub use registry::{Tool, ToolBinding, ToolFuture, ToolHandle, ToolMetadata, ToolRegistry};

pub use inventory;
pub use mesh_tools_macros::mesh_tool;
