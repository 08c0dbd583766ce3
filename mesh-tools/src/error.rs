//! Errors surfaced by the Dependency Injector and Tool Invocation Proxy
//! (agent-side error kinds).

use thiserror::Error;

/// Result alias for tool invocation and dependency resolution.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised while invoking a tool's declared dependencies.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The outbound call to a wired peer could not be completed. Surfaces to
    /// the calling tool body, which may catch it and degrade.
    #[error("peer `{endpoint}` unreachable: {source}")]
    PeerUnreachable {
        /// Endpoint the proxy attempted to reach.
        endpoint: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The peer responded, but not with `2xx`.
    #[error("peer `{endpoint}` rejected call `{method}` ({status}): {message}")]
    PeerRejected {
        /// Endpoint that rejected the call.
        endpoint: String,
        /// Method name that was invoked.
        method: String,
        /// HTTP status code returned.
        status: u16,
        /// Response body, if decodable as text.
        message: String,
    },

    /// This agent's configured transport cannot carry outbound calls (e.g.
    /// pure stdio mode). Raised eagerly, before any I/O is attempted.
    #[error("proxy unsupported on transport {0:?}")]
    ProxyUnsupportedTransport(Transport),

    /// A required dependency has no wiring entry and no configured local
    /// fallback. Surfaced at tool-invocation time.
    #[error("dependency `{reference}` (descriptor {index}) is required but unsatisfied")]
    DependencyUnsatisfied {
        /// Index of the unsatisfied dependency in the agent's declared list.
        index: usize,
        /// The dependency's match reference, for diagnostics.
        reference: String,
    },

    /// No tool is registered under the requested name.
    #[error("tool `{0}` is not registered")]
    UnknownTool(String),

    /// A tool name collided with an existing local registration.
    #[error("tool `{0}` is already registered")]
    DuplicateTool(String),

    /// A local tool implementation failed.
    #[error("tool execution failed: {0}")]
    Execution(String),
}

impl ToolError {
    /// Builds an [`ToolError::Execution`] from a display-able cause.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution(reason.into())
    }
}

/// Transport an agent process communicates over. Only [`Transport::Http`]
/// can carry an outbound Tool Invocation Proxy call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transport {
    /// The agent exposes and consumes MCP over HTTP; proxies may dial out.
    Http,
    /// The agent speaks MCP over stdio only; no outbound HTTP is possible.
    Stdio,
}

impl Transport {
    /// Whether this transport can carry an outbound proxy call.
    #[must_use]
    pub const fn supports_outbound(self) -> bool {
        matches!(self, Self::Http)
    }
}
