//! Errors surfaced by the Registry Client.

use thiserror::Error;

/// Result alias for Registry Client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure modes of a single registry HTTP call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never reached the registry, or the registry did not
    /// respond: connection refused, DNS failure, timeout. Callers of
    /// `heartbeat` should treat this as transient and retry on the next
    /// cadence tick; `register_with_retry` retries it internally.
    #[error("registry unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The registry responded `404 unknown_agent`; the caller should
    /// re-register.
    #[error("agent unknown to registry")]
    UnknownAgent,

    /// The registry rejected the request as malformed (4xx other than 404).
    /// Not retried: the request needs to change, not just be resent.
    #[error("registry rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status code returned.
        status: u16,
        /// Error message from the response body, if decodable.
        message: String,
    },

    /// The response body could not be decoded as the expected wire type.
    #[error("malformed registry response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether a fresh attempt of the same request might succeed without any
    /// change in inputs — network blips and `5xx` responses, but not
    /// malformed requests.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
