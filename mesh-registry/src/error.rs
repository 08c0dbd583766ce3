//! Error types for the Registry API, mapped to JSON error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mesh_wire::ErrorResponse;
use thiserror::Error;

/// Result alias used throughout the registry's handler layer.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failure modes surfaced by the Registry API's HTTP handlers.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The request body failed validation before reaching the store.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// `agent_id` referenced an agent not present in the store.
    #[error("unknown agent")]
    UnknownAgent,

    /// A query parameter could not be parsed.
    #[error("invalid query parameter {field}: {reason}")]
    InvalidQuery {
        /// Name of the offending parameter.
        field: &'static str,
        /// Human-readable detail.
        reason: String,
    },

    /// The store rejected the operation.
    #[error("store error: {0}")]
    Store(#[from] mesh_store::StoreError),
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::UnknownAgent => (StatusCode::NOT_FOUND, "unknown_agent"),
            Self::InvalidQuery { .. } => (StatusCode::BAD_REQUEST, "invalid_query"),
            Self::Store(mesh_store::StoreError::UnknownAgent) => (StatusCode::NOT_FOUND, "unknown_agent"),
            Self::Store(mesh_store::StoreError::Full { .. }) => (StatusCode::INSUFFICIENT_STORAGE, "store_full"),
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
        };

        let body = Json(ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
