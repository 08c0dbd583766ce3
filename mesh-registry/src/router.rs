//! Axum router assembly: routes, tracing, and timeout middleware.

use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete Registry API router over `state`.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/agents/register_with_metadata", post(handlers::register_with_metadata))
        .route("/heartbeat", post(handlers::heartbeat))
        .route("/agents", get(handlers::discover_agents))
        .route("/agents/:id", delete(handlers::delete_agent))
        .route("/capabilities", get(handlers::discover_capabilities))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(tower::timeout::TimeoutLayer::new(Duration::from_secs(30)))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}
