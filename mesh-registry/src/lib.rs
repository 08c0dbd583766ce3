//! The Registry API: an `axum` HTTP server wiring the Store,
//! the Resolver, and the Health Timer behind the wire contract in
//! `mesh-wire`.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod handlers;
mod query;
mod router;
mod server;
mod state;

/// HTTP error type and result alias for the handler layer.
pub use error::{RegistryError, Result};
/// Axum router assembly.
pub use router::build_router;
/// Process-lifetime server loop with graceful shutdown.
pub use server::run;
/// Shared application state.
pub use state::AppState;
