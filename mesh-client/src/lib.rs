//! The Registry Client: the agent-side half of the wire
//! contract in `mesh-wire`, plus the atomically-swapped wiring cache the
//! Dependency Injector reads from.

#![warn(missing_docs, clippy::pedantic)]

mod backoff;
mod client;
mod error;
mod wiring_cache;

/// HTTP client issuing registration/heartbeat requests and owning the cache.
pub use client::{HeartbeatOutcome, RegistryClient};
/// Client error type and result alias.
pub use error::{ClientError, Result};
/// The atomically-swapped wiring snapshot and its holder.
pub use wiring_cache::{WiringCache, WiringSnapshot};
