//! Shared application state handed to every handler.

use std::sync::Arc;

use mesh_store::Store;

/// State shared across the axum router. Cheap to clone: everything inside
/// is already an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The durable agent table.
    pub store: Arc<dyn Store>,
    /// Whether fuzzy matching is enabled for discovery queries by default
    /// when a query omits `fuzzy_match`. Always `false`; callers opt in
    /// per-request, but kept on `AppState` so handlers need not hardcode it.
    pub fuzzy_match_default: bool,
}

impl AppState {
    /// Builds state around an already-opened store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            fuzzy_match_default: false,
        }
    }
}
