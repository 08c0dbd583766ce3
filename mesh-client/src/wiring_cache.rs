//! The agent-side wiring cache: an atomically-swapped snapshot consulted by
//! the Dependency Injector, updated by the Heartbeat Loop and by
//! registration. Swaps are never partially observable.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use mesh_types::{ResourceVersion, WiringEntry};

/// A single atomically-visible wiring snapshot.
#[derive(Clone, Debug, Default)]
pub struct WiringSnapshot {
    /// Resource version this snapshot was computed at.
    pub resource_version: ResourceVersion,
    /// Ranked candidates per declared dependency, indexed by `dependency_index`.
    pub wiring: Vec<WiringEntry>,
    /// When this snapshot was installed locally.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Holds the current [`WiringSnapshot`] behind an [`ArcSwap`], so readers
/// never observe a torn update: `load` always returns either the previous
/// snapshot in full or the new one in full.
#[derive(Default)]
pub struct WiringCache {
    current: ArcSwap<WiringSnapshot>,
}

impl WiringCache {
    /// Creates an empty cache (no dependencies resolved yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn load(&self) -> Arc<WiringSnapshot> {
        self.current.load_full()
    }

    /// Atomically replaces the snapshot.
    pub fn store(&self, resource_version: ResourceVersion, wiring: Vec<WiringEntry>) {
        self.current.store(Arc::new(WiringSnapshot {
            resource_version,
            wiring,
            refreshed_at: Some(Utc::now()),
        }));
    }

    /// Returns the resource version of the currently cached snapshot, for
    /// comparison against a newly received one before deciding whether to
    /// fetch a fresh wiring array at all.
    #[must_use]
    pub fn resource_version(&self) -> ResourceVersion {
        self.current.load().resource_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let cache = WiringCache::new();
        let snapshot = cache.load();
        assert!(snapshot.wiring.is_empty());
        assert_eq!(snapshot.resource_version, ResourceVersion::zero());
    }

    #[test]
    fn store_replaces_snapshot_atomically() {
        let cache = WiringCache::new();
        cache.store(ResourceVersion::from(3), vec![]);
        assert_eq!(cache.resource_version(), ResourceVersion::from(3));
    }
}
