//! Errors surfaced by the Store contract.

use thiserror::Error;

/// Result alias for Store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure modes of the durable agent-table store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced agent does not exist in the store.
    #[error("unknown agent")]
    UnknownAgent,

    /// The on-disk store could not be opened or is internally inconsistent.
    /// Callers should treat this as fatal at startup.
    #[error("storage corrupt: {reason}")]
    Corrupt {
        /// Human-readable detail from the underlying storage engine.
        reason: String,
    },

    /// The store has no remaining capacity for a new write.
    #[error("storage full: {reason}")]
    Full {
        /// Human-readable detail from the underlying storage engine.
        reason: String,
    },

    /// A record on disk was written with a schema version this build does
    /// not understand.
    #[error("storage incompatible: record schema version {found}, supported up to {supported}")]
    Incompatible {
        /// Schema version tag found on disk.
        found: u32,
        /// Highest schema version tag this build can read.
        supported: u32,
    },

    /// An underlying I/O or serialization failure not covered above.
    #[error("store io error: {0}")]
    Io(String),
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(io) if io.kind() == std::io::ErrorKind::OutOfMemory => {
                StoreError::Full {
                    reason: io.to_string(),
                }
            }
            sled::Error::Corruption { .. } => StoreError::Corrupt {
                reason: err.to_string(),
            },
            other => StoreError::Io(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Io(format!("serialization failure: {err}"))
    }
}
