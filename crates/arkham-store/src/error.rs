//! Error types for the log store
//!
//! Covers the three ways a store operation can fail:
//! - Naming a category that does not exist
//! - Reading or writing the serialized snapshot
//! - Touching the durable slot that holds it

use std::path::PathBuf;

/// Errors raised by store and snapshot operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Category name is not one of the seven known categories
    #[error("unknown log category: '{0}'")]
    UnknownCategory(String),

    /// Persisted snapshot could not be parsed
    #[error("snapshot parse failed: {0}")]
    Parse(#[source] serde_json::Error),

    /// Store could not be serialized
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// IO error on a file-backed slot
    #[error("io error on snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error came from a malformed snapshot
    #[inline]
    #[must_use]
    pub fn is_corrupt_snapshot(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
