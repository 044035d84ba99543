use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::identifiers::StoreRevision;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Corrupt document at {path}: {source}")]
    CorruptDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Invalid write: {0}")]
    Validation(String),
    #[error("Document changed since it was read: expected {expected}, found {actual}")]
    Conflict {
        expected: StoreRevision,
        actual: StoreRevision,
    },
    #[error("Timed out after {waited:?} waiting for write lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
