use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::config::scratch_sibling;
use super::error::StoreError;
use crate::product::Product;
use crate::types::identifiers::StoreRevision;

/// The whole database: one JSON document holding every product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub products: Vec<Product>,
    pub metadata: DatabaseMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMetadata {
    pub version: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub total_products: usize,
}

impl Database {
    pub fn empty(version: impl Into<String>, now: DateTime<Utc>) -> Self {
        Database {
            products: Vec::new(),
            metadata: DatabaseMetadata {
                version: version.into(),
                created: now,
                last_modified: now,
                total_products: 0,
            },
        }
    }

    /// Recompute derived metadata from the collection itself.
    pub(crate) fn seal(&mut self, now: DateTime<Utc>) {
        self.metadata.last_modified = now;
        self.metadata.total_products = self.products.len();
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.products.iter().position(|p| p.id == *id)
    }

    pub fn find(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == *id)
    }
}

/// A document as read from disk together with the hash of its bytes.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub database: Database,
    pub revision: StoreRevision,
}

/// Read the document at `path`.
///
/// `Ok(None)` means there is nothing to read yet: the file is absent or
/// zero-length. Content that exists but does not parse is an error and is
/// left on disk untouched.
pub(crate) fn read_snapshot(path: &Path) -> Result<Option<Snapshot>, StoreError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::storage(path, e)),
    };

    if bytes.is_empty() {
        debug!("Document at {} is empty; treating as absent", path.display());
        return Ok(None);
    }

    let database: Database = serde_json::from_slice(&bytes).map_err(|source| {
        warn!("Document at {} does not parse: {source}", path.display());
        StoreError::CorruptDocument {
            path: path.to_path_buf(),
            source,
        }
    })?;

    Ok(Some(Snapshot {
        database,
        revision: StoreRevision::from_content(&bytes),
    }))
}

/// Persist `database` atomically: write a sibling temp file, fsync, rename.
pub(crate) fn write_snapshot(path: &Path, database: &Database) -> Result<StoreRevision, StoreError> {
    let bytes = serde_json::to_vec_pretty(database)?;
    write_atomic(path, &bytes)?;
    Ok(StoreRevision::from_content(&bytes))
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    ensure_parent_dir(path)?;

    // Unique per writer, so concurrent writers never share a temp inode.
    let temp_path = scratch_sibling(path, "tmp");
    let written = (|| {
        let mut f = fs::File::create(&temp_path)?;
        f.write_all(bytes)?;
        f.sync_all()
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::storage(&temp_path, e));
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StoreError::storage(path, e)
    })
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| StoreError::storage(dir, e))
        }
        _ => Ok(()),
    }
}
