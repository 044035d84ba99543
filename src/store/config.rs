use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

pub const DEFAULT_DB_PATH: &str = "database/products.json";
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Where and how the product document is stored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Written to `metadata.version` when a document is first created.
    pub schema_version: String,
    pub lock_timeout: Duration,
    /// A lock file older than this is assumed to belong to a crashed writer.
    pub stale_lock_after: Duration,
}

impl StoreConfig {
    pub fn v1(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema_version: SCHEMA_VERSION.into(),
            lock_timeout: Duration::from_secs(5),
            stale_lock_after: Duration::from_secs(30),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_stale_lock_after(mut self, after: Duration) -> Self {
        self.stale_lock_after = after;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn lock_path(&self) -> PathBuf {
        sibling(&self.path, "lock")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::v1(DEFAULT_DB_PATH)
    }
}

/// `products.json` -> `products.json.<suffix>`
pub(crate) fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// `products.json` -> `products.json.<tag>.<pid>.<random>`, unique per call.
pub(crate) fn scratch_sibling(path: &Path, tag: &str) -> PathBuf {
    sibling(path, &format!("{tag}.{}", owner_token()))
}

/// `<pid>.<random hex>`; identifies one lock holder or one temp file.
pub(crate) fn owner_token() -> String {
    format!("{}.{:016x}", std::process::id(), rand::thread_rng().gen::<u64>())
}
