pub mod config;
pub mod document;
pub mod error;
pub(crate) mod lock;
pub mod store;

pub use config::{StoreConfig, DEFAULT_DB_PATH, SCHEMA_VERSION};
pub use document::{Database, DatabaseMetadata, Snapshot};
pub use error::StoreError;
pub use store::ProductStore;
