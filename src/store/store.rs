use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info};

use super::config::StoreConfig;
use super::document::{ensure_parent_dir, read_snapshot, write_snapshot, Database, Snapshot};
use super::error::StoreError;
use super::lock::WriteLock;
use crate::product::{NewProduct, Product, ProductKind, ProductPatch};
use crate::query::{filter_by_kind, search_text, CatalogStats, TextQuery};
use crate::types::identifiers::{ProductId, StoreRevision};

/// Product catalog persisted as a single JSON document.
///
/// Every call is a fresh read of the file; nothing is cached between calls.
/// Mutations run read-modify-write under an in-process mutex plus a lock
/// file, so concurrent writers are serialized instead of losing updates.
/// Reads take no lock and see the last fully written document.
#[derive(Debug)]
pub struct ProductStore {
    config: StoreConfig,
    write_guard: Mutex<()>,
}

impl ProductStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            write_guard: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current document and its revision, creating an empty document first
    /// if none exists.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        if let Some(snapshot) = read_snapshot(self.config.path())? {
            return Ok(snapshot);
        }
        self.locked(|store| store.load_or_init())
    }

    pub fn revision(&self) -> Result<StoreRevision, StoreError> {
        Ok(self.snapshot()?.revision)
    }

    pub fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.snapshot()?.database.products)
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.database.find(id).cloned())
    }

    pub fn search_by_text(&self, query: &str) -> Result<Vec<Product>, StoreError> {
        let products = self.list_all()?;
        let query = TextQuery::new(query);
        if query.is_empty() {
            return Ok(products);
        }
        Ok(search_text(&products, &query))
    }

    pub fn list_by_type(&self, kind: ProductKind) -> Result<Vec<Product>, StoreError> {
        Ok(filter_by_kind(&self.list_all()?, kind))
    }

    pub fn stats(&self) -> Result<CatalogStats, StoreError> {
        Ok(CatalogStats::from_products(&self.list_all()?))
    }

    pub fn add(&self, data: NewProduct) -> Result<Product, StoreError> {
        check_price(data.price)?;
        self.mutate(None, "add", |db, now| {
            let mut rng = rand::thread_rng();
            let mut id = ProductId::generate(now, &mut rng);
            while db.position(id.as_str()).is_some() {
                id = ProductId::generate(now, &mut rng);
            }

            let product = Product::create(id, data, now);
            db.products.push(product.clone());
            Ok(product)
        })
    }

    pub fn update(&self, id: &str, patch: ProductPatch) -> Result<Product, StoreError> {
        self.update_inner(id, patch, None)
    }

    /// Like [`update`](Self::update), but fails with
    /// [`StoreError::Conflict`] if the document no longer matches `expected`.
    pub fn update_if_revision(
        &self,
        id: &str,
        patch: ProductPatch,
        expected: &StoreRevision,
    ) -> Result<Product, StoreError> {
        self.update_inner(id, patch, Some(expected))
    }

    pub fn delete(&self, id: &str) -> Result<Product, StoreError> {
        self.delete_inner(id, None)
    }

    pub fn delete_if_revision(
        &self,
        id: &str,
        expected: &StoreRevision,
    ) -> Result<Product, StoreError> {
        self.delete_inner(id, Some(expected))
    }

    fn update_inner(
        &self,
        id: &str,
        patch: ProductPatch,
        expected: Option<&StoreRevision>,
    ) -> Result<Product, StoreError> {
        check_id(id)?;
        if let Some(price) = patch.price {
            check_price(price)?;
        }
        self.mutate(expected, "update", |db, now| {
            let idx = db
                .position(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            let product = &mut db.products[idx];
            product.apply(patch, now);
            Ok(product.clone())
        })
    }

    fn delete_inner(
        &self,
        id: &str,
        expected: Option<&StoreRevision>,
    ) -> Result<Product, StoreError> {
        check_id(id)?;
        self.mutate(expected, "delete", |db, _| {
            let idx = db
                .position(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            Ok(db.products.remove(idx))
        })
    }

    /// Serialize with every other writer, in this process and others.
    fn locked<T>(&self, f: impl FnOnce(&Self) -> Result<T, StoreError>) -> Result<T, StoreError> {
        // The mutex guards no data, so a poisoned lock is still usable.
        let _guard = self
            .write_guard
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        ensure_parent_dir(self.config.path())?;
        let _file_lock = WriteLock::acquire(
            &self.config.lock_path(),
            self.config.lock_timeout,
            self.config.stale_lock_after,
        )?;
        f(self)
    }

    /// Caller must hold the write lock.
    fn load_or_init(&self) -> Result<Snapshot, StoreError> {
        let path = self.config.path();
        if let Some(snapshot) = read_snapshot(path)? {
            return Ok(snapshot);
        }

        let database = Database::empty(self.config.schema_version.clone(), now());
        let revision = write_snapshot(path, &database)?;
        info!("Initialized empty product document at {}", path.display());
        Ok(Snapshot { database, revision })
    }

    /// Read, mutate in memory, recompute metadata, write the whole document.
    /// Nothing is written when `op` fails.
    fn mutate<T>(
        &self,
        expected: Option<&StoreRevision>,
        op: &str,
        f: impl FnOnce(&mut Database, DateTime<Utc>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.locked(|store| {
            let Snapshot {
                mut database,
                revision,
            } = store.load_or_init()?;

            if let Some(expected) = expected {
                if *expected != revision {
                    debug!("Rejecting {op}: revision {revision} != expected {expected}");
                    return Err(StoreError::Conflict {
                        expected: expected.clone(),
                        actual: revision,
                    });
                }
            }

            let now = now();
            let out = f(&mut database, now)?;
            database.seal(now);
            write_snapshot(store.config.path(), &database)?;

            info!(
                "Committed {op}; {} product(s) in {}",
                database.metadata.total_products,
                store.config.path().display()
            );
            Ok(out)
        })
    }
}

/// Millisecond precision, like the timestamps in existing documents.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn check_id(id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        return Err(StoreError::Validation("product id must not be empty".into()));
    }
    Ok(())
}

// JSON has no representation for NaN or infinity; writing one would leave
// an unreadable document behind.
fn check_price(price: f64) -> Result<(), StoreError> {
    if !price.is_finite() {
        return Err(StoreError::Validation(format!(
            "price must be a finite number, got {price}"
        )));
    }
    Ok(())
}
