//! File-backed product catalog for a vehicles and homes storefront.
//!
//! `storefront-store` keeps every listing in one JSON document and exposes
//! list, get, add, update, delete, text search and type filtering over it.
//! Writers are serialized (in-process mutex plus a lock file) and each write
//! replaces the document atomically, so readers never observe a partial file.
//!
//! The [`api`] module wraps the store with request validation and a
//! `{success, data, error}` response envelope for whatever transport sits in
//! front of it.

pub mod api;
pub mod contact;
pub mod product;
pub mod query;
pub mod store;
pub mod types;

pub use product::{NewProduct, Product, ProductKind, ProductPatch, Specs};
pub use store::{ProductStore, StoreConfig, StoreError};
