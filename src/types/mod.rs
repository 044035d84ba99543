pub mod identifiers;

pub use identifiers::{ProductId, StoreRevision};
