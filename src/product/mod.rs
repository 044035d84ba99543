pub mod product;
pub mod specs;

pub use crate::types::identifiers::ProductId;
pub use product::{NewProduct, Product, ProductKind, ProductPatch, UnknownKind};
pub use specs::{CarSpecs, HomeSpecs, ProductSpecs, Specs};
