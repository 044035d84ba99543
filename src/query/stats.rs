use serde::Serialize;

use crate::product::{Product, ProductKind};

/// Dashboard summary of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_products: usize,
    pub cars: usize,
    pub houses: usize,
    pub total_value: f64,
    pub average_price: f64,
}

impl CatalogStats {
    pub fn from_products(products: &[Product]) -> Self {
        let total_products = products.len();
        let count = |kind: ProductKind| products.iter().filter(|p| p.kind == kind).count();
        let total_value: f64 = products.iter().map(|p| p.price).sum();
        let average_price = if total_products == 0 {
            0.0
        } else {
            total_value / total_products as f64
        };

        CatalogStats {
            total_products,
            cars: count(ProductKind::Car),
            houses: count(ProductKind::House),
            total_value,
            average_price,
        }
    }
}
