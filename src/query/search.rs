use crate::product::{Product, ProductKind};

/// A normalized free-text query.
/// Normalization rules:
/// - Surrounding whitespace trimmed
/// - Lowercase
/// - Empty after trimming matches everything
#[derive(Debug, Clone)]
pub struct TextQuery {
    pub raw: String,
    needle: String,
}

impl TextQuery {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = raw.trim().to_lowercase();
        Self { raw, needle }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Case-insensitive substring match against title, description and type.
    pub fn matches(&self, product: &Product) -> bool {
        if self.is_empty() {
            return true;
        }
        [
            product.title.as_str(),
            product.description.as_str(),
            product.kind.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&self.needle))
    }
}

pub fn search_text(products: &[Product], query: &TextQuery) -> Vec<Product> {
    products
        .iter()
        .filter(|p| query.matches(p))
        .cloned()
        .collect()
}

pub fn filter_by_kind(products: &[Product], kind: ProductKind) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.kind == kind)
        .cloned()
        .collect()
}
