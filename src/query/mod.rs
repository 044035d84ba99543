pub mod search;
pub mod stats;

pub use search::{filter_by_kind, search_text, TextQuery};
pub use stats::CatalogStats;
