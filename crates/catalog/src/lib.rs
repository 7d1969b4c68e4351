//! Catalog domain module.
//!
//! Products, categories and the listing query model, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod category;
pub mod product;
pub mod query;
pub mod slug;

pub use category::Category;
pub use product::{Product, ProductDraft, ProductKey, ProductPatch, ProductStatus, SourceType, MAX_IMAGES};
pub use query::{CatalogStats, Page, PageRequest, ProductFilter, ProductSort};
pub use slug::{slugify, slug_with_suffix};
