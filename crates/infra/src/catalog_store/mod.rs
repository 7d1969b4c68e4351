//! Catalog Store: products and categories.
//!
//! Two interchangeable implementations are chosen at construction time:
//! [`InMemoryCatalogStore`] (optionally seeded from a JSON fixture) and
//! [`PostgresCatalogStore`].

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{CatalogFixture, InMemoryCatalogStore};
pub use postgres::PostgresCatalogStore;
pub use r#trait::CatalogStore;
