use storefront_catalog::{
    CatalogStats, Category, Page, PageRequest, Product, ProductDraft, ProductFilter, ProductKey,
    ProductPatch, ProductSort,
};
use storefront_core::{CategoryId, ProductId};

use crate::error::StoreError;

/// Read/write access to products and categories.
///
/// `decrement_stock` is a conditional write: it succeeds only when the product
/// is active and holds at least `amount` units at the moment of the write.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError>;

    async fn get_product(&self, key: &ProductKey) -> Result<Option<Product>, StoreError>;

    /// Assign id, slug and timestamps to a draft and store it.
    async fn create_product(&self, draft: ProductDraft) -> Result<Product, StoreError>;

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError>;

    async fn decrement_stock(&self, id: ProductId, amount: u32) -> Result<Product, StoreError>;

    /// Put back units taken for an order that was later aborted.
    async fn restock(&self, id: ProductId, amount: u32) -> Result<Product, StoreError>;

    /// Categories ordered by `sort_order`.
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn create_category(&self, name: &str) -> Result<Category, StoreError>;

    /// Fails with `CategoryInUse` while any product references the category.
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError>;

    async fn reorder_categories(&self, ordered: &[CategoryId]) -> Result<Vec<Category>, StoreError>;

    async fn stats(&self) -> Result<CatalogStats, StoreError>;
}
