use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use storefront_catalog::category::reorder;
use storefront_catalog::{
    CatalogStats, Category, Page, PageRequest, Product, ProductDraft, ProductFilter, ProductKey,
    ProductPatch, ProductSort,
};
use storefront_core::{CategoryId, DomainError, ProductId};
use storefront_inventory::StockLevel;

use super::r#trait::CatalogStore;
use crate::error::StoreError;

/// Seed data for the in-memory catalog (`CATALOG_FIXTURE`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFixture {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// In-memory catalog.
///
/// Intended for tests/dev and fixture-backed demos. Every mutation runs under
/// the write lock, which makes `decrement_stock` atomic.
#[derive(Debug)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<ProductId, Product>>,
    categories: RwLock<Vec<Category>>,
    currency: String,
}

impl InMemoryCatalogStore {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            products: RwLock::new(HashMap::new()),
            categories: RwLock::new(Vec::new()),
            currency: currency.into(),
        }
    }

    pub fn from_fixture(fixture: CatalogFixture, currency: impl Into<String>) -> Self {
        let store = Self::new(currency);
        if let Ok(mut products) = store.products.write() {
            products.extend(fixture.products.into_iter().map(|p| (p.id, p)));
        }
        if let Ok(mut categories) = store.categories.write() {
            *categories = fixture.categories;
            categories.sort_by_key(|c| c.sort_order);
        }
        store
    }

    pub fn from_fixture_file(
        path: impl AsRef<Path>,
        currency: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Database(format!("failed to read {}: {e}", path.display())))?;
        let fixture: CatalogFixture = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Corrupt(format!("invalid catalog fixture: {e}")))?;
        Ok(Self::from_fixture(fixture, currency))
    }

    fn poisoned() -> StoreError {
        StoreError::Database("lock poisoned".to_string())
    }

    /// Called with the products lock held, same order as `delete_category`.
    fn ensure_category(&self, id: Option<CategoryId>) -> Result<(), StoreError> {
        let Some(id) = id else {
            return Ok(());
        };
        let categories = self.categories.read().map_err(|_| Self::poisoned())?;
        if categories.iter().any(|c| c.id == id) {
            Ok(())
        } else {
            Err(DomainError::CategoryNotFound.into())
        }
    }

    fn with_product<T>(
        &self,
        id: ProductId,
        f: impl FnOnce(&mut Product) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        let product = products.get_mut(&id).ok_or(DomainError::ProductNotFound)?;
        f(product)
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        let all: Vec<Product> = products.values().cloned().collect();
        Ok(Page::from_unsorted(
            all,
            |p| filter.matches(p),
            |a, b| sort.compare(a, b),
            page,
        ))
    }

    async fn get_product(&self, key: &ProductKey) -> Result<Option<Product>, StoreError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        Ok(match key {
            ProductKey::Id(id) => products.get(id).cloned(),
            ProductKey::Slug(slug) => products.values().find(|p| &p.slug == slug).cloned(),
        })
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let product = draft.into_product(ProductId::new(), &self.currency, Utc::now())?;

        let mut products = self.products.write().map_err(|_| Self::poisoned())?;
        self.ensure_category(product.category_id)?;
        if products.values().any(|p| p.slug == product.slug) {
            return Err(StoreError::Conflict(format!(
                "slug already exists: {}",
                product.slug
            )));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        self.with_product(id, |product| {
            let mut updated = product.clone();
            patch.apply_to(&mut updated, Utc::now())?;
            self.ensure_category(updated.category_id)?;
            *product = updated.clone();
            Ok(updated)
        })
    }

    async fn decrement_stock(&self, id: ProductId, amount: u32) -> Result<Product, StoreError> {
        self.with_product(id, |product| {
            product.ensure_sellable(amount)?;
            let reservation = StockLevel::of(product).reserve(amount)?;
            product.stock_quantity = reservation.remaining;
            product.status = reservation.status_after;
            product.updated_at = Utc::now();
            Ok(product.clone())
        })
    }

    async fn restock(&self, id: ProductId, amount: u32) -> Result<Product, StoreError> {
        self.with_product(id, |product| {
            let (on_hand, status) = StockLevel::of(product).release(amount)?;
            product.stock_quantity = on_hand;
            product.status = status;
            product.updated_at = Utc::now();
            Ok(product.clone())
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.categories.read().map_err(|_| Self::poisoned())?.clone();
        categories.sort_by_key(|c| c.sort_order);
        Ok(categories)
    }

    async fn create_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut categories = self.categories.write().map_err(|_| Self::poisoned())?;
        let category = Category::append(CategoryId::new(), name, &categories)?;
        if categories.iter().any(|c| c.slug == category.slug) {
            return Err(StoreError::Conflict(format!(
                "category slug already exists: {}",
                category.slug
            )));
        }
        categories.push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        // Hold both locks so no product can start referencing the category
        // between the check and the removal.
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        let mut categories = self.categories.write().map_err(|_| Self::poisoned())?;

        let idx = categories
            .iter()
            .position(|c| c.id == id)
            .ok_or(DomainError::CategoryNotFound)?;
        let in_use = products
            .values()
            .filter(|p| p.category_id == Some(id))
            .count() as u64;
        Category::ensure_deletable(in_use)?;

        categories.remove(idx);
        Ok(())
    }

    async fn reorder_categories(&self, ordered: &[CategoryId]) -> Result<Vec<Category>, StoreError> {
        let mut categories = self.categories.write().map_err(|_| Self::poisoned())?;
        let mut next = categories.clone();
        reorder(&mut next, ordered)?;
        next.sort_by_key(|c| c.sort_order);
        *categories = next.clone();
        Ok(next)
    }

    async fn stats(&self) -> Result<CatalogStats, StoreError> {
        let products = self.products.read().map_err(|_| Self::poisoned())?;
        Ok(CatalogStats::from_products(products.values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_catalog::{ProductStatus, SourceType};
    use storefront_core::Money;

    fn draft(name: &str, price: u64, stock: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price: Money::from_minor(price),
            stock_quantity: stock,
            ..ProductDraft::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_slug_and_defaults() {
        let store = InMemoryCatalogStore::new("EGP");
        let product = store.create_product(draft("Desk Lamp", 1000, 3)).await.unwrap();

        assert_eq!(product.slug, "desk-lamp");
        assert_eq!(product.currency, "EGP");
        assert_eq!(product.source_type, SourceType::Dashboard);
        assert_eq!(product.status, ProductStatus::Active);

        let by_slug = store
            .get_product(&ProductKey::Slug("desk-lamp".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_slug.id, product.id);
    }

    #[tokio::test]
    async fn duplicate_slug_conflicts() {
        let store = InMemoryCatalogStore::new("EGP");
        store.create_product(draft("Mug", 100, 1)).await.unwrap();
        match store.create_product(draft("Mug", 100, 1)).await {
            Err(StoreError::Conflict(_)) => {}
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn decrement_to_zero_marks_out_of_stock_and_restock_reactivates() {
        let store = InMemoryCatalogStore::new("EGP");
        let product = store.create_product(draft("Scarf", 500, 2)).await.unwrap();

        let after = store.decrement_stock(product.id, 2).await.unwrap();
        assert_eq!(after.stock_quantity, 0);
        assert_eq!(after.status, ProductStatus::OutOfStock);

        match store.decrement_stock(product.id, 1).await {
            Err(StoreError::Domain(DomainError::OutOfStock { .. })) => {}
            other => panic!("expected OutOfStock, got {other:?}"),
        }

        let restocked = store.restock(product.id, 2).await.unwrap();
        assert_eq!(restocked.stock_quantity, 2);
        assert_eq!(restocked.status, ProductStatus::Active);
    }

    #[tokio::test]
    async fn customer_listing_hides_archived() {
        let store = InMemoryCatalogStore::new("EGP");
        let keep = store.create_product(draft("Visible", 100, 1)).await.unwrap();
        let gone = store.create_product(draft("Hidden", 100, 1)).await.unwrap();
        store
            .update_product(
                gone.id,
                ProductPatch {
                    status: Some(ProductStatus::Archived),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        let page = store
            .list_products(&ProductFilter::customer(), ProductSort::Newest, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, keep.id);

        let admin = store
            .list_products(&ProductFilter::admin(), ProductSort::Newest, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(admin.total, 2);
    }

    #[tokio::test]
    async fn category_in_use_cannot_be_deleted() {
        let store = InMemoryCatalogStore::new("EGP");
        let used = store.create_category("Lighting").await.unwrap();
        let empty = store.create_category("Kitchen").await.unwrap();
        assert_eq!(empty.sort_order, 2);

        store
            .create_product(ProductDraft {
                category_id: Some(used.id),
                ..draft("Lamp", 100, 1)
            })
            .await
            .unwrap();

        match store.delete_category(used.id).await {
            Err(StoreError::Domain(DomainError::CategoryInUse { product_count })) => {
                assert_eq!(product_count, 1)
            }
            other => panic!("expected CategoryInUse, got {other:?}"),
        }

        store.delete_category(empty.id).await.unwrap();
        let remaining = store.list_categories().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, used.id);
    }

    #[tokio::test]
    async fn products_cannot_reference_a_missing_category() {
        let store = InMemoryCatalogStore::new("EGP");
        let gone = store.create_category("Seasonal").await.unwrap();
        store.delete_category(gone.id).await.unwrap();

        match store
            .create_product(ProductDraft {
                category_id: Some(gone.id),
                ..draft("Lantern", 100, 1)
            })
            .await
        {
            Err(StoreError::Domain(DomainError::CategoryNotFound)) => {}
            other => panic!("expected CategoryNotFound, got {other:?}"),
        }

        let lamp = store.create_product(draft("Lamp", 100, 1)).await.unwrap();
        let patch = ProductPatch {
            category_id: Some(gone.id),
            ..ProductPatch::default()
        };
        match store.update_product(lamp.id, patch).await {
            Err(StoreError::Domain(DomainError::CategoryNotFound)) => {}
            other => panic!("expected CategoryNotFound, got {other:?}"),
        }
        let unchanged = store.get_product(&ProductKey::Id(lamp.id)).await.unwrap().unwrap();
        assert_eq!(unchanged.category_id, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn delete_racing_product_writes_never_orphans() {
        let store = std::sync::Arc::new(InMemoryCatalogStore::new("EGP"));

        for i in 0..20 {
            let id = store.create_category(&format!("Category {i}")).await.unwrap().id;

            let deleting = tokio::spawn({
                let store = store.clone();
                async move { store.delete_category(id).await }
            });
            let creating = tokio::spawn({
                let store = store.clone();
                async move {
                    store
                        .create_product(ProductDraft {
                            category_id: Some(id),
                            ..draft(&format!("Item {i}"), 100, 1)
                        })
                        .await
                }
            });

            let deleted = deleting.await.unwrap().is_ok();
            let created = creating.await.unwrap().is_ok();
            assert!(deleted != created, "exactly one of delete/create must win");
        }

        let categories: Vec<CategoryId> = store.list_categories().await.unwrap().iter().map(|c| c.id).collect();
        let products = store
            .list_products(&ProductFilter::admin(), ProductSort::Newest, PageRequest::new(None, Some(100)))
            .await
            .unwrap();
        for product in products.items {
            let category = product.category_id.unwrap();
            assert!(categories.contains(&category));
        }
    }

    #[tokio::test]
    async fn reorder_assigns_positions() {
        let store = InMemoryCatalogStore::new("EGP");
        let a = store.create_category("A").await.unwrap();
        let b = store.create_category("B").await.unwrap();

        let ordered = store.reorder_categories(&[b.id, a.id]).await.unwrap();
        assert_eq!(ordered[0].id, b.id);
        assert_eq!(ordered[0].sort_order, 1);
        assert_eq!(ordered[1].sort_order, 2);
    }

    #[tokio::test]
    async fn fixture_seeds_products_and_categories() {
        let source = InMemoryCatalogStore::new("EGP");
        let category = source.create_category("Bags").await.unwrap();
        let product = source.create_product(draft("Tote", 900, 4)).await.unwrap();

        let json = serde_json::to_string(&CatalogFixture {
            categories: vec![category.clone()],
            products: vec![product.clone()],
        })
        .unwrap();
        let fixture: CatalogFixture = serde_json::from_str(&json).unwrap();
        let store = InMemoryCatalogStore::from_fixture(fixture, "EGP");

        let found = store.get_product(&ProductKey::Id(product.id)).await.unwrap();
        assert_eq!(found, Some(product));
        assert_eq!(store.list_categories().await.unwrap(), vec![category]);
    }
}
