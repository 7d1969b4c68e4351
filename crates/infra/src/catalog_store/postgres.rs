//! Postgres-backed catalog store.
//!
//! Stock decrements are a single conditional `UPDATE ... WHERE stock_quantity >= $n`,
//! so concurrent checkouts can never drive a row below zero. Multi-step writes
//! (patch, restock, category maintenance) run in a transaction with the touched
//! rows locked `FOR UPDATE`. A product write that sets `category_id` holds the
//! category row `FOR SHARE`, so it serializes with `delete_category`.

use std::sync::Arc;

use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use storefront_catalog::category::reorder;
use storefront_catalog::{
    CatalogStats, Category, Page, PageRequest, Product, ProductDraft, ProductFilter, ProductKey,
    ProductPatch, ProductSort, ProductStatus,
};
use storefront_core::{CategoryId, DomainError, Money, ProductId};
use storefront_inventory::StockLevel;

use super::r#trait::CatalogStore;
use crate::error::{StoreError, corrupt, map_sqlx_error};

const PRODUCT_COLUMNS: &str = "id, slug, name, description, price_minor, currency, stock_quantity, \
     status, is_featured, category_id, images, source_type, source_url, created_at, updated_at";

const LISTING_FILTER: &str = r#"
    WHERE ($1 OR status <> 'archived')
      AND ($2::text IS NULL OR status = $2)
      AND ($3::uuid IS NULL OR category_id = $3)
      AND ($4::text IS NULL OR strpos(lower(name), $4) > 0 OR strpos(lower(coalesce(description, '')), $4) > 0)
      AND (NOT $5 OR stock_quantity > 0)
      AND (NOT $6 OR is_featured)
"#;

/// Postgres-backed catalog.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
    currency: String,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool, currency: impl Into<String>) -> Self {
        Self {
            pool: Arc::new(pool),
            currency: currency.into(),
        }
    }

    async fn begin(&self) -> Result<Transaction<'_, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn lock_product(
        tx: &mut Transaction<'_, Postgres>,
        id: ProductId,
    ) -> Result<Product, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_product", e))?;

        match row {
            Some(row) => product_from_row(&row),
            None => Err(DomainError::ProductNotFound.into()),
        }
    }

    /// Share-lock the referenced category until the transaction ends.
    async fn share_category(
        tx: &mut Transaction<'_, Postgres>,
        id: Option<CategoryId>,
    ) -> Result<(), StoreError> {
        let Some(id) = id else {
            return Ok(());
        };
        let row = sqlx::query("SELECT id FROM categories WHERE id = $1 FOR SHARE")
            .bind(id.as_uuid())
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("share_category", e))?;
        match row {
            Some(_) => Ok(()),
            None => Err(DomainError::CategoryNotFound.into()),
        }
    }

    async fn write_product(
        tx: &mut Transaction<'_, Postgres>,
        product: &Product,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE products SET
                name = $2,
                description = $3,
                price_minor = $4,
                stock_quantity = $5,
                status = $6,
                is_featured = $7,
                category_id = $8,
                images = $9,
                updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(minor_to_db(product.price)?)
        .bind(i64::from(product.stock_quantity))
        .bind(product.status.as_str())
        .bind(product.is_featured)
        .bind(product.category_id.map(|c| *c.as_uuid()))
        .bind(Json(&product.images))
        .bind(product.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("write_product", e))?;
        Ok(())
    }

    async fn locked_categories(
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, slug, sort_order FROM categories ORDER BY sort_order FOR UPDATE",
        )
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self, filter), err)]
    async fn list_products(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: PageRequest,
    ) -> Result<Page<Product>, StoreError> {
        let span = Span::current();
        span.record("operation", "list_products");

        let status = filter.status.map(|s| s.as_str());
        let category = filter.category_id.map(|c| *c.as_uuid());
        let needle = filter.needle();

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products {LISTING_FILTER}"))
            .bind(filter.include_archived)
            .bind(status)
            .bind(category)
            .bind(needle.as_deref())
            .bind(filter.in_stock_only)
            .bind(filter.featured_only)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_products", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {LISTING_FILTER} ORDER BY {} LIMIT $7 OFFSET $8",
            sort.order_by()
        ))
        .bind(filter.include_archived)
        .bind(status)
        .bind(category)
        .bind(needle.as_deref())
        .bind(filter.in_stock_only)
        .bind(filter.featured_only)
        .bind(i64::from(page.page_size))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        let items = rows.iter().map(product_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, u64::try_from(total).unwrap_or(0), page))
    }

    #[instrument(skip(self), err)]
    async fn get_product(&self, key: &ProductKey) -> Result<Option<Product>, StoreError> {
        let row = match key {
            ProductKey::Id(id) => {
                sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&*self.pool)
                    .await
            }
            ProductKey::Slug(slug) => {
                sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"))
                    .bind(slug)
                    .fetch_optional(&*self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, draft), fields(name = %draft.name), err)]
    async fn create_product(&self, draft: ProductDraft) -> Result<Product, StoreError> {
        let product = draft.into_product(ProductId::new(), &self.currency, Utc::now())?;
        let mut tx = self.begin().await?;
        Self::share_category(&mut tx, product.category_id).await?;

        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        ))
        .bind(product.id.as_uuid())
        .bind(&product.slug)
        .bind(&product.name)
        .bind(&product.description)
        .bind(minor_to_db(product.price)?)
        .bind(&product.currency)
        .bind(i64::from(product.stock_quantity))
        .bind(product.status.as_str())
        .bind(product.is_featured)
        .bind(product.category_id.map(|c| *c.as_uuid()))
        .bind(Json(&product.images))
        .bind(product.source_type.as_str())
        .bind(&product.source_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> Result<Product, StoreError> {
        let mut tx = self.begin().await?;
        let mut product = Self::lock_product(&mut tx, id).await?;
        patch.apply_to(&mut product, Utc::now())?;
        Self::share_category(&mut tx, product.category_id).await?;
        Self::write_product(&mut tx, &product).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn decrement_stock(&self, id: ProductId, amount: u32) -> Result<Product, StoreError> {
        let span = Span::current();
        span.record("operation", "decrement_stock");

        if amount == 0 {
            return Err(DomainError::validation(
                "invalid_quantity",
                "reservation quantity must be at least 1",
            )
            .into());
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                stock_quantity = stock_quantity - $2,
                status = CASE WHEN stock_quantity - $2 = 0 THEN 'out_of_stock' ELSE status END,
                updated_at = NOW()
            WHERE id = $1 AND status = 'active' AND stock_quantity >= $2
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(i64::from(amount))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;

        match row {
            Some(row) => product_from_row(&row),
            None => match self.get_product(&ProductKey::Id(id)).await? {
                Some(_) => Err(DomainError::OutOfStock { product_id: id }.into()),
                None => Err(DomainError::ProductNotFound.into()),
            },
        }
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn restock(&self, id: ProductId, amount: u32) -> Result<Product, StoreError> {
        let mut tx = self.begin().await?;
        let mut product = Self::lock_product(&mut tx, id).await?;
        let (on_hand, status) = StockLevel::of(&product).release(amount)?;
        product.stock_quantity = on_hand;
        product.status = status;
        product.updated_at = Utc::now();
        Self::write_product(&mut tx, &product).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let rows = sqlx::query("SELECT id, name, slug, sort_order FROM categories ORDER BY sort_order")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        rows.iter().map(category_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn create_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut tx = self.begin().await?;
        let existing = Self::locked_categories(&mut tx).await?;
        let category = Category::append(CategoryId::new(), name, &existing)?;

        sqlx::query("INSERT INTO categories (id, name, slug, sort_order) VALUES ($1, $2, $3, $4)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.slug)
            .bind(i64::from(category.sort_order))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_category", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(&self, id: CategoryId) -> Result<(), StoreError> {
        let mut tx = self.begin().await?;

        // Waits for in-flight product writes holding the row FOR SHARE; the
        // count below then sees their committed rows.
        let exists = sqlx::query("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_category", e))?;
        if exists.is_none() {
            return Err(DomainError::CategoryNotFound.into());
        }

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("count_category_products", e))?;
        Category::ensure_deletable(u64::try_from(in_use).unwrap_or(0))?;

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_category", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self, ordered), fields(count = ordered.len()), err)]
    async fn reorder_categories(&self, ordered: &[CategoryId]) -> Result<Vec<Category>, StoreError> {
        let mut tx = self.begin().await?;
        let mut categories = Self::locked_categories(&mut tx).await?;
        reorder(&mut categories, ordered)?;

        for category in &categories {
            sqlx::query("UPDATE categories SET sort_order = $2 WHERE id = $1")
                .bind(category.id.as_uuid())
                .bind(i64::from(category.sort_order))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("reorder_categories", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        categories.sort_by_key(|c| c.sort_order);
        Ok(categories)
    }

    #[instrument(skip(self), err)]
    async fn stats(&self) -> Result<CatalogStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'active') AS active,
                COUNT(*) FILTER (WHERE status = 'out_of_stock') AS out_of_stock
            FROM products
            "#,
        )
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stats", e))?;

        let count = |column: &str| -> Result<u64, StoreError> {
            let v: i64 = row.try_get(column).map_err(|e| corrupt(column, e))?;
            Ok(u64::try_from(v).unwrap_or(0))
        };
        Ok(CatalogStats {
            total: count("total")?,
            active: count("active")?,
            out_of_stock: count("out_of_stock")?,
        })
    }
}

fn minor_to_db(price: Money) -> Result<i64, StoreError> {
    i64::try_from(price.minor_units())
        .map_err(|_| DomainError::validation("invalid_price", "amount too large").into())
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let price: i64 = row.try_get("price_minor").map_err(|e| corrupt("price_minor", e))?;
    let stock: i64 = row.try_get("stock_quantity").map_err(|e| corrupt("stock_quantity", e))?;
    let status: String = row.try_get("status").map_err(|e| corrupt("status", e))?;
    let source_type: String = row.try_get("source_type").map_err(|e| corrupt("source_type", e))?;
    let category: Option<Uuid> = row.try_get("category_id").map_err(|e| corrupt("category_id", e))?;
    let images: Json<Vec<String>> = row.try_get("images").map_err(|e| corrupt("images", e))?;
    let id: Uuid = row.try_get("id").map_err(|e| corrupt("id", e))?;

    Ok(Product {
        id: ProductId::from_uuid(id),
        slug: row.try_get("slug").map_err(|e| corrupt("slug", e))?,
        name: row.try_get("name").map_err(|e| corrupt("name", e))?,
        description: row.try_get("description").map_err(|e| corrupt("description", e))?,
        price: Money::from_minor(u64::try_from(price).map_err(|e| corrupt("price_minor", e))?),
        currency: row.try_get("currency").map_err(|e| corrupt("currency", e))?,
        stock_quantity: u32::try_from(stock).map_err(|e| corrupt("stock_quantity", e))?,
        status: status.parse::<ProductStatus>().map_err(|e| corrupt("status", e))?,
        is_featured: row.try_get("is_featured").map_err(|e| corrupt("is_featured", e))?,
        category_id: category.map(CategoryId::from_uuid),
        images: images.0,
        source_type: source_type.parse().map_err(|e| corrupt("source_type", e))?,
        source_url: row.try_get("source_url").map_err(|e| corrupt("source_url", e))?,
        created_at: row.try_get("created_at").map_err(|e| corrupt("created_at", e))?,
        updated_at: row.try_get("updated_at").map_err(|e| corrupt("updated_at", e))?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, StoreError> {
    let id: Uuid = row.try_get("id").map_err(|e| corrupt("id", e))?;
    let sort_order: i64 = row.try_get("sort_order").map_err(|e| corrupt("sort_order", e))?;
    Ok(Category {
        id: CategoryId::from_uuid(id),
        name: row.try_get("name").map_err(|e| corrupt("name", e))?,
        slug: row.try_get("slug").map_err(|e| corrupt("slug", e))?,
        sort_order: u32::try_from(sort_order).map_err(|e| corrupt("sort_order", e))?,
    })
}
