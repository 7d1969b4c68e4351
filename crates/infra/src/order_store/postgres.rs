//! Postgres-backed order store.
//!
//! The full order is kept in a `document` JSONB column next to the indexed
//! columns used for lookups (`order_number`, `idempotency_key`, `status`).
//! `save` is a conditional `UPDATE ... WHERE version = $expected`.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{Span, instrument};

use storefront_catalog::{Page, PageRequest};
use storefront_core::{AggregateRoot, DomainError, ExpectedVersion};
use storefront_orders::{Order, OrderNumber, OrderStatus};

use super::r#trait::OrderStore;
use crate::error::{StoreError, corrupt, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self), err)]
    async fn next_order_number(&self) -> Result<OrderNumber, StoreError> {
        let next: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("next_order_number", e))?;
        let next = u64::try_from(next).map_err(|e| corrupt("order_number_seq", e))?;
        Ok(OrderNumber::new(next)?)
    }

    #[instrument(skip(self, order), fields(order_number = ?order.order_number()), err)]
    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let span = Span::current();
        span.record("operation", "insert_order");

        let number = order
            .order_number()
            .ok_or_else(|| DomainError::conflict("cannot store an order that was never placed"))?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id,
                order_number,
                idempotency_key,
                status,
                version,
                created_at,
                document
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(sequence_to_db(number)?)
        .bind(order.idempotency_key())
        .bind(order.status().as_str())
        .bind(version_to_db(order.version())?)
        .bind(order.created_at())
        .bind(Json(order))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT document FROM orders WHERE idempotency_key = $1")
            .bind(key)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_idempotency_key", e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(skip(self), fields(order_number = %number), err)]
    async fn find_by_number(&self, number: OrderNumber) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT document FROM orders WHERE order_number = $1")
            .bind(sequence_to_db(number)?)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_by_number", e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(
        skip(self, order),
        fields(order_number = ?order.order_number(), expected_version = ?expected),
        err
    )]
    async fn save(&self, order: &Order, expected: ExpectedVersion) -> Result<(), StoreError> {
        let span = Span::current();
        span.record("operation", "save_order");

        let expected_version = match expected {
            ExpectedVersion::Exact(v) => Some(version_to_db(v)?),
            ExpectedVersion::Any => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                version = $3,
                document = $4
            WHERE id = $1 AND ($5::bigint IS NULL OR version = $5)
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.status().as_str())
        .bind(version_to_db(order.version())?)
        .bind(Json(order))
        .bind(expected_version)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_order", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "stale order write (expected: {expected:?})"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        let status = status.map(|s| s.as_str());

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
                .bind(status)
                .fetch_one(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("count_orders", e))?;

        let rows = sqlx::query(
            r#"
            SELECT document FROM orders
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY order_number DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(i64::from(page.page_size))
        .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders", e))?;

        let items = rows.iter().map(order_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, u64::try_from(total).unwrap_or(0), page))
    }
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let Json(order): Json<Order> = row.try_get("document").map_err(|e| corrupt("document", e))?;
    Ok(order)
}

fn sequence_to_db(number: OrderNumber) -> Result<i64, StoreError> {
    i64::try_from(number.sequence()).map_err(|e| corrupt("order_number", e))
}

fn version_to_db(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version).map_err(|e| corrupt("version", e))
}
