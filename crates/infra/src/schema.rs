//! Postgres schema bootstrap.
//!
//! Idempotent; run once at startup before any store is used.

use sqlx::PgPool;
use tracing::info;

use crate::error::{StoreError, map_sqlx_error};

const STATEMENTS: &[(&str, &str)] = &[
    (
        "categories",
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id          UUID PRIMARY KEY,
            name        TEXT NOT NULL,
            slug        TEXT NOT NULL UNIQUE,
            sort_order  BIGINT NOT NULL
        )
        "#,
    ),
    (
        // No foreign key on category_id: the in-use check is done by the store.
        "products",
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id              UUID PRIMARY KEY,
            slug            TEXT NOT NULL UNIQUE,
            name            TEXT NOT NULL,
            description     TEXT NULL,
            price_minor     BIGINT NOT NULL CHECK (price_minor >= 0),
            currency        TEXT NOT NULL,
            stock_quantity  BIGINT NOT NULL CHECK (stock_quantity >= 0),
            status          TEXT NOT NULL,
            is_featured     BOOLEAN NOT NULL DEFAULT FALSE,
            category_id     UUID NULL,
            images          JSONB NOT NULL DEFAULT '[]'::jsonb,
            source_type     TEXT NOT NULL,
            source_url      TEXT NULL,
            created_at      TIMESTAMPTZ NOT NULL,
            updated_at      TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
    (
        "products_category_idx",
        "CREATE INDEX IF NOT EXISTS products_category_idx ON products (category_id)",
    ),
    (
        "order_number_seq",
        "CREATE SEQUENCE IF NOT EXISTS order_number_seq START 1",
    ),
    (
        "orders",
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id               UUID PRIMARY KEY,
            order_number     BIGINT NOT NULL UNIQUE,
            idempotency_key  TEXT NOT NULL UNIQUE,
            status           TEXT NOT NULL,
            version          BIGINT NOT NULL,
            created_at       TIMESTAMPTZ NULL,
            document         JSONB NOT NULL
        )
        "#,
    ),
    (
        "wa_conversations",
        r#"
        CREATE TABLE IF NOT EXISTS wa_conversations (
            sender_phone     TEXT PRIMARY KEY,
            state            TEXT NOT NULL,
            pending_payload  JSONB NOT NULL DEFAULT '{}'::jsonb,
            updated_at       TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
    (
        "ingestion_attempts",
        r#"
        CREATE TABLE IF NOT EXISTS ingestion_attempts (
            id            BIGSERIAL PRIMARY KEY,
            sender_phone  TEXT NOT NULL,
            source_type   TEXT NOT NULL,
            source_value  TEXT NOT NULL,
            status        TEXT NOT NULL,
            error_code    TEXT NULL,
            payload       JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at    TIMESTAMPTZ NOT NULL
        )
        "#,
    ),
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for (name, sql) in STATEMENTS {
        sqlx::query(sql)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error(name, e))?;
    }
    info!(objects = STATEMENTS.len(), "database schema ready");
    Ok(())
}
