//! Storage error model shared by every store implementation.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Duplicate slug, idempotency key or order number |
//! | Database (check constraint violation) | `23514` | `Conflict` | Negative stock written concurrently |
//! | Database (other) | Any other | `Database` | Other database errors |
//! | Other | N/A | `Database` | Pool closed, network errors, etc. |

use thiserror::Error;

use storefront_core::DomainError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A domain rule rejected the write (validation, not found, in use, ...).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A uniqueness or version check failed.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Domain(e) => e.code(),
            StoreError::Conflict(_) => "conflict",
            StoreError::Database(_) => "store_unavailable",
            StoreError::Corrupt(_) => "corrupt_record",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Domain(e) if e.is_not_found())
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") | Some("23514") => StoreError::Conflict(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::RowNotFound => {
            StoreError::Database(format!("unexpected row not found in {operation}"))
        }
        other => StoreError::Database(format!("{operation}: {other}")),
    }
}

pub(crate) fn corrupt(column: &str, err: impl core::fmt::Display) -> StoreError {
    StoreError::Corrupt(format!("failed to read {column}: {err}"))
}
