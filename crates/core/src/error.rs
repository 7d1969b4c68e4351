//! Domain error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant carries a stable machine-readable [`code`](DomainError::code)
/// so outer layers can localize messages without parsing `Display` output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (bad customer info, bad product payload).
    #[error("validation failed ({code}): {message}")]
    Validation { code: &'static str, message: String },

    /// A product cannot be sold in the requested quantity.
    #[error("product {product_id} is out of stock")]
    OutOfStock { product_id: ProductId },

    /// A reservation asked for more units than are on hand.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("product not found")]
    ProductNotFound,

    #[error("category not found")]
    CategoryNotFound,

    #[error("order not found")]
    OrderNotFound,

    /// A category still referenced by products cannot be deleted.
    #[error("category is referenced by {product_count} product(s)")]
    CategoryInUse { product_count: u64 },

    /// Order status may only move forward.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// First claim wins; later claims are rejected.
    #[error("order already claimed by {claimed_by}")]
    AlreadyClaimed { claimed_by: String },

    /// A conflict occurred (stale version, duplicate slug, repeated action).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The chat sender is not on the authorization list.
    #[error("sender is not authorized")]
    UnauthorizedSender,
}

impl DomainError {
    pub fn validation(code: &'static str, msg: impl Into<String>) -> Self {
        Self::Validation {
            code,
            message: msg.into(),
        }
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_transition(from: impl core::fmt::Display, to: impl core::fmt::Display) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { code, .. } => code,
            DomainError::OutOfStock { .. } => "out_of_stock",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::ProductNotFound => "product_not_found",
            DomainError::CategoryNotFound => "category_not_found",
            DomainError::OrderNotFound => "order_not_found",
            DomainError::CategoryInUse { .. } => "category_in_use",
            DomainError::InvalidTransition { .. } => "invalid_transition",
            DomainError::AlreadyClaimed { .. } => "already_claimed",
            DomainError::Conflict(_) => "conflict",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::UnauthorizedSender => "unauthorized_sender",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::ProductNotFound | DomainError::CategoryNotFound | DomainError::OrderNotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_code_is_carried_through() {
        let err = DomainError::validation("phone_required", "phone must match +20XXXXXXXXXX");
        assert_eq!(err.code(), "phone_required");
        assert!(err.to_string().contains("phone_required"));
    }

    #[test]
    fn codes_are_distinct_from_messages() {
        let err = DomainError::InsufficientStock {
            requested: 3,
            available: 1,
        };
        assert_eq!(err.code(), "insufficient_stock");
        assert_ne!(err.code(), err.to_string());
    }

    #[test]
    fn not_found_family() {
        assert!(DomainError::OrderNotFound.is_not_found());
        assert!(!DomainError::CategoryInUse { product_count: 1 }.is_not_found());
    }
}
