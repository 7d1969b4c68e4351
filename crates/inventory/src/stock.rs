use serde::{Deserialize, Serialize};

use storefront_catalog::{Product, ProductStatus};
use storefront_core::{DomainError, DomainResult, ProductId};

/// Stock snapshot of one product, read under the product's reservation lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub on_hand: u32,
    pub status: ProductStatus,
}

/// Outcome of a successful reservation decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Stock left after the reservation.
    pub remaining: u32,
    /// Status the product must be stored with afterwards.
    pub status_after: ProductStatus,
}

impl Reservation {
    pub fn sold_out(&self) -> bool {
        self.remaining == 0
    }
}

impl StockLevel {
    pub fn of(product: &Product) -> Self {
        Self {
            product_id: product.id,
            on_hand: product.stock_quantity,
            status: product.status,
        }
    }

    /// Decide a reservation of `quantity` units.
    ///
    /// Reaching zero flips the product to `out_of_stock`.
    pub fn reserve(&self, quantity: u32) -> DomainResult<Reservation> {
        if quantity == 0 {
            return Err(DomainError::validation(
                "invalid_quantity",
                "reservation quantity must be at least 1",
            ));
        }
        if quantity > self.on_hand {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available: self.on_hand,
            });
        }

        let remaining = self.on_hand - quantity;
        let status_after = if remaining == 0 {
            ProductStatus::OutOfStock
        } else {
            self.status
        };

        Ok(Reservation {
            product_id: self.product_id,
            quantity,
            remaining,
            status_after,
        })
    }

    /// Put back units taken by an aborted order.
    ///
    /// A product that was flipped to `out_of_stock` by the reservation becomes
    /// `active` again.
    pub fn release(&self, quantity: u32) -> DomainResult<(u32, ProductStatus)> {
        let on_hand = self.on_hand.checked_add(quantity).ok_or_else(|| {
            DomainError::validation("invalid_quantity", "restock overflows stock quantity")
        })?;
        let status = if self.status == ProductStatus::OutOfStock && on_hand > 0 {
            ProductStatus::Active
        } else {
            self.status
        };
        Ok((on_hand, status))
    }
}
