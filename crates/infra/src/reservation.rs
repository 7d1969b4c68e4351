//! Inventory Reservation Engine.
//!
//! The only path by which `stock_quantity` goes down. Reads and writes for a
//! product happen under that product's lock, and the write itself is the
//! store's conditional decrement, so two checkouts racing for the last unit
//! cannot both succeed.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use storefront_catalog::{Product, ProductKey};
use storefront_core::{DomainError, ProductId};
use storefront_inventory::{Reservation, StockLevel};
use storefront_orders::{LineRequest, OrderLine, consolidate};

use crate::catalog_store::CatalogStore;
use crate::error::StoreError;
use crate::locks::KeyedLocks;

pub struct InventoryReservationEngine {
    catalog: Arc<dyn CatalogStore>,
    locks: KeyedLocks<ProductId>,
}

impl InventoryReservationEngine {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            catalog,
            locks: KeyedLocks::new(),
        }
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    async fn load(&self, id: ProductId) -> Result<Product, StoreError> {
        self.catalog
            .get_product(&ProductKey::Id(id))
            .await?
            .ok_or_else(|| DomainError::ProductNotFound.into())
    }

    /// Reserve `quantity` units of one product.
    ///
    /// Fails with `InsufficientStock` when fewer units are on hand.
    #[instrument(skip(self), err)]
    pub async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<Reservation, StoreError> {
        let _guard = self.locks.lock(&product_id).await;

        let product = self.load(product_id).await?;
        let reservation = StockLevel::of(&product).reserve(quantity)?;
        let after = self.catalog.decrement_stock(product_id, quantity).await?;

        debug!(%product_id, remaining = after.stock_quantity, "stock reserved");
        Ok(reservation)
    }

    /// Validate every line, then reserve them all.
    ///
    /// All lines are checked before any stock is touched: a cart with one
    /// unsellable line fails with `OutOfStock` and leaves stock unchanged.
    /// Returns price/name snapshots for the order.
    #[instrument(skip(self, requests), fields(lines = requests.len()), err)]
    pub async fn reserve_lines(&self, requests: &[LineRequest]) -> Result<Vec<OrderLine>, StoreError> {
        let requests = consolidate(requests)?;
        let ids: Vec<ProductId> = requests.iter().map(|r| r.product_id).collect();
        let _guards = self.locks.lock_all(&ids).await;

        let mut lines = Vec::with_capacity(requests.len());
        for req in &requests {
            let product = match self.load(req.product_id).await {
                Err(e) if e.is_not_found() => {
                    return Err(DomainError::OutOfStock {
                        product_id: req.product_id,
                    }
                    .into());
                }
                other => other?,
            };
            lines.push(OrderLine::snapshot(&product, req.quantity)?);
        }

        let mut taken: Vec<&OrderLine> = Vec::with_capacity(lines.len());
        for line in &lines {
            match self.catalog.decrement_stock(line.product_id, line.quantity).await {
                Ok(_) => taken.push(line),
                Err(err) => {
                    // Another process won the row; put back what this order took.
                    warn!(product_id = %line.product_id, error = %err, "reservation lost a race");
                    for done in taken {
                        self.put_back(done).await;
                    }
                    return Err(err);
                }
            }
        }

        Ok(lines)
    }

    /// Return the stock held by lines of an order that was not persisted.
    pub async fn release_lines(&self, lines: &[OrderLine]) {
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        let _guards = self.locks.lock_all(&ids).await;
        for line in lines {
            self.put_back(line).await;
        }
    }

    async fn put_back(&self, line: &OrderLine) {
        if let Err(err) = self.catalog.restock(line.product_id, line.quantity).await {
            warn!(product_id = %line.product_id, quantity = line.quantity, error = %err, "failed to release reserved stock");
        }
    }
}
