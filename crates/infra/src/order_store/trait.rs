use storefront_catalog::{Page, PageRequest};
use storefront_core::ExpectedVersion;
use storefront_orders::{Order, OrderNumber, OrderStatus};

use crate::error::StoreError;

#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    /// Allocate the next order number. Numbers only ever grow.
    async fn next_order_number(&self) -> Result<OrderNumber, StoreError>;

    /// Store a newly placed order.
    ///
    /// Fails with `Conflict` when the idempotency key or order number is taken.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, StoreError>;

    async fn find_by_number(&self, number: OrderNumber) -> Result<Option<Order>, StoreError>;

    /// Write back a changed order if the stored copy is still at `expected`.
    async fn save(&self, order: &Order, expected: ExpectedVersion) -> Result<(), StoreError>;

    /// Newest first, optionally narrowed to one status.
    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError>;
}
