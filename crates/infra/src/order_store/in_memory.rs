use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use storefront_catalog::{Page, PageRequest};
use storefront_core::{AggregateRoot, ExpectedVersion, OrderId};
use storefront_orders::{Order, OrderNumber, OrderStatus};

use super::r#trait::OrderStore;
use crate::error::StoreError;

/// In-memory order store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    sequence: AtomicU64,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Database("lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn next_order_number(&self) -> Result<OrderNumber, StoreError> {
        let next = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderNumber::new(next)?)
    }

    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;
        if orders.values().any(|o| {
            o.idempotency_key() == order.idempotency_key() || o.order_number() == order.order_number()
        }) {
            return Err(StoreError::Conflict(format!(
                "order already exists for key {}",
                order.idempotency_key()
            )));
        }
        orders.insert(*order.id(), order.clone());
        Ok(())
    }

    async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        Ok(orders.values().find(|o| o.idempotency_key() == key).cloned())
    }

    async fn find_by_number(&self, number: OrderNumber) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        Ok(orders
            .values()
            .find(|o| o.order_number() == Some(number))
            .cloned())
    }

    async fn save(&self, order: &Order, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut orders = self.orders.write().map_err(|_| Self::poisoned())?;
        let stored = orders
            .get_mut(order.id())
            .ok_or(storefront_core::DomainError::OrderNotFound)?;
        if !expected.matches(stored.version()) {
            return Err(StoreError::Conflict(format!(
                "stale order write (expected: {expected:?}, actual: {})",
                stored.version()
            )));
        }
        *stored = order.clone();
        Ok(())
    }

    async fn list(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, StoreError> {
        let orders = self.orders.read().map_err(|_| Self::poisoned())?;
        let all: Vec<Order> = orders.values().cloned().collect();
        Ok(Page::from_unsorted(
            all,
            |o| status.is_none_or(|s| o.status() == s),
            |a, b| b.order_number().cmp(&a.order_number()),
            page,
        ))
    }
}
