//! Order Ledger: idempotent order creation and status transitions.
//!
//! ```text
//! createOrder(customer, lines, key)
//!   ↓ lock idempotency key
//!   ↓ existing order for key? → return it (duplicate)
//!   ↓ validate customer
//!   ↓ reserve every line (all-or-nothing)
//!   ↓ allocate order number, handle PlaceOrder, insert
//!   ↓ publish OrderPlaced
//! ```
//!
//! Status writes load the order, run the aggregate's decision and save with
//! a compare-and-swap on the aggregate version. A stale write reloads and
//! decides again, so the second of two racing claims sees the first one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use storefront_catalog::{Page, PageRequest};
use storefront_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion, Money, OrderId};
use storefront_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use storefront_orders::{
    ChangeStatus, CustomerInfo, LineRequest, MarkConfirmationSent, MarkGroupAlertSent, Order,
    OrderCommand, OrderEvent, OrderLine, OrderNumber, OrderStatus, PlaceOrder, TransitionMode,
};

use crate::error::StoreError;
use crate::locks::KeyedLocks;
use crate::order_store::OrderStore;
use crate::reservation::InventoryReservationEngine;

pub const ORDER_AGGREGATE_TYPE: &str = "orders.order";

/// Stale-version retries before a status write gives up.
const MAX_CAS_ATTEMPTS: usize = 3;

pub type OrderEventBus = InMemoryEventBus<EventEnvelope<OrderEvent>>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The order kept changing between read and write.
    #[error("order {0} is being modified concurrently")]
    Contended(OrderNumber),
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        LedgerError::Store(StoreError::Domain(value))
    }
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Store(e) => e.code(),
            LedgerError::Contended(_) => "conflict",
        }
    }

    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            LedgerError::Store(StoreError::Domain(e)) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateOrderOutcome {
    pub order: Order,
    /// The key was seen before; nothing was reserved or notified this time.
    pub duplicate: bool,
}

#[derive(Debug, Clone)]
pub enum StatusUpdate {
    Updated(Order),
    /// The order already had the requested status.
    Unchanged(Order),
}

impl StatusUpdate {
    pub fn order(&self) -> &Order {
        match self {
            StatusUpdate::Updated(o) | StatusUpdate::Unchanged(o) => o,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            StatusUpdate::Updated(o) | StatusUpdate::Unchanged(o) => o,
        }
    }
}

pub struct OrderLedger {
    orders: Arc<dyn OrderStore>,
    engine: Arc<InventoryReservationEngine>,
    bus: Arc<OrderEventBus>,
    keys: KeyedLocks<String>,
    delivery_fee: Money,
    currency: String,
}

impl OrderLedger {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        engine: Arc<InventoryReservationEngine>,
        bus: Arc<OrderEventBus>,
        delivery_fee: Money,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            engine,
            bus,
            keys: KeyedLocks::new(),
            delivery_fee,
            currency: currency.into(),
        }
    }

    pub fn subscribe(&self) -> Subscription<EventEnvelope<OrderEvent>> {
        self.bus.subscribe()
    }

    pub fn delivery_fee(&self) -> Money {
        self.delivery_fee
    }

    /// Place an order, or return the one already placed under `idempotency_key`.
    #[instrument(skip(self, customer, lines), fields(lines = lines.len()), err)]
    pub async fn create_order(
        &self,
        customer: CustomerInfo,
        lines: &[LineRequest],
        idempotency_key: &str,
    ) -> Result<CreateOrderOutcome, LedgerError> {
        let key = idempotency_key.trim();
        if key.is_empty() {
            return Err(DomainError::validation(
                "idempotency_key_required",
                "idempotency key is required",
            )
            .into());
        }

        let _guard = self.keys.lock(&key.to_string()).await;

        if let Some(order) = self.orders.find_by_idempotency_key(key).await? {
            debug!(order_number = ?order.order_number(), "idempotent replay");
            return Ok(CreateOrderOutcome {
                order,
                duplicate: true,
            });
        }

        let customer = customer.validated()?;
        let reserved = self.engine.reserve_lines(lines).await?;

        match self.place(customer, &reserved, key).await {
            Ok(order) => {
                info!(order_number = ?order.order_number(), total = %order.total(), "order placed");
                Ok(CreateOrderOutcome {
                    order,
                    duplicate: false,
                })
            }
            Err(err) => {
                self.engine.release_lines(&reserved).await;
                // Another process may have committed the same key first.
                if matches!(err, LedgerError::Store(StoreError::Conflict(_))) {
                    if let Some(order) = self.orders.find_by_idempotency_key(key).await? {
                        return Ok(CreateOrderOutcome {
                            order,
                            duplicate: true,
                        });
                    }
                }
                Err(err)
            }
        }
    }

    async fn place(
        &self,
        customer: CustomerInfo,
        lines: &[OrderLine],
        key: &str,
    ) -> Result<Order, LedgerError> {
        let order_number = self.orders.next_order_number().await?;
        let mut order = Order::empty(OrderId::new());

        let command = OrderCommand::PlaceOrder(PlaceOrder {
            order_id: *order.id(),
            order_number,
            customer,
            lines: lines.to_vec(),
            delivery_fee: self.delivery_fee,
            currency: self.currency.clone(),
            idempotency_key: key.to_string(),
            occurred_at: Utc::now(),
        });
        let events = order.handle(&command)?;
        for event in &events {
            order.apply(event);
        }

        self.orders.insert(&order).await?;
        self.publish(&order, events);
        Ok(order)
    }

    pub async fn get_by_order_number(&self, number: OrderNumber) -> Result<Order, LedgerError> {
        self.orders
            .find_by_number(number)
            .await?
            .ok_or_else(|| DomainError::OrderNotFound.into())
    }

    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, LedgerError> {
        Ok(self.orders.list(status, page).await?)
    }

    /// Move an order forward. `actor` is recorded as `claimed_by` on claims.
    #[instrument(skip(self), fields(order_number = %number), err)]
    pub async fn update_status(
        &self,
        number: OrderNumber,
        target: OrderStatus,
        actor: Option<String>,
        mode: TransitionMode,
    ) -> Result<StatusUpdate, LedgerError> {
        let (order, changed) = self
            .execute(number, |now| {
                OrderCommand::ChangeStatus(ChangeStatus {
                    target,
                    actor: actor.clone(),
                    mode,
                    occurred_at: now,
                })
            })
            .await?;

        Ok(if changed {
            info!(status = %order.status(), "order status changed");
            StatusUpdate::Updated(order)
        } else {
            StatusUpdate::Unchanged(order)
        })
    }

    /// Record a sent customer confirmation. A pending order becomes confirmed.
    pub async fn mark_confirmation_sent(&self, number: OrderNumber) -> Result<Order, LedgerError> {
        let (order, _) = self
            .execute(number, |now| {
                OrderCommand::MarkConfirmationSent(MarkConfirmationSent { occurred_at: now })
            })
            .await?;
        Ok(order)
    }

    pub async fn mark_group_alert_sent(&self, number: OrderNumber) -> Result<Order, LedgerError> {
        let (order, _) = self
            .execute(number, |now| {
                OrderCommand::MarkGroupAlertSent(MarkGroupAlertSent { occurred_at: now })
            })
            .await?;
        Ok(order)
    }

    /// Load, decide, compare-and-swap. Returns the order and whether it changed.
    async fn execute<F>(&self, number: OrderNumber, make_command: F) -> Result<(Order, bool), LedgerError>
    where
        F: Fn(DateTime<Utc>) -> OrderCommand,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let mut order = self.get_by_order_number(number).await?;
            let expected = ExpectedVersion::Exact(order.version());

            let events = order.handle(&make_command(Utc::now()))?;
            if events.is_empty() {
                return Ok((order, false));
            }
            for event in &events {
                order.apply(event);
            }

            match self.orders.save(&order, expected).await {
                Ok(()) => {
                    self.publish(&order, events);
                    return Ok((order, true));
                }
                Err(StoreError::Conflict(reason)) => {
                    debug!(attempt, %reason, "stale order write, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(LedgerError::Contended(number))
    }

    fn publish(&self, order: &Order, events: Vec<OrderEvent>) {
        let first = order.version() + 1 - events.len() as u64;
        for (offset, event) in events.into_iter().enumerate() {
            let envelope = EventEnvelope::new(
                *order.id().as_uuid(),
                ORDER_AGGREGATE_TYPE,
                first + offset as u64,
                event,
            );
            if let Err(err) = self.bus.publish(envelope) {
                warn!(?err, "failed to publish order event");
            }
        }
    }
}
