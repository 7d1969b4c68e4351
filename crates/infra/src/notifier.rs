//! Order notifications guarded by the order's sent flags.
//!
//! A flag is checked before the send and set only after the provider
//! accepted it, so a redelivered event or an admin re-trigger never sends
//! twice once a send went through. Check, send and flag write run under the
//! order's lock, so the worker and an admin re-trigger cannot interleave.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use storefront_conversation::group_alert_text;
use storefront_orders::{Order, OrderNumber};

use crate::ledger::{LedgerError, OrderLedger};
use crate::locks::KeyedLocks;
use crate::messaging::MessagingGateway;

pub const CONFIRMATION_TEMPLATE: &str = "order_confirmation_ar";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "error")]
pub enum Delivery {
    Sent,
    AlreadySent,
    /// The send failed; the flag stays unset.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyReport {
    pub order_number: OrderNumber,
    pub confirmation: Delivery,
    pub group_alert: Delivery,
}

pub struct OrderNotifier {
    ledger: Arc<OrderLedger>,
    gateway: Arc<dyn MessagingGateway>,
    group_id: String,
    in_flight: KeyedLocks<OrderNumber>,
}

impl OrderNotifier {
    pub fn new(ledger: Arc<OrderLedger>, gateway: Arc<dyn MessagingGateway>, group_id: impl Into<String>) -> Self {
        Self {
            ledger,
            gateway,
            group_id: group_id.into(),
            in_flight: KeyedLocks::new(),
        }
    }

    /// Send whichever of the two notifications is still outstanding.
    pub async fn notify(&self, number: OrderNumber) -> Result<NotifyReport, LedgerError> {
        let _guard = self.in_flight.lock(&number).await;
        let order = self.ledger.get_by_order_number(number).await?;
        let confirmation = self.send_confirmation(&order).await?;
        let group_alert = self.send_group_alert(&order).await?;

        Ok(NotifyReport {
            order_number: number,
            confirmation,
            group_alert,
        })
    }

    async fn send_confirmation(&self, order: &Order) -> Result<Delivery, LedgerError> {
        let Some(number) = order.order_number() else {
            return Ok(Delivery::AlreadySent);
        };
        if order.confirmation_sent() {
            return Ok(Delivery::AlreadySent);
        }

        let to = order.customer().phone.trim_start_matches('+');
        let params = [number.to_string(), order.total().to_string()];
        if let Err(err) = self.gateway.send_template(to, CONFIRMATION_TEMPLATE, &params).await {
            warn!(order_number = %number, error = %err, "order confirmation not sent");
            return Ok(Delivery::Failed(err.code().to_string()));
        }

        self.ledger.mark_confirmation_sent(number).await?;
        info!(order_number = %number, "order confirmation sent");
        Ok(Delivery::Sent)
    }

    async fn send_group_alert(&self, order: &Order) -> Result<Delivery, LedgerError> {
        let Some(number) = order.order_number() else {
            return Ok(Delivery::AlreadySent);
        };
        if order.group_alert_sent() {
            return Ok(Delivery::AlreadySent);
        }

        if let Err(err) = self.gateway.send_text(&self.group_id, &group_alert_text(order)).await {
            warn!(order_number = %number, error = %err, "group alert not sent");
            return Ok(Delivery::Failed(err.code().to_string()));
        }

        self.ledger.mark_group_alert_sent(number).await?;
        info!(order_number = %number, "group alert sent");
        Ok(Delivery::Sent)
    }
}
