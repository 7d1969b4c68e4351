use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{Aggregate, AggregateRoot, DomainError, Money, OrderId};
use storefront_events::Event;

use crate::customer::CustomerInfo;
use crate::line::OrderLine;
use crate::number::OrderNumber;
use crate::status::{OrderStatus, TransitionMode};

/// Only cash on delivery is offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cod,
}

/// One entry of the order's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor: Option<String>,
    pub at: DateTime<Utc>,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    order_number: Option<OrderNumber>,
    customer: CustomerInfo,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    delivery_fee: Money,
    total: Money,
    currency: String,
    payment_method: PaymentMethod,
    idempotency_key: String,
    confirmation_sent: bool,
    group_alert_sent: bool,
    claimed_by: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
    confirmed_at: Option<DateTime<Utc>>,
    customer_contacted_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    status_history: Vec<StatusChange>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    placed: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            order_number: None,
            customer: CustomerInfo::default(),
            status: OrderStatus::Pending,
            lines: Vec::new(),
            delivery_fee: Money::ZERO,
            total: Money::ZERO,
            currency: String::new(),
            payment_method: PaymentMethod::Cod,
            idempotency_key: String::new(),
            confirmation_sent: false,
            group_alert_sent: false,
            claimed_by: None,
            claimed_at: None,
            confirmed_at: None,
            customer_contacted_at: None,
            delivered_at: None,
            status_history: Vec::new(),
            created_at: None,
            updated_at: None,
            version: 0,
            placed: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn is_placed(&self) -> bool {
        self.placed
    }

    pub fn order_number(&self) -> Option<OrderNumber> {
        self.order_number
    }

    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn delivery_fee(&self) -> Money {
        self.delivery_fee
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    pub fn confirmation_sent(&self) -> bool {
        self.confirmation_sent
    }

    pub fn group_alert_sent(&self) -> bool {
        self.group_alert_sent
    }

    pub fn claimed_by(&self) -> Option<&str> {
        self.claimed_by.as_deref()
    }

    pub fn claimed_at(&self) -> Option<DateTime<Utc>> {
        self.claimed_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn customer_contacted_at(&self) -> Option<DateTime<Utc>> {
        self.customer_contacted_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn status_history(&self) -> &[StatusChange] {
        &self.status_history
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
///
/// Lines are already validated against the catalog and reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLine>,
    pub delivery_fee: Money,
    pub currency: String,
    pub idempotency_key: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub target: OrderStatus,
    /// Who asked for the change (chat profile name, `admin`).
    pub actor: Option<String>,
    pub mode: TransitionMode,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkConfirmationSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkConfirmationSent {
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkGroupAlertSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkGroupAlertSent {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceOrder(PlaceOrder),
    ChangeStatus(ChangeStatus),
    MarkConfirmationSent(MarkConfirmationSent),
    MarkGroupAlertSent(MarkGroupAlertSent),
}

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub customer: CustomerInfo,
    pub lines: Vec<OrderLine>,
    pub delivery_fee: Money,
    pub total: Money,
    pub currency: String,
    pub idempotency_key: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConfirmationSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmationSent {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub occurred_at: DateTime<Utc>,
}

/// Event: GroupAlertSent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAlertSent {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderPlaced(OrderPlaced),
    StatusChanged(StatusChanged),
    ConfirmationSent(ConfirmationSent),
    GroupAlertSent(GroupAlertSent),
}

impl OrderEvent {
    pub fn order_number(&self) -> OrderNumber {
        match self {
            OrderEvent::OrderPlaced(e) => e.order_number,
            OrderEvent::StatusChanged(e) => e.order_number,
            OrderEvent::ConfirmationSent(e) => e.order_number,
            OrderEvent::GroupAlertSent(e) => e.order_number,
        }
    }
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "orders.order.placed",
            OrderEvent::StatusChanged(_) => "orders.order.status_changed",
            OrderEvent::ConfirmationSent(_) => "orders.order.confirmation_sent",
            OrderEvent::GroupAlertSent(_) => "orders.order.group_alert_sent",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderPlaced(e) => e.occurred_at,
            OrderEvent::StatusChanged(e) => e.occurred_at,
            OrderEvent::ConfirmationSent(e) => e.occurred_at,
            OrderEvent::GroupAlertSent(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.order_number = Some(e.order_number);
                self.customer = e.customer.clone();
                self.status = OrderStatus::Pending;
                self.lines = e.lines.clone();
                self.delivery_fee = e.delivery_fee;
                self.total = e.total;
                self.currency = e.currency.clone();
                self.idempotency_key = e.idempotency_key.clone();
                self.created_at = Some(e.occurred_at);
                self.updated_at = Some(e.occurred_at);
                self.placed = true;
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                match e.to {
                    OrderStatus::Confirmed => self.confirmed_at = Some(e.occurred_at),
                    OrderStatus::Claimed => {
                        self.claimed_by = e.actor.clone();
                        self.claimed_at = Some(e.occurred_at);
                    }
                    OrderStatus::CustomerContacted => {
                        self.customer_contacted_at = Some(e.occurred_at)
                    }
                    OrderStatus::Delivered => {
                        self.delivered_at.get_or_insert(e.occurred_at);
                    }
                    OrderStatus::Pending => {}
                }
                self.status_history.push(StatusChange {
                    from: e.from,
                    to: e.to,
                    actor: e.actor.clone(),
                    at: e.occurred_at,
                });
                self.updated_at = Some(e.occurred_at);
            }
            OrderEvent::ConfirmationSent(e) => {
                self.confirmation_sent = true;
                self.updated_at = Some(e.occurred_at);
            }
            OrderEvent::GroupAlertSent(e) => {
                self.group_alert_sent = true;
                self.updated_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            OrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
            OrderCommand::MarkConfirmationSent(cmd) => self.handle_confirmation_sent(cmd),
            OrderCommand::MarkGroupAlertSent(cmd) => self.handle_group_alert_sent(cmd),
        }
    }
}

impl Order {
    fn ensure_placed(&self) -> Result<OrderNumber, DomainError> {
        match self.order_number {
            Some(n) if self.placed => Ok(n),
            _ => Err(DomainError::OrderNotFound),
        }
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.placed {
            return Err(DomainError::conflict("order already placed"));
        }
        if cmd.lines.is_empty() {
            return Err(DomainError::validation("empty_order", "order has no lines"));
        }
        if cmd.idempotency_key.trim().is_empty() {
            return Err(DomainError::validation(
                "idempotency_key_required",
                "idempotency key is required",
            ));
        }
        let customer = cmd.customer.clone().validated()?;

        let mut total = cmd.delivery_fee;
        for line in &cmd.lines {
            if line.quantity == 0 {
                return Err(DomainError::validation(
                    "invalid_quantity",
                    "line quantity must be at least 1",
                ));
            }
            total = total
                .checked_add(line.subtotal)
                .ok_or_else(|| DomainError::validation("invalid_price", "order total overflows"))?;
        }

        Ok(vec![OrderEvent::OrderPlaced(OrderPlaced {
            order_id: cmd.order_id,
            order_number: cmd.order_number,
            customer,
            lines: cmd.lines.clone(),
            delivery_fee: cmd.delivery_fee,
            total,
            currency: cmd.currency.clone(),
            idempotency_key: cmd.idempotency_key.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeStatus) -> Result<Vec<OrderEvent>, DomainError> {
        let order_number = self.ensure_placed()?;

        if cmd.target == self.status {
            return match cmd.mode {
                TransitionMode::Idempotent => Ok(vec![]),
                TransitionMode::FirstWins if cmd.target == OrderStatus::Claimed => {
                    Err(DomainError::AlreadyClaimed {
                        claimed_by: self.claimed_by.clone().unwrap_or_else(|| "-".to_string()),
                    })
                }
                TransitionMode::FirstWins => Err(DomainError::conflict(format!(
                    "order is already {}",
                    self.status
                ))),
            };
        }

        if !self.status.can_advance_to(cmd.target) {
            return Err(DomainError::invalid_transition(self.status, cmd.target));
        }

        Ok(vec![OrderEvent::StatusChanged(StatusChanged {
            order_id: self.id,
            order_number,
            from: self.status,
            to: cmd.target,
            actor: cmd.actor.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirmation_sent(
        &self,
        cmd: &MarkConfirmationSent,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        let order_number = self.ensure_placed()?;
        if self.confirmation_sent {
            return Ok(vec![]);
        }

        let mut events = vec![OrderEvent::ConfirmationSent(ConfirmationSent {
            order_id: self.id,
            order_number,
            occurred_at: cmd.occurred_at,
        })];

        if self.status == OrderStatus::Pending {
            events.push(OrderEvent::StatusChanged(StatusChanged {
                order_id: self.id,
                order_number,
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
                actor: None,
                occurred_at: cmd.occurred_at,
            }));
        }

        Ok(events)
    }

    fn handle_group_alert_sent(
        &self,
        cmd: &MarkGroupAlertSent,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        let order_number = self.ensure_placed()?;
        if self.group_alert_sent {
            return Ok(vec![]);
        }

        Ok(vec![OrderEvent::GroupAlertSent(GroupAlertSent {
            order_id: self.id,
            order_number,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ProductId;

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Mona Adel".into(),
            phone: "+201001234567".into(),
            city: "Cairo".into(),
            address: "12 Tahrir Street, Downtown".into(),
            notes: None,
        }
    }

    fn line(unit: u64, qty: u32) -> OrderLine {
        OrderLine {
            product_id: ProductId::new(),
            product_name: "Lamp".into(),
            quantity: qty,
            unit_price: Money::from_minor(unit),
            subtotal: Money::from_minor(unit * u64::from(qty)),
        }
    }

    fn place_cmd(fee: u64) -> PlaceOrder {
        PlaceOrder {
            order_id: OrderId::new(),
            order_number: OrderNumber::new(1).unwrap(),
            customer: customer(),
            lines: vec![line(1000, 2)],
            delivery_fee: Money::from_minor(fee),
            currency: "EGP".into(),
            idempotency_key: "key-1".into(),
            occurred_at: test_time(),
        }
    }

    fn placed_order() -> Order {
        let cmd = place_cmd(0);
        let mut order = Order::empty(cmd.order_id);
        let events = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap();
        order.apply(&events[0]);
        order
    }

    fn change(order: &mut Order, target: OrderStatus, mode: TransitionMode) -> Result<usize, DomainError> {
        let events = order.handle(&OrderCommand::ChangeStatus(ChangeStatus {
            target,
            actor: Some("Ahmed".into()),
            mode,
            occurred_at: test_time(),
        }))?;
        for e in &events {
            order.apply(e);
        }
        Ok(events.len())
    }

    #[test]
    fn place_order_totals_lines_plus_fee() {
        let cmd = place_cmd(3000);
        let order = Order::empty(cmd.order_id);
        let events = order.handle(&OrderCommand::PlaceOrder(cmd)).unwrap();

        match &events[0] {
            OrderEvent::OrderPlaced(e) => {
                assert_eq!(e.total, Money::from_minor(5000));
                assert_eq!(e.order_number.to_string(), "FS-0001");
            }
            _ => panic!("Expected OrderPlaced event"),
        }
    }

    #[test]
    fn placed_order_starts_pending_with_flags_unset() {
        let order = placed_order();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(!order.confirmation_sent());
        assert!(!order.group_alert_sent());
        assert_eq!(order.payment_method(), PaymentMethod::Cod);
        assert_eq!(order.version(), 1);
    }

    #[test]
    fn place_order_rejects_invalid_customer() {
        let mut cmd = place_cmd(0);
        cmd.customer.phone = "0100".into();
        let err = Order::empty(cmd.order_id)
            .handle(&OrderCommand::PlaceOrder(cmd))
            .unwrap_err();
        assert_eq!(err.code(), "phone_required");
    }

    #[test]
    fn place_order_twice_conflicts() {
        let order = placed_order();
        let err = order.handle(&OrderCommand::PlaceOrder(place_cmd(0))).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for duplicate placement"),
        }
    }

    #[test]
    fn claim_records_actor_and_history() {
        let mut order = placed_order();
        change(&mut order, OrderStatus::Claimed, TransitionMode::FirstWins).unwrap();

        assert_eq!(order.status(), OrderStatus::Claimed);
        assert_eq!(order.claimed_by(), Some("Ahmed"));
        assert!(order.claimed_at().is_some());
        assert_eq!(order.status_history().len(), 1);
        assert_eq!(order.status_history()[0].from, OrderStatus::Pending);
    }

    #[test]
    fn second_claim_fails_when_first_wins() {
        let mut order = placed_order();
        change(&mut order, OrderStatus::Claimed, TransitionMode::FirstWins).unwrap();
        let before = order.clone();

        match change(&mut order, OrderStatus::Claimed, TransitionMode::FirstWins) {
            Err(DomainError::AlreadyClaimed { claimed_by }) => assert_eq!(claimed_by, "Ahmed"),
            other => panic!("expected AlreadyClaimed, got {other:?}"),
        }
        assert_eq!(order, before);
    }

    #[test]
    fn same_target_is_a_no_op_when_idempotent() {
        let mut order = placed_order();
        change(&mut order, OrderStatus::CustomerContacted, TransitionMode::Idempotent).unwrap();
        let n = change(&mut order, OrderStatus::CustomerContacted, TransitionMode::Idempotent).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn claim_after_delivered_is_rejected_and_delivered_at_kept() {
        let mut order = placed_order();
        change(&mut order, OrderStatus::Delivered, TransitionMode::Idempotent).unwrap();
        let delivered_at = order.delivered_at();

        match change(&mut order, OrderStatus::Claimed, TransitionMode::FirstWins) {
            Err(DomainError::InvalidTransition { from, to }) => {
                assert_eq!(from, "delivered");
                assert_eq!(to, "claimed");
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        assert_eq!(change(&mut order, OrderStatus::Delivered, TransitionMode::Idempotent).unwrap(), 0);
        assert_eq!(order.delivered_at(), delivered_at);
    }

    #[test]
    fn deliver_is_allowed_from_any_open_status() {
        for start in [OrderStatus::Confirmed, OrderStatus::Claimed, OrderStatus::CustomerContacted] {
            let mut order = placed_order();
            change(&mut order, start, TransitionMode::Idempotent).unwrap();
            change(&mut order, OrderStatus::Delivered, TransitionMode::Idempotent).unwrap();
            assert_eq!(order.status(), OrderStatus::Delivered);
        }
    }

    #[test]
    fn confirmation_flag_fires_once_and_confirms_pending() {
        let mut order = placed_order();
        let cmd = OrderCommand::MarkConfirmationSent(MarkConfirmationSent { occurred_at: test_time() });

        let events = order.handle(&cmd).unwrap();
        assert_eq!(events.len(), 2);
        for e in &events {
            order.apply(e);
        }
        assert!(order.confirmation_sent());
        assert_eq!(order.status(), OrderStatus::Confirmed);

        assert!(order.handle(&cmd).unwrap().is_empty());
    }

    #[test]
    fn confirmation_does_not_move_claimed_order_back() {
        let mut order = placed_order();
        change(&mut order, OrderStatus::Claimed, TransitionMode::FirstWins).unwrap();

        let events = order
            .handle(&OrderCommand::MarkConfirmationSent(MarkConfirmationSent { occurred_at: test_time() }))
            .unwrap();
        assert_eq!(events.len(), 1);
        order.apply(&events[0]);
        assert_eq!(order.status(), OrderStatus::Claimed);
    }

    #[test]
    fn group_alert_flag_fires_once() {
        let mut order = placed_order();
        let cmd = OrderCommand::MarkGroupAlertSent(MarkGroupAlertSent { occurred_at: test_time() });
        let events = order.handle(&cmd).unwrap();
        order.apply(&events[0]);
        assert!(order.group_alert_sent());
        assert!(order.handle(&cmd).unwrap().is_empty());
    }

    #[test]
    fn status_change_on_unplaced_order_is_not_found() {
        let order = Order::empty(OrderId::new());
        let err = order
            .handle(&OrderCommand::ChangeStatus(ChangeStatus {
                target: OrderStatus::Claimed,
                actor: None,
                mode: TransitionMode::FirstWins,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::OrderNotFound);
    }

    #[test]
    fn order_survives_json_snapshot() {
        let mut order = placed_order();
        change(&mut order, OrderStatus::Claimed, TransitionMode::FirstWins).unwrap();

        let json = serde_json::to_value(&order).unwrap();
        let back: Order = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn status_strategy() -> impl Strategy<Value = OrderStatus> {
            prop_oneof![
                Just(OrderStatus::Pending),
                Just(OrderStatus::Confirmed),
                Just(OrderStatus::Claimed),
                Just(OrderStatus::CustomerContacted),
                Just(OrderStatus::Delivered),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: no sequence of status requests ever moves an order backward
            /// or rewrites delivered_at once set.
            #[test]
            fn status_never_regresses(targets in prop::collection::vec(status_strategy(), 1..20)) {
                let mut order = placed_order();
                let mut delivered_at = None;

                for target in targets {
                    let before = order.status();
                    let _ = change(&mut order, target, TransitionMode::Idempotent);
                    prop_assert!(order.status() == before || before.can_advance_to(order.status()));

                    if delivered_at.is_none() {
                        delivered_at = order.delivered_at();
                    }
                    prop_assert_eq!(order.delivered_at(), delivered_at);
                }
            }

            /// Property: handle is pure.
            #[test]
            fn handle_does_not_mutate(target in status_strategy()) {
                let order = placed_order();
                let snapshot = order.clone();
                let _ = order.handle(&OrderCommand::ChangeStatus(ChangeStatus {
                    target,
                    actor: None,
                    mode: TransitionMode::FirstWins,
                    occurred_at: Utc::now(),
                }));
                prop_assert_eq!(order, snapshot);
            }
        }
    }
}
