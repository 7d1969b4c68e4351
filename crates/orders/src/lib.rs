//! Orders domain module.
//!
//! The order aggregate and its status state machine, customer snapshot
//! validation, line items and order numbers. Pure logic; persistence and
//! stock reservation live in the infrastructure layer.

pub mod customer;
pub mod line;
pub mod number;
pub mod order;
pub mod status;

pub use customer::{CustomerInfo, is_egyptian_mobile};
pub use line::{LineRequest, OrderLine, consolidate};
pub use number::OrderNumber;
pub use order::{
    ChangeStatus, ConfirmationSent, GroupAlertSent, MarkConfirmationSent, MarkGroupAlertSent, Order,
    OrderCommand, OrderEvent, OrderPlaced, PaymentMethod, PlaceOrder, StatusChange, StatusChanged,
};
pub use status::{OrderStatus, TransitionMode};
