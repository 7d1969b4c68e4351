use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

/// Order fulfillment status.
///
/// `pending → confirmed → claimed → customer_contacted → delivered`.
/// Status only ever moves forward; stages may be skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Claimed,
    CustomerContacted,
    Delivered,
}

impl OrderStatus {
    fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Claimed => 2,
            OrderStatus::CustomerContacted => 3,
            OrderStatus::Delivered => 4,
        }
    }

    pub fn can_advance_to(self, target: OrderStatus) -> bool {
        target.rank() > self.rank()
    }

    pub fn is_terminal(self) -> bool {
        self == OrderStatus::Delivered
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Claimed => "claimed",
            OrderStatus::CustomerContacted => "customer_contacted",
            OrderStatus::Delivered => "delivered",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "claimed" => Ok(OrderStatus::Claimed),
            "customer_contacted" => Ok(OrderStatus::CustomerContacted),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(DomainError::validation(
                "invalid_status",
                format!("unknown order status: {other}"),
            )),
        }
    }
}

/// How a request for the status the order already has is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    /// Same target is accepted and changes nothing.
    #[default]
    Idempotent,
    /// Same target is rejected (first claim wins).
    FirstWins,
}
