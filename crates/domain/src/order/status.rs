//! Order lifecycle state machine.

use serde::{Deserialize, Serialize};

/// The status of an order.
///
/// State transitions:
/// ```text
/// PendingPayment ──► Paid       (terminal)
///        │
///        └─────────► Cancelled  (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, product reserved, awaiting payment.
    #[default]
    PendingPayment,

    /// Payment completed (terminal state).
    Paid,

    /// Cancelled by the buyer (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can still be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::PendingPayment)
    }

    /// Returns true if the order can be paid.
    pub fn can_pay(&self) -> bool {
        matches!(self, OrderStatus::PendingPayment)
    }

    /// Returns true if no further transition is accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Returns the status as its wire/storage string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "pending_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a storage string back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_payment" => Some(OrderStatus::PendingPayment),
            "paid" => Some(OrderStatus::Paid),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
