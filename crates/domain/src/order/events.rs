//! Order domain events.
//!
//! Events are immutable value objects recorded by the aggregate during a
//! lifecycle transition and drained by the caller after commit. They are not
//! persisted; they exist to hand the notification layer everything it needs
//! without another store round-trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{OrderId, ProductId, UserId};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// A new order was created and persisted.
    OrderCreated(OrderCreatedData),

    /// The order was paid.
    OrderPaid(OrderPaidData),

    /// The order was cancelled.
    OrderCancelled(OrderCancelledData),

    /// The linked product was reserved for the order.
    ProductReserved(ProductReservedData),

    /// The linked product was released back to the market.
    ProductReleased(ProductReleasedData),
}

impl OrderEvent {
    /// Returns the event type name, used for logging and dispatch.
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated(_) => "OrderCreated",
            OrderEvent::OrderPaid(_) => "OrderPaid",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
            OrderEvent::ProductReserved(_) => "ProductReserved",
            OrderEvent::ProductReleased(_) => "ProductReleased",
        }
    }
}

/// Data for OrderCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedData {
    /// The persisted order id (aggregate id).
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    /// Price snapshot at creation time.
    pub price: i64,
    pub buyer_email: String,
    pub buyer_name: String,
    pub seller_email: String,
    pub seller_name: String,
    pub product_name: String,
}

/// Data for OrderPaid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPaidData {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub product_id: ProductId,
    pub paid_at: DateTime<Utc>,
    pub buyer_email: String,
    pub product_name: String,
    pub paid_amount: i64,
}

/// Data for OrderCancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub product_id: ProductId,
    pub buyer_email: String,
    pub product_name: String,
}

/// Data for ProductReserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReservedData {
    pub order_id: OrderId,
    pub product_id: ProductId,
}

/// Data for ProductReleased.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReleasedData {
    pub order_id: OrderId,
    pub product_id: ProductId,
}
