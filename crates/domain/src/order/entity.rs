//! Order entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{OrderId, ProductId, UserId};

use super::{OrderError, OrderStatus};

/// A purchase intent against a single product.
///
/// `price` snapshots the product price at creation time and never changes
/// afterwards. Transitions return a new value with `updated_at` refreshed;
/// the struct itself never mutates in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<OrderId>,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Builds a new pending order. The id is assigned by the store on insert.
    pub fn create(
        buyer_id: UserId,
        seller_id: UserId,
        product_id: ProductId,
        price: i64,
    ) -> Result<Self, OrderError> {
        if price <= 0 {
            return Err(OrderError::NonPositivePrice);
        }
        let now = Utc::now();
        Ok(Self {
            id: None,
            buyer_id,
            seller_id,
            product_id,
            price,
            status: OrderStatus::PendingPayment,
            created_at: now,
            updated_at: now,
            paid_at: None,
        })
    }

    /// Returns the paid version of this order with `paid_at` set.
    pub fn mark_as_paid(&self) -> Self {
        let now = Utc::now();
        Self {
            status: OrderStatus::Paid,
            paid_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Returns the cancelled version of this order. `paid_at` is untouched.
    pub fn cancel(&self) -> Self {
        Self {
            status: OrderStatus::Cancelled,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}
