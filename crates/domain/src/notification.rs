//! Notification port and its mock implementation.
//!
//! The aggregate never talks to this port directly; use cases translate the
//! drained domain events into the specific notification calls after commit.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use common::OrderId;

/// Errors raised by a notification dispatcher.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Order ids are store-assigned and always positive; anything else means
    /// the event was built before persistence finished.
    #[error("invalid order id {0}: order id must be positive")]
    InvalidOrderId(OrderId),
}

/// Rejects order ids that never came out of the store. Every port method
/// applies this before doing anything else.
pub fn ensure_valid_order_id(order_id: OrderId) -> Result<(), NotificationError> {
    if order_id.is_valid() {
        Ok(())
    } else {
        Err(NotificationError::InvalidOrderId(order_id))
    }
}

/// Outbound email notifications, one method per event consumer.
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    /// Notify the buyer that the order was created.
    async fn send_order_confirmation(
        &self,
        buyer_email: &str,
        order_id: OrderId,
        product_name: &str,
        price: i64,
    ) -> Result<(), NotificationError>;

    /// Notify the buyer that the payment was confirmed.
    async fn send_payment_confirmation(
        &self,
        buyer_email: &str,
        order_id: OrderId,
        product_name: &str,
        paid_amount: i64,
    ) -> Result<(), NotificationError>;

    /// Notify the buyer that the order was cancelled.
    async fn send_order_cancellation(
        &self,
        buyer_email: &str,
        order_id: OrderId,
        product_name: &str,
    ) -> Result<(), NotificationError>;

    /// Notify the seller about a newly created order.
    async fn notify_seller_new_order(
        &self,
        seller_email: &str,
        order_id: OrderId,
        product_name: &str,
        buyer_name: &str,
        price: i64,
    ) -> Result<(), NotificationError>;
}

/// A sent email as recorded by the mock dispatcher.
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// In-memory dispatcher that records every email instead of sending it.
/// Used in tests and local runs; the transport behind a real dispatcher is
/// out of scope here.
#[derive(Clone, Default)]
pub struct MockEmailDispatcher {
    sent: Arc<RwLock<Vec<SentEmail>>>,
}

impl MockEmailDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything sent so far.
    pub async fn sent_emails(&self) -> Vec<SentEmail> {
        self.sent.read().await.clone()
    }

    async fn record(&self, to: &str, subject: String, body: String) {
        tracing::info!(to, %subject, "mock email sent");
        self.sent.write().await.push(SentEmail {
            to: to.to_string(),
            subject,
            body,
            sent_at: Utc::now(),
        });
    }
}

#[async_trait]
impl EmailDispatcher for MockEmailDispatcher {
    async fn send_order_confirmation(
        &self,
        buyer_email: &str,
        order_id: OrderId,
        product_name: &str,
        price: i64,
    ) -> Result<(), NotificationError> {
        ensure_valid_order_id(order_id)?;
        self.record(
            buyer_email,
            format!("Order Confirmation - Order #{order_id}"),
            format!(
                "Thank you for your order!\n\nOrder ID: #{order_id}\nProduct: {product_name}\n\
                 Price: ${price}\nStatus: Pending Payment\n\nPlease complete your payment to \
                 process this order."
            ),
        )
        .await;
        Ok(())
    }

    async fn send_payment_confirmation(
        &self,
        buyer_email: &str,
        order_id: OrderId,
        product_name: &str,
        paid_amount: i64,
    ) -> Result<(), NotificationError> {
        ensure_valid_order_id(order_id)?;
        self.record(
            buyer_email,
            format!("Payment Confirmed - Order #{order_id}"),
            format!(
                "Your payment has been successfully processed!\n\nOrder ID: #{order_id}\n\
                 Product: {product_name}\nAmount Paid: ${paid_amount}\nStatus: Paid"
            ),
        )
        .await;
        Ok(())
    }

    async fn send_order_cancellation(
        &self,
        buyer_email: &str,
        order_id: OrderId,
        product_name: &str,
    ) -> Result<(), NotificationError> {
        ensure_valid_order_id(order_id)?;
        self.record(
            buyer_email,
            format!("Order Cancelled - Order #{order_id}"),
            format!(
                "Your order has been cancelled.\n\nOrder ID: #{order_id}\n\
                 Product: {product_name}"
            ),
        )
        .await;
        Ok(())
    }

    async fn notify_seller_new_order(
        &self,
        seller_email: &str,
        order_id: OrderId,
        product_name: &str,
        buyer_name: &str,
        price: i64,
    ) -> Result<(), NotificationError> {
        ensure_valid_order_id(order_id)?;
        self.record(
            seller_email,
            format!("New Order Received - Order #{order_id}"),
            format!(
                "You have received a new order!\n\nOrder ID: #{order_id}\n\
                 Product: {product_name}\nBuyer: {buyer_name}\nPrice: ${price}"
            ),
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_records_sent_emails() {
        let dispatcher = MockEmailDispatcher::new();
        dispatcher
            .send_order_confirmation("buyer@example.com", OrderId::new(1), "Lamp", 1000)
            .await
            .unwrap();

        let sent = dispatcher.sent_emails().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "buyer@example.com");
        assert!(sent[0].subject.contains("Order #1"));
        assert!(sent[0].body.contains("Lamp"));
    }

    #[tokio::test]
    async fn every_method_rejects_non_positive_order_id() {
        let dispatcher = MockEmailDispatcher::new();
        let bad = OrderId::new(0);

        assert!(dispatcher
            .send_order_confirmation("a@b.c", bad, "x", 1)
            .await
            .is_err());
        assert!(dispatcher
            .send_payment_confirmation("a@b.c", bad, "x", 1)
            .await
            .is_err());
        assert!(dispatcher
            .send_order_cancellation("a@b.c", bad, "x")
            .await
            .is_err());
        assert!(dispatcher
            .notify_seller_new_order("a@b.c", bad, "x", "y", 1)
            .await
            .is_err());
        assert!(dispatcher.sent_emails().await.is_empty());
    }
}
