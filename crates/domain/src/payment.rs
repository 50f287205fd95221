//! Payment gateway port.
//!
//! Real gateway integration is out of scope; the sole implementation is a
//! mock that accepts any card and fabricates an opaque payment reference.
//! Keeping the mock behind a port means the status-guard logic lives only in
//! the aggregate, never duplicated in a second payment path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use common::OrderId;

use crate::order::OrderStatus;

/// Errors raised by a payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment declined: {0}")]
    Declined(String),
}

/// Result payload of a successful payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub order_id: OrderId,
    pub payment_id: String,
    pub status: OrderStatus,
    pub paid_at: DateTime<Utc>,
}

/// External payment processing.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charges the card and returns an opaque payment reference.
    async fn charge(
        &self,
        order_id: OrderId,
        amount: i64,
        card_number: &str,
    ) -> Result<String, PaymentError>;
}

/// Gateway stub that approves everything.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentGateway;

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self
    }
}

const PAYMENT_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(
        &self,
        order_id: OrderId,
        amount: i64,
        _card_number: &str,
    ) -> Result<String, PaymentError> {
        let mut rng = rand::thread_rng();
        let token: String = (0..8)
            .map(|_| {
                let idx = rng.gen_range(0..PAYMENT_ID_CHARSET.len());
                PAYMENT_ID_CHARSET[idx] as char
            })
            .collect();
        let payment_id = format!("PAY_MOCK_{token}");
        tracing::debug!(%order_id, amount, %payment_id, "mock payment approved");
        Ok(payment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_fabricates_payment_ids() {
        let gateway = MockPaymentGateway::new();
        let id = gateway
            .charge(OrderId::new(1), 1000, "4242424242424242")
            .await
            .unwrap();

        assert!(id.starts_with("PAY_MOCK_"));
        assert_eq!(id.len(), "PAY_MOCK_".len() + 8);
        assert!(
            id["PAY_MOCK_".len()..]
                .bytes()
                .all(|b| PAYMENT_ID_CHARSET.contains(&b))
        );
    }

    #[tokio::test]
    async fn payment_ids_are_unlikely_to_repeat() {
        let gateway = MockPaymentGateway::new();
        let a = gateway.charge(OrderId::new(1), 100, "1").await.unwrap();
        let b = gateway.charge(OrderId::new(1), 100, "1").await.unwrap();
        assert_ne!(a, b);
    }
}
