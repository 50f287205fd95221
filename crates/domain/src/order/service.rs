//! Order use cases.
//!
//! Each method runs as one unit of work: load through the repositories,
//! drive the aggregate, persist the changeset atomically, then dispatch the
//! drained events. Dispatch happens strictly after commit so a notification
//! failure can never roll back a completed transition.

use std::sync::Arc;

use chrono::Utc;

use common::{OrderId, UserId};

use crate::error::DomainError;
use crate::notification::EmailDispatcher;
use crate::payment::{PaymentGateway, PaymentReceipt};
use crate::policy;
use crate::repos::{OrderDetails, RepoError, Store};

use super::{Order, OrderAggregate, OrderError, OrderEvent};

/// Service orchestrating the order lifecycle.
pub struct OrderService<S> {
    store: S,
    dispatcher: Arc<dyn EmailDispatcher>,
    gateway: Arc<dyn PaymentGateway>,
}

impl<S: Store> OrderService<S> {
    pub fn new(
        store: S,
        dispatcher: Arc<dyn EmailDispatcher>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            gateway,
        }
    }

    /// Creates an order for a buyer against a product, reserving the product.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(
        &self,
        buyer_id: UserId,
        product_id: common::ProductId,
    ) -> Result<Order, DomainError> {
        let buyer = self
            .store
            .get_user_by_id(buyer_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Buyer not found".to_string()))?;
        let (product, seller) = self
            .store
            .get_product_with_seller(product_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Product not found".to_string()))?;

        let mut aggregate = OrderAggregate::create_order(&buyer, product, &seller)?;

        let persisted = match self.store.create_order(aggregate.changeset()).await {
            Ok(order) => order,
            // the other buyer won the reservation race
            Err(RepoError::Conflict { .. }) => {
                return Err(OrderError::ProductNotAvailable.into());
            }
            Err(e) => return Err(e.into()),
        };
        let order_id = persisted
            .id
            .ok_or_else(|| RepoError::Backend("store returned order without id".to_string()))?;

        aggregate.set_order_id(order_id);
        aggregate.emit_creation_events()?;
        let events = aggregate.collect_events();
        self.dispatch(&events).await;

        metrics::counter!("orders_created_total").increment(1);
        Ok(persisted)
    }

    /// Fetches a single order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Order not found".to_string()))
    }

    /// Cancels an order on behalf of its buyer, releasing the product.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        buyer_id: UserId,
    ) -> Result<(), DomainError> {
        let order = self
            .store
            .get_order_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Order not found".to_string()))?;
        if !policy::is_order_buyer(&order, buyer_id) {
            return Err(DomainError::Forbidden(
                "Only the buyer can cancel this order".to_string(),
            ));
        }

        let (buyer, product, seller) = self.load_participants(&order).await?;
        let mut aggregate = OrderAggregate::from_existing_order(order, product, &buyer, &seller);
        aggregate.cancel()?;

        match self.store.commit_transition(aggregate.changeset()).await {
            Ok(_) => {}
            Err(RepoError::Conflict { .. }) => return Err(OrderError::NotCancellable.into()),
            Err(e) => return Err(e.into()),
        }

        let events = aggregate.collect_events();
        self.dispatch(&events).await;

        metrics::counter!("orders_cancelled_total").increment(1);
        Ok(())
    }

    /// Pays an order on behalf of its buyer, marking the product sold.
    #[tracing::instrument(skip(self, card_number))]
    pub async fn pay_order(
        &self,
        order_id: OrderId,
        buyer_id: UserId,
        card_number: &str,
    ) -> Result<PaymentReceipt, DomainError> {
        let order = self
            .store
            .get_order_by_id(order_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Order not found".to_string()))?;
        if !policy::is_order_buyer(&order, buyer_id) {
            return Err(DomainError::Forbidden(
                "Only the buyer can pay for this order".to_string(),
            ));
        }

        let (buyer, product, seller) = self.load_participants(&order).await?;
        let mut aggregate = OrderAggregate::from_existing_order(order, product, &buyer, &seller);
        aggregate.process_payment()?;

        // The charge runs before the status commit so a declined payment
        // never marks the order paid. If the commit then loses the
        // pending-status race, the order stays pending with a stray charge;
        // the mock gateway has no refund surface for it.
        let payment_id = self
            .gateway
            .charge(order_id, aggregate.order().price, card_number)
            .await?;

        match self.store.commit_transition(aggregate.changeset()).await {
            Ok(_) => {}
            Err(RepoError::Conflict { .. }) => {
                return Err(OrderError::InvalidStatusForPayment.into());
            }
            Err(e) => return Err(e.into()),
        }

        let events = aggregate.collect_events();
        self.dispatch(&events).await;

        metrics::counter!("orders_paid_total").increment(1);
        Ok(PaymentReceipt {
            order_id,
            payment_id,
            status: aggregate.order().status,
            paid_at: aggregate.order().paid_at.unwrap_or_else(Utc::now),
        })
    }

    /// Lists a buyer's orders with joined display fields, optionally
    /// filtered by status string. A filter matching no status yields an
    /// empty list.
    #[tracing::instrument(skip(self))]
    pub async fn list_buyer_orders(
        &self,
        buyer_id: UserId,
        status: Option<&str>,
    ) -> Result<Vec<OrderDetails>, DomainError> {
        let orders = self.store.get_buyer_orders_with_details(buyer_id).await?;
        Ok(filter_by_status(orders, status))
    }

    /// Lists a seller's orders with joined display fields.
    #[tracing::instrument(skip(self))]
    pub async fn list_seller_orders(
        &self,
        seller_id: UserId,
        status: Option<&str>,
    ) -> Result<Vec<OrderDetails>, DomainError> {
        let orders = self.store.get_seller_orders_with_details(seller_id).await?;
        Ok(filter_by_status(orders, status))
    }

    async fn load_participants(
        &self,
        order: &Order,
    ) -> Result<(crate::user::User, crate::product::Product, crate::user::User), DomainError>
    {
        let buyer = self
            .store
            .get_user_by_id(order.buyer_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Buyer not found".to_string()))?;
        let product = self
            .store
            .get_product_by_id(order.product_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Product not found".to_string()))?;
        let seller = self
            .store
            .get_user_by_id(order.seller_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Seller not found".to_string()))?;
        Ok((buyer, product, seller))
    }

    /// Translates drained events into notification calls. Failures are
    /// logged and swallowed: the transition is already committed.
    async fn dispatch(&self, events: &[OrderEvent]) {
        for event in events {
            let result = match event {
                OrderEvent::OrderCreated(data) => {
                    let buyer = self
                        .dispatcher
                        .send_order_confirmation(
                            &data.buyer_email,
                            data.order_id,
                            &data.product_name,
                            data.price,
                        )
                        .await;
                    match buyer {
                        Ok(()) => {
                            self.dispatcher
                                .notify_seller_new_order(
                                    &data.seller_email,
                                    data.order_id,
                                    &data.product_name,
                                    &data.buyer_name,
                                    data.price,
                                )
                                .await
                        }
                        err => err,
                    }
                }
                OrderEvent::OrderPaid(data) => {
                    self.dispatcher
                        .send_payment_confirmation(
                            &data.buyer_email,
                            data.order_id,
                            &data.product_name,
                            data.paid_amount,
                        )
                        .await
                }
                OrderEvent::OrderCancelled(data) => {
                    self.dispatcher
                        .send_order_cancellation(
                            &data.buyer_email,
                            data.order_id,
                            &data.product_name,
                        )
                        .await
                }
                OrderEvent::ProductReserved(data) => {
                    tracing::debug!(%data.order_id, %data.product_id, "product reserved");
                    Ok(())
                }
                OrderEvent::ProductReleased(data) => {
                    tracing::debug!(%data.order_id, %data.product_id, "product released");
                    Ok(())
                }
            };

            if let Err(err) = result {
                tracing::warn!(
                    event = event.event_type(),
                    error = %err,
                    "notification dispatch failed"
                );
            }
        }
    }
}

fn filter_by_status(orders: Vec<OrderDetails>, status: Option<&str>) -> Vec<OrderDetails> {
    match status {
        Some(filter) => orders
            .into_iter()
            .filter(|o| o.status.as_str() == filter)
            .collect(),
        None => orders,
    }
}
