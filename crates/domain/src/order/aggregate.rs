//! Order aggregate root.
//!
//! The aggregate is the only unit allowed to change `Order.status` or the
//! linked `Product.status` as part of an order lifecycle transition. It does
//! no I/O: mutations stay in memory and are handed to the caller as an
//! [`OrderChangeset`] for atomic persistence, and side effects are recorded
//! as [`OrderEvent`]s drained through [`OrderAggregate::collect_events`].

use chrono::Utc;

use common::{OrderId, ProductId};

use crate::policy;
use crate::product::Product;
use crate::user::User;

use super::{
    BuyerInfo, Order, OrderError, OrderEvent, ProductSnapshot, SellerInfo,
    events::{
        OrderCancelledData, OrderCreatedData, OrderPaidData, ProductReleasedData,
        ProductReservedData,
    },
};

/// The dual-entity write set produced by a lifecycle transition.
///
/// The caller must persist `order` and, when present, `product` inside one
/// transaction; both commit or both roll back.
#[derive(Debug, Clone)]
pub struct OrderChangeset {
    pub order: Order,
    pub product: Option<Product>,
}

/// Aggregate root composing the order, the live product, and identity
/// snapshots of buyer and seller.
#[derive(Debug, Clone)]
pub struct OrderAggregate {
    order: Order,
    product_snapshot: ProductSnapshot,
    buyer: BuyerInfo,
    seller: SellerInfo,
    product: Option<Product>,
    events: Vec<OrderEvent>,
}

impl OrderAggregate {
    /// Creates a new order for a buyer against an available product.
    ///
    /// Preconditions are checked in order; the first failure wins. On success
    /// the held product is reserved in memory. No events are recorded yet:
    /// creation events need a persisted order id, see
    /// [`OrderAggregate::emit_creation_events`].
    pub fn create_order(
        buyer: &User,
        product: Product,
        seller: &User,
    ) -> Result<Self, OrderError> {
        if !policy::is_buyer(buyer) {
            return Err(OrderError::BuyerRoleRequired);
        }
        if policy::is_product_owner(&product, buyer.id) {
            return Err(OrderError::OwnProduct);
        }
        if !product.is_active {
            return Err(OrderError::ProductNotActive);
        }
        if !product.status.can_reserve() {
            return Err(OrderError::ProductNotAvailable);
        }

        let order = Order::create(
            buyer.id,
            product.seller_id,
            product.id.unwrap_or_else(|| ProductId::new(0)),
            product.price,
        )?;

        let mut aggregate = Self {
            order,
            product_snapshot: ProductSnapshot::from_product(&product),
            buyer: BuyerInfo::from_user(buyer),
            seller: SellerInfo::from_user(seller),
            product: Some(product),
            events: Vec::new(),
        };
        aggregate.reserve_product();
        Ok(aggregate)
    }

    /// Rehydrates the aggregate around an already-persisted order for the
    /// cancel and pay paths. No validation happens here; guards belong to the
    /// individual transitions and to the caller.
    pub fn from_existing_order(
        order: Order,
        product: Product,
        buyer: &User,
        seller: &User,
    ) -> Self {
        Self {
            order,
            product_snapshot: ProductSnapshot::from_product(&product),
            buyer: BuyerInfo::from_user(buyer),
            seller: SellerInfo::from_user(seller),
            product: Some(product),
            events: Vec::new(),
        }
    }

    /// Records the creation events once the store has assigned the order id.
    ///
    /// Calling this before [`OrderAggregate::set_order_id`] is a programming
    /// error, not a domain violation.
    pub fn emit_creation_events(&mut self) -> Result<(), OrderError> {
        let order_id = self.order.id.ok_or(OrderError::MissingOrderId)?;

        self.events.push(OrderEvent::OrderCreated(OrderCreatedData {
            order_id,
            buyer_id: self.order.buyer_id,
            seller_id: self.order.seller_id,
            product_id: self.order.product_id,
            price: self.order.price,
            buyer_email: self.buyer.email.clone(),
            buyer_name: self.buyer.name.clone(),
            seller_email: self.seller.email.clone(),
            seller_name: self.seller.name.clone(),
            product_name: self.product_snapshot.name.clone(),
        }));

        if let Some(product) = &self.product {
            if product.status.can_release() {
                self.events.push(OrderEvent::ProductReserved(ProductReservedData {
                    order_id,
                    product_id: self.order.product_id,
                }));
            }
        }

        Ok(())
    }

    /// Marks the order as paid and the held product as sold.
    pub fn process_payment(&mut self) -> Result<(), OrderError> {
        if !self.order.status.can_pay() {
            return Err(match self.order.status {
                super::OrderStatus::Paid => OrderError::AlreadyPaid,
                super::OrderStatus::Cancelled => OrderError::PayCancelled,
                _ => OrderError::InvalidStatusForPayment,
            });
        }

        self.order = self.order.mark_as_paid();
        if let Some(product) = &mut self.product {
            product.mark_sold();
        }

        self.events.push(OrderEvent::OrderPaid(OrderPaidData {
            order_id: self.order_id_or_zero(),
            buyer_id: self.order.buyer_id,
            product_id: self.order.product_id,
            paid_at: self.order.paid_at.unwrap_or_else(Utc::now),
            buyer_email: self.buyer.email.clone(),
            product_name: self.product_snapshot.name.clone(),
            paid_amount: self.order.price,
        }));

        Ok(())
    }

    /// Cancels the order and releases the product if it was reserved.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        match self.order.status {
            super::OrderStatus::Paid => return Err(OrderError::CancelPaid),
            super::OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled),
            _ => {}
        }

        self.order = self.order.cancel();
        self.release_product();

        self.events.push(OrderEvent::OrderCancelled(OrderCancelledData {
            order_id: self.order_id_or_zero(),
            buyer_id: self.order.buyer_id,
            product_id: self.order.product_id,
            buyer_email: self.buyer.email.clone(),
            product_name: self.product_snapshot.name.clone(),
        }));

        Ok(())
    }

    /// Drains the recorded events in emission order. Subsequent calls return
    /// an empty list until a new transition records more.
    pub fn collect_events(&mut self) -> Vec<OrderEvent> {
        std::mem::take(&mut self.events)
    }

    /// Backfills the store-assigned order id after insertion.
    pub fn set_order_id(&mut self, id: OrderId) {
        self.order.id = Some(id);
    }

    /// Returns the write set for the transaction boundary.
    pub fn changeset(&self) -> OrderChangeset {
        OrderChangeset {
            order: self.order.clone(),
            product: self.product.clone(),
        }
    }

    /// The current order state.
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// The held product, if any, with in-memory status mutations applied.
    pub fn product_for_update(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    fn reserve_product(&mut self) {
        if let Some(product) = &mut self.product {
            product.reserve();
        }
    }

    fn release_product(&mut self) {
        if let Some(product) = &mut self.product {
            if product.status.can_release() {
                product.release();
                self.events.push(OrderEvent::ProductReleased(ProductReleasedData {
                    order_id: self.order_id_or_zero(),
                    product_id: self.order.product_id,
                }));
            }
        }
    }

    // Rehydrated orders always carry an id; a zero id on an unpersisted
    // order is caught by the notification port's validation.
    fn order_id_or_zero(&self) -> OrderId {
        self.order.id.unwrap_or_else(|| OrderId::new(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use crate::product::ProductStatus;
    use crate::user::UserRole;
    use common::UserId;

    fn buyer() -> User {
        User {
            id: UserId::new(1),
            email: "buyer@example.com".to_string(),
            name: "Buyer".to_string(),
            role: UserRole::Buyer,
        }
    }

    fn seller() -> User {
        User {
            id: UserId::new(2),
            email: "seller@example.com".to_string(),
            name: "Seller".to_string(),
            role: UserRole::Seller,
        }
    }

    fn product() -> Product {
        let mut p = Product::create("Lamp", "Desk lamp", 1000, UserId::new(2), true).unwrap();
        p.id = Some(ProductId::new(3));
        p
    }

    fn created_aggregate() -> OrderAggregate {
        let mut aggregate =
            OrderAggregate::create_order(&buyer(), product(), &seller()).unwrap();
        aggregate.set_order_id(OrderId::new(10));
        aggregate
    }

    #[test]
    fn create_order_reserves_product_and_snapshots_price() {
        let aggregate = OrderAggregate::create_order(&buyer(), product(), &seller()).unwrap();

        let order = aggregate.order();
        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.price, 1000);
        assert!(order.id.is_none());
        assert_eq!(
            aggregate.product_for_update().unwrap().status,
            ProductStatus::Reserved
        );
    }

    #[test]
    fn create_order_defers_events_until_id_is_known() {
        let mut aggregate = OrderAggregate::create_order(&buyer(), product(), &seller()).unwrap();
        assert!(aggregate.collect_events().is_empty());
        assert!(matches!(
            aggregate.emit_creation_events(),
            Err(OrderError::MissingOrderId)
        ));
    }

    #[test]
    fn create_order_rejects_seller_role() {
        let result = OrderAggregate::create_order(&seller(), product(), &seller());
        assert!(matches!(result, Err(OrderError::BuyerRoleRequired)));
    }

    #[test]
    fn create_order_rejects_own_product() {
        let mut own_buyer = buyer();
        own_buyer.id = UserId::new(2);
        let result = OrderAggregate::create_order(&own_buyer, product(), &seller());
        assert!(matches!(result, Err(OrderError::OwnProduct)));
    }

    #[test]
    fn create_order_rejects_inactive_product() {
        let mut p = product();
        p.is_active = false;
        let result = OrderAggregate::create_order(&buyer(), p, &seller());
        assert!(matches!(result, Err(OrderError::ProductNotActive)));
    }

    #[test]
    fn create_order_rejects_unavailable_product() {
        let mut p = product();
        p.reserve();
        let result = OrderAggregate::create_order(&buyer(), p, &seller());
        assert!(matches!(result, Err(OrderError::ProductNotAvailable)));
    }

    #[test]
    fn precondition_order_role_before_ownership() {
        // a seller buying their own product fails on the role check first
        let mut own_seller = seller();
        own_seller.id = UserId::new(2);
        let result = OrderAggregate::create_order(&own_seller, product(), &seller());
        assert!(matches!(result, Err(OrderError::BuyerRoleRequired)));
    }

    #[test]
    fn creation_events_are_complete() {
        let mut aggregate = created_aggregate();
        aggregate.emit_creation_events().unwrap();
        let events = aggregate.collect_events();

        assert_eq!(events.len(), 2);
        match &events[0] {
            OrderEvent::OrderCreated(data) => {
                assert_eq!(data.order_id, OrderId::new(10));
                assert_eq!(data.price, 1000);
                assert_eq!(data.buyer_email, "buyer@example.com");
                assert_eq!(data.seller_email, "seller@example.com");
                assert_eq!(data.product_name, "Lamp");
            }
            other => panic!("expected OrderCreated, got {}", other.event_type()),
        }
        assert!(matches!(events[1], OrderEvent::ProductReserved(_)));
    }

    #[test]
    fn collect_events_drains_exactly_once() {
        let mut aggregate = created_aggregate();
        aggregate.emit_creation_events().unwrap();
        assert_eq!(aggregate.collect_events().len(), 2);
        assert!(aggregate.collect_events().is_empty());
    }

    #[test]
    fn cancel_releases_reserved_product() {
        let mut aggregate = created_aggregate();
        aggregate.collect_events();

        aggregate.cancel().unwrap();

        assert_eq!(aggregate.order().status, OrderStatus::Cancelled);
        assert!(aggregate.order().paid_at.is_none());
        assert_eq!(
            aggregate.product_for_update().unwrap().status,
            ProductStatus::Available
        );

        let events = aggregate.collect_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], OrderEvent::ProductReleased(_)));
        assert!(matches!(events[1], OrderEvent::OrderCancelled(_)));
    }

    #[test]
    fn cancel_without_reserved_product_emits_only_cancellation() {
        let mut order =
            Order::create(UserId::new(1), UserId::new(2), ProductId::new(3), 1000).unwrap();
        order.id = Some(OrderId::new(10));
        let mut p = product();
        p.reserve();
        p.mark_sold(); // not releasable
        let mut aggregate = OrderAggregate::from_existing_order(order, p, &buyer(), &seller());

        aggregate.cancel().unwrap();

        let events = aggregate.collect_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], OrderEvent::OrderCancelled(_)));
    }

    #[test]
    fn cancel_rejects_paid_order() {
        let mut aggregate = created_aggregate();
        aggregate.process_payment().unwrap();
        assert!(matches!(aggregate.cancel(), Err(OrderError::CancelPaid)));
    }

    #[test]
    fn cancel_rejects_cancelled_order() {
        let mut aggregate = created_aggregate();
        aggregate.cancel().unwrap();
        assert!(matches!(
            aggregate.cancel(),
            Err(OrderError::AlreadyCancelled)
        ));
    }

    #[test]
    fn payment_marks_order_paid_and_product_sold() {
        let mut aggregate = created_aggregate();
        aggregate.collect_events();

        aggregate.process_payment().unwrap();

        assert_eq!(aggregate.order().status, OrderStatus::Paid);
        assert!(aggregate.order().paid_at.is_some());
        assert_eq!(
            aggregate.product_for_update().unwrap().status,
            ProductStatus::Sold
        );

        let events = aggregate.collect_events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            OrderEvent::OrderPaid(data) => {
                assert_eq!(data.paid_amount, 1000);
                assert_eq!(data.buyer_email, "buyer@example.com");
            }
            other => panic!("expected OrderPaid, got {}", other.event_type()),
        }
    }

    #[test]
    fn payment_rejects_paid_order() {
        let mut aggregate = created_aggregate();
        aggregate.process_payment().unwrap();
        assert!(matches!(
            aggregate.process_payment(),
            Err(OrderError::AlreadyPaid)
        ));
    }

    #[test]
    fn payment_rejects_cancelled_order() {
        let mut aggregate = created_aggregate();
        aggregate.cancel().unwrap();
        assert!(matches!(
            aggregate.process_payment(),
            Err(OrderError::PayCancelled)
        ));
    }

    #[test]
    fn changeset_carries_both_entities() {
        let mut aggregate = created_aggregate();
        aggregate.cancel().unwrap();

        let changeset = aggregate.changeset();
        assert_eq!(changeset.order.status, OrderStatus::Cancelled);
        assert_eq!(
            changeset.product.unwrap().status,
            ProductStatus::Available
        );
    }

    #[test]
    fn price_snapshot_ignores_later_product_changes() {
        let aggregate = created_aggregate();
        let mut changeset = aggregate.changeset();
        if let Some(product) = &mut changeset.product {
            product.price = 9999;
        }
        assert_eq!(aggregate.order().price, 1000);
    }
}
