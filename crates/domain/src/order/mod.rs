//! Order aggregate and related types.

mod aggregate;
mod entity;
mod events;
mod service;
mod snapshot;
mod status;

pub use aggregate::{OrderAggregate, OrderChangeset};
pub use entity::Order;
pub use events::{
    OrderCancelledData, OrderCreatedData, OrderEvent, OrderPaidData, ProductReleasedData,
    ProductReservedData,
};
pub use service::OrderService;
pub use snapshot::{BuyerInfo, ProductSnapshot, SellerInfo};
pub use status::OrderStatus;

use thiserror::Error;

/// Errors raised by order lifecycle operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Role precondition on the creation path. Permission error, not a
    /// business-rule violation.
    #[error("Only buyers can create orders")]
    BuyerRoleRequired,

    /// Buyers cannot order their own listings. Permission error.
    #[error("Cannot buy your own product")]
    OwnProduct,

    #[error("Product not active")]
    ProductNotActive,

    #[error("Product not available")]
    ProductNotAvailable,

    #[error("Order already paid")]
    AlreadyPaid,

    #[error("Cannot pay for cancelled order")]
    PayCancelled,

    #[error("Invalid order status for payment")]
    InvalidStatusForPayment,

    #[error("Cannot cancel paid order")]
    CancelPaid,

    #[error("Order already cancelled")]
    AlreadyCancelled,

    /// Raised when a concurrent transition wins the race at the store.
    #[error("Unable to cancel order")]
    NotCancellable,

    #[error("Price must be positive")]
    NonPositivePrice,

    /// Programmer contract: creation events need a persisted order id.
    #[error("Order must have an id before emitting events")]
    MissingOrderId,
}

impl OrderError {
    /// Permission errors map to 403 at the boundary; everything else is a
    /// business-rule violation (400).
    pub fn is_permission_error(&self) -> bool {
        matches!(self, OrderError::BuyerRoleRequired | OrderError::OwnProduct)
    }
}
