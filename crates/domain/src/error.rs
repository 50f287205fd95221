//! Service-level error type.

use thiserror::Error;

use crate::order::OrderError;
use crate::payment::PaymentError;
use crate::product::ProductError;
use crate::repos::RepoError;

/// Errors that can come out of a use-case service.
///
/// The API layer maps each variant to an HTTP status; use cases never catch
/// and reinterpret these on the way up.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Referenced order/product/buyer/seller does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller lacks permission for the requested action.
    #[error("{0}")]
    Forbidden(String),

    /// Business-rule violation raised by the order aggregate.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Business-rule violation raised by product operations.
    #[error(transparent)]
    Product(#[from] ProductError),

    /// Persistence failure.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Payment gateway failure.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}
