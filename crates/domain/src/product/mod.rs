//! Product entity and related types.

mod entity;
mod service;
mod status;

pub use entity::{Product, ProductUpdate};
pub use service::ProductService;
pub use status::ProductStatus;

use thiserror::Error;

/// Errors raised by product operations.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("Price must be positive")]
    NonPositivePrice,

    #[error("Cannot delete reserved product")]
    DeleteReserved,

    #[error("Cannot delete sold product")]
    DeleteSold,
}
