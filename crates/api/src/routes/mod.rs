//! HTTP route handlers.

pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod users;

use domain::repos::Store;
use domain::{OrderService, ProductService};

use crate::auth::SessionStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub order_service: OrderService<S>,
    pub product_service: ProductService<S>,
    pub store: S,
    pub sessions: SessionStore,
}
