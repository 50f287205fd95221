//! Persistence ports.
//!
//! The domain defines the repository contracts; adapters live in the `store`
//! crate. The two changeset methods on [`OrderRepo`] carry the atomicity
//! contract: the order and its linked product commit together or not at all,
//! and status transitions are guarded against concurrent writers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use common::{OrderId, ProductId, UserId};

use crate::order::{Order, OrderChangeset, OrderStatus};
use crate::product::Product;
use crate::user::{User, UserRole};

/// Errors surfaced by the persistence adapters.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A guarded status transition lost a race against a concurrent writer.
    #[error("conflicting concurrent update on {entity}")]
    Conflict { entity: &'static str },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A user row to insert. The password hash is opaque to the domain.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub password_hash: String,
}

/// Denormalized order row for the listing endpoints. Joined in a single
/// query; these reads bypass the aggregate entirely.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub product_name: String,
    pub buyer_name: String,
    pub seller_name: String,
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, RepoError>;

    /// Returns the user plus the stored password hash, for login.
    async fn get_user_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, RepoError>;
}

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError>;

    async fn get_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepoError>;

    /// Single round-trip join of the product and its seller.
    async fn get_product_with_seller(
        &self,
        id: ProductId,
    ) -> Result<Option<(Product, User)>, RepoError>;

    async fn update_product(&self, product: &Product) -> Result<Product, RepoError>;

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepoError>;

    async fn get_products_by_seller(&self, seller_id: UserId)
    -> Result<Vec<Product>, RepoError>;

    /// Active products in `available` status.
    async fn list_available_products(&self) -> Result<Vec<Product>, RepoError>;
}

#[async_trait]
pub trait OrderRepo: Send + Sync {
    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepoError>;

    /// Inserts the order and reserves the product in one transaction.
    ///
    /// The product write is guarded on the stored row still being
    /// `available`; a concurrent reservation surfaces as
    /// [`RepoError::Conflict`], never as a silent double-reservation.
    async fn create_order(&self, changeset: OrderChangeset) -> Result<Order, RepoError>;

    /// Persists a cancel/pay transition plus the product update in one
    /// transaction, guarded on the stored order still being
    /// `pending_payment`.
    async fn commit_transition(&self, changeset: OrderChangeset) -> Result<Order, RepoError>;

    async fn get_buyer_orders_with_details(
        &self,
        buyer_id: UserId,
    ) -> Result<Vec<OrderDetails>, RepoError>;

    async fn get_seller_orders_with_details(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<OrderDetails>, RepoError>;
}

/// Everything the use-case services need from persistence.
pub trait Store: UserRepo + ProductRepo + OrderRepo {}

impl<T: UserRepo + ProductRepo + OrderRepo> Store for T {}
