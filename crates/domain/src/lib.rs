//! Core domain model for the marketplace: users, products, and the order
//! lifecycle aggregate, plus the ports (repositories, notifications,
//! payments) the adapters implement.

pub mod error;
pub mod notification;
pub mod order;
pub mod payment;
pub mod policy;
pub mod product;
pub mod repos;
pub mod user;

pub use error::DomainError;
pub use notification::{EmailDispatcher, MockEmailDispatcher, NotificationError, SentEmail};
pub use order::{
    Order, OrderAggregate, OrderChangeset, OrderError, OrderEvent, OrderService, OrderStatus,
};
pub use payment::{MockPaymentGateway, PaymentError, PaymentGateway, PaymentReceipt};
pub use product::{Product, ProductError, ProductService, ProductStatus, ProductUpdate};
pub use repos::{NewUser, OrderDetails, OrderRepo, ProductRepo, RepoError, Store, UserRepo};
pub use user::{User, UserRole};
