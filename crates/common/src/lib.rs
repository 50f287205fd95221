//! Shared types used across the marketplace backend crates.

mod types;

pub use types::{OrderId, ProductId, UserId};
