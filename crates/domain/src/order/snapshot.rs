//! Read-only identity snapshots held by the order aggregate.
//!
//! The aggregate captures these at construction so that events can carry
//! everything a notification consumer needs without re-querying the store.

use serde::{Deserialize, Serialize};

use common::{ProductId, UserId};

use crate::product::Product;
use crate::user::User;

/// Buyer identity at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerInfo {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl BuyerInfo {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name().to_string(),
        }
    }
}

/// Seller identity at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerInfo {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

impl SellerInfo {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name().to_string(),
        }
    }
}

/// Product name (and id) at order time. Later seller edits do not show up
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Option<ProductId>,
    pub name: String,
}

impl ProductSnapshot {
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
        }
    }
}
