//! Authorization predicates.
//!
//! Role and ownership checks live here as pure functions so the aggregate's
//! preconditions and the HTTP-layer guards evaluate the same rules and
//! cannot drift apart.

use common::UserId;

use crate::order::Order;
use crate::product::Product;
use crate::user::{User, UserRole};

/// True if the user acts as a buyer.
pub fn is_buyer(user: &User) -> bool {
    user.role == UserRole::Buyer
}

/// True if the user acts as a seller.
pub fn is_seller(user: &User) -> bool {
    user.role == UserRole::Seller
}

/// True if the user owns the product listing.
pub fn is_product_owner(product: &Product, user_id: UserId) -> bool {
    product.seller_id == user_id
}

/// True if the user placed the order. Only the order's buyer may cancel or
/// pay it.
pub fn is_order_buyer(order: &Order, user_id: UserId) -> bool {
    order.buyer_id == user_id
}
