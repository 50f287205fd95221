//! Product entity.

use serde::{Deserialize, Serialize};

use common::{ProductId, UserId};

use super::{ProductError, ProductStatus};

/// A product listing owned by a seller.
///
/// `status` belongs to the order aggregate: seller edits go through
/// [`Product::apply_update`], which only touches name, description, price and
/// visibility. Reservation, release and sale happen as side effects of order
/// lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<ProductId>,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub seller_id: UserId,
    pub is_active: bool,
    pub status: ProductStatus,
}

/// Seller-editable fields. Omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub is_active: Option<bool>,
}

impl Product {
    /// Builds a new listing for a seller. The id is assigned by the store on
    /// insert.
    pub fn create(
        name: impl Into<String>,
        description: impl Into<String>,
        price: i64,
        seller_id: UserId,
        is_active: bool,
    ) -> Result<Self, ProductError> {
        if price <= 0 {
            return Err(ProductError::NonPositivePrice);
        }
        Ok(Self {
            id: None,
            name: name.into(),
            description: description.into(),
            price,
            seller_id,
            is_active,
            status: ProductStatus::Available,
        })
    }

    /// Applies a seller edit. Status is deliberately not part of
    /// [`ProductUpdate`].
    pub fn apply_update(&mut self, update: &ProductUpdate) -> Result<(), ProductError> {
        if let Some(price) = update.price {
            if price <= 0 {
                return Err(ProductError::NonPositivePrice);
            }
            self.price = price;
        }
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref description) = update.description {
            self.description = description.clone();
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        Ok(())
    }

    /// Claims the product for a pending order. Aggregate-only.
    pub(crate) fn reserve(&mut self) {
        self.status = ProductStatus::Reserved;
    }

    /// Returns a reserved product to the market. Aggregate-only.
    pub(crate) fn release(&mut self) {
        self.status = ProductStatus::Available;
    }

    /// Marks the product as sold. Aggregate-only.
    pub(crate) fn mark_sold(&mut self) {
        self.status = ProductStatus::Sold;
    }
}
