//! Product use cases: catalog CRUD with seller ownership checks.

use common::{ProductId, UserId};

use crate::error::DomainError;
use crate::policy;
use crate::repos::Store;

use super::{Product, ProductError, ProductUpdate};

pub struct ProductService<S> {
    store: S,
}

impl<S: Store> ProductService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, description))]
    pub async fn create_product(
        &self,
        name: String,
        description: String,
        price: i64,
        seller_id: UserId,
    ) -> Result<Product, DomainError> {
        let product = Product::create(name, description, price, seller_id, true)?;
        let persisted = self.store.create_product(product).await?;
        metrics::counter!("products_created_total").increment(1);
        Ok(persisted)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product_by_id(product_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("Product not found".to_string()))
    }

    #[tracing::instrument(skip(self, update))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        seller_id: UserId,
        update: ProductUpdate,
    ) -> Result<Product, DomainError> {
        let mut product = self.get_product(product_id).await?;
        if !policy::is_product_owner(&product, seller_id) {
            return Err(DomainError::Forbidden(
                "You can only update your own products".to_string(),
            ));
        }
        product.apply_update(&update)?;
        Ok(self.store.update_product(&product).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_product(
        &self,
        product_id: ProductId,
        seller_id: UserId,
    ) -> Result<(), DomainError> {
        let product = self.get_product(product_id).await?;
        if !policy::is_product_owner(&product, seller_id) {
            return Err(DomainError::Forbidden(
                "You can only delete your own products".to_string(),
            ));
        }
        if !product.status.is_deletable() {
            let err = match product.status {
                super::ProductStatus::Reserved => ProductError::DeleteReserved,
                _ => ProductError::DeleteSold,
            };
            return Err(err.into());
        }
        let deleted = self.store.delete_product(product_id).await?;
        if !deleted {
            return Err(DomainError::NotFound("Product not found".to_string()));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_seller(&self, seller_id: UserId) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.get_products_by_seller(seller_id).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_available(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_available_products().await?)
    }
}
