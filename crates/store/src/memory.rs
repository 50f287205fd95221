use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use common::{OrderId, ProductId, UserId};
use domain::order::{Order, OrderChangeset, OrderStatus};
use domain::product::{Product, ProductStatus};
use domain::repos::{NewUser, OrderDetails, OrderRepo, ProductRepo, RepoError, UserRepo};
use domain::user::User;

#[derive(Default)]
struct State {
    users: HashMap<i64, (User, String)>,
    products: HashMap<i64, Product>,
    orders: HashMap<i64, Order>,
    next_user_id: i64,
    next_product_id: i64,
    next_order_id: i64,
}

/// In-memory store for tests and database-less local runs.
///
/// A single mutex over the whole state gives changeset commits the same
/// atomicity the PostgreSQL adapter gets from transactions: nothing else
/// observes a half-applied order/product pair.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of orders stored, for test assertions.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

fn display_name(user: &User) -> String {
    user.display_name().to_string()
}

#[async_trait]
impl UserRepo for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|(u, _)| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(RepoError::Conflict { entity: "user" });
        }
        state.next_user_id += 1;
        let id = state.next_user_id;
        let created = User {
            id: UserId::new(id),
            email: user.email,
            name: user.name,
            role: user.role,
        };
        state.users.insert(id, (created.clone(), user.password_hash));
        Ok(created)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id.as_i64()).map(|(u, _)| u.clone()))
    }

    async fn get_user_credentials(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|(u, _)| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl ProductRepo for InMemoryStore {
    async fn create_product(&self, product: Product) -> Result<Product, RepoError> {
        let mut state = self.state.lock().await;
        state.next_product_id += 1;
        let id = state.next_product_id;
        let mut created = product;
        created.id = Some(ProductId::new(id));
        state.products.insert(id, created.clone());
        Ok(created)
    }

    async fn get_product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.products.get(&id.as_i64()).cloned())
    }

    async fn get_product_with_seller(
        &self,
        id: ProductId,
    ) -> Result<Option<(Product, User)>, RepoError> {
        let state = self.state.lock().await;
        let Some(product) = state.products.get(&id.as_i64()).cloned() else {
            return Ok(None);
        };
        let seller = state
            .users
            .get(&product.seller_id.as_i64())
            .map(|(u, _)| u.clone())
            .ok_or(RepoError::NotFound { entity: "seller" })?;
        Ok(Some((product, seller)))
    }

    async fn update_product(&self, product: &Product) -> Result<Product, RepoError> {
        let mut state = self.state.lock().await;
        let id = product
            .id
            .ok_or(RepoError::NotFound { entity: "product" })?;
        if !state.products.contains_key(&id.as_i64()) {
            return Err(RepoError::NotFound { entity: "product" });
        }
        state.products.insert(id.as_i64(), product.clone());
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepoError> {
        let mut state = self.state.lock().await;
        Ok(state.products.remove(&id.as_i64()).is_some())
    }

    async fn get_products_by_seller(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<Product>, RepoError> {
        let state = self.state.lock().await;
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| p.seller_id == seller_id)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id.map(|id| id.as_i64()));
        Ok(products)
    }

    async fn list_available_products(&self) -> Result<Vec<Product>, RepoError> {
        let state = self.state.lock().await;
        let mut products: Vec<_> = state
            .products
            .values()
            .filter(|p| p.is_active && p.status == ProductStatus::Available)
            .cloned()
            .collect();
        products.sort_by_key(|p| p.id.map(|id| id.as_i64()));
        Ok(products)
    }
}

#[async_trait]
impl OrderRepo for InMemoryStore {
    async fn get_order_by_id(&self, id: OrderId) -> Result<Option<Order>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.orders.get(&id.as_i64()).cloned())
    }

    async fn create_order(&self, changeset: OrderChangeset) -> Result<Order, RepoError> {
        let mut state = self.state.lock().await;

        // Reservation guard: the stored row must still be available.
        if let Some(product) = &changeset.product {
            let id = product
                .id
                .ok_or(RepoError::NotFound { entity: "product" })?;
            let stored = state
                .products
                .get(&id.as_i64())
                .ok_or(RepoError::NotFound { entity: "product" })?;
            if stored.status != ProductStatus::Available {
                return Err(RepoError::Conflict { entity: "product" });
            }
        }

        state.next_order_id += 1;
        let id = state.next_order_id;
        let mut order = changeset.order;
        order.id = Some(OrderId::new(id));
        state.orders.insert(id, order.clone());

        if let Some(product) = changeset.product {
            let pid = product.id.map(|p| p.as_i64()).unwrap_or_default();
            state.products.insert(pid, product);
        }

        Ok(order)
    }

    async fn commit_transition(&self, changeset: OrderChangeset) -> Result<Order, RepoError> {
        let mut state = self.state.lock().await;

        let order = changeset.order;
        let id = order.id.ok_or(RepoError::NotFound { entity: "order" })?;
        let stored = state
            .orders
            .get(&id.as_i64())
            .ok_or(RepoError::NotFound { entity: "order" })?;
        // Transition guard: only a pending order can move.
        if stored.status != OrderStatus::PendingPayment {
            return Err(RepoError::Conflict { entity: "order" });
        }

        state.orders.insert(id.as_i64(), order.clone());
        if let Some(product) = changeset.product {
            let pid = product
                .id
                .ok_or(RepoError::NotFound { entity: "product" })?;
            state.products.insert(pid.as_i64(), product);
        }

        Ok(order)
    }

    async fn get_buyer_orders_with_details(
        &self,
        buyer_id: UserId,
    ) -> Result<Vec<OrderDetails>, RepoError> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.buyer_id == buyer_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        orders.iter().map(|o| join_details(&state, o)).collect()
    }

    async fn get_seller_orders_with_details(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<OrderDetails>, RepoError> {
        let state = self.state.lock().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.seller_id == seller_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        orders.iter().map(|o| join_details(&state, o)).collect()
    }
}

fn join_details(state: &State, order: &Order) -> Result<OrderDetails, RepoError> {
    let id = order.id.ok_or(RepoError::NotFound { entity: "order" })?;
    let product_name = state
        .products
        .get(&order.product_id.as_i64())
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let buyer_name = state
        .users
        .get(&order.buyer_id.as_i64())
        .map(|(u, _)| display_name(u))
        .unwrap_or_default();
    let seller_name = state
        .users
        .get(&order.seller_id.as_i64())
        .map(|(u, _)| display_name(u))
        .unwrap_or_default();

    Ok(OrderDetails {
        id,
        buyer_id: order.buyer_id,
        seller_id: order.seller_id,
        product_id: order.product_id,
        price: order.price,
        status: order.status,
        created_at: order.created_at,
        paid_at: order.paid_at,
        product_name,
        buyer_name,
        seller_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::user::UserRole;

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: String::new(),
            role,
            password_hash: "hash".to_string(),
        }
    }

    async fn seed(store: &InMemoryStore) -> (User, User, Product) {
        let seller = store
            .create_user(new_user("seller@example.com", UserRole::Seller))
            .await
            .unwrap();
        let buyer = store
            .create_user(new_user("buyer@example.com", UserRole::Buyer))
            .await
            .unwrap();
        let product = store
            .create_product(
                Product::create("Lamp", "A lamp", 1500, seller.id, true).unwrap(),
            )
            .await
            .unwrap();
        (buyer, seller, product)
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        store
            .create_user(new_user("a@example.com", UserRole::Buyer))
            .await
            .unwrap();
        let err = store
            .create_user(new_user("A@example.com", UserRole::Buyer))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict { entity: "user" }));
    }

    #[tokio::test]
    async fn create_order_reserves_and_guards_product() {
        let store = InMemoryStore::new();
        let (buyer, seller, product) = seed(&store).await;

        let mut aggregate =
            domain::OrderAggregate::create_order(&buyer, product.clone(), &seller).unwrap();
        let order = store.create_order(aggregate.changeset()).await.unwrap();
        assert!(order.id.is_some());
        aggregate.set_order_id(order.id.unwrap());

        let stored = store
            .get_product_by_id(product.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ProductStatus::Reserved);

        // Second reservation against the same product loses.
        let rival = domain::OrderAggregate::create_order(&buyer, product, &seller).unwrap();
        let err = store.create_order(rival.changeset()).await.unwrap_err();
        assert!(matches!(err, RepoError::Conflict { entity: "product" }));
    }

    #[tokio::test]
    async fn commit_transition_guards_pending_status() {
        let store = InMemoryStore::new();
        let (buyer, seller, product) = seed(&store).await;

        let mut aggregate =
            domain::OrderAggregate::create_order(&buyer, product.clone(), &seller).unwrap();
        let order = store.create_order(aggregate.changeset()).await.unwrap();
        aggregate.set_order_id(order.id.unwrap());

        aggregate.cancel().unwrap();
        store.commit_transition(aggregate.changeset()).await.unwrap();

        // Replaying the same transition hits the guard.
        let err = store
            .commit_transition(aggregate.changeset())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict { entity: "order" }));

        let released = store
            .get_product_by_id(product.id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(released.status, ProductStatus::Available);
    }

    #[tokio::test]
    async fn available_listing_skips_reserved_and_inactive() {
        let store = InMemoryStore::new();
        let (buyer, seller, product) = seed(&store).await;
        let mut hidden = Product::create("Hidden", "", 900, seller.id, false).unwrap();
        hidden = store.create_product(hidden).await.unwrap();

        let aggregate =
            domain::OrderAggregate::create_order(&buyer, product, &seller).unwrap();
        store.create_order(aggregate.changeset()).await.unwrap();

        let available = store.list_available_products().await.unwrap();
        assert!(available.is_empty());
        assert!(hidden.id.is_some());
    }
}
