//! PostgreSQL integration tests.
//!
//! These tests share a single PostgreSQL container and need a local Docker
//! daemon. Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use domain::repos::{NewUser, OrderRepo, ProductRepo, RepoError, UserRepo};
use domain::{OrderAggregate, OrderStatus, Product, ProductStatus, User, UserRole};
use sqlx::PgPool;
use store::PostgresStore;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh store with its own pool and cleared tables.
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE orders, products, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

async fn seed(store: &PostgresStore) -> (User, User, Product) {
    let seller = store
        .create_user(NewUser {
            email: "seller@example.com".to_string(),
            name: "Sally".to_string(),
            role: UserRole::Seller,
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    let buyer = store
        .create_user(NewUser {
            email: "buyer@example.com".to_string(),
            name: String::new(),
            role: UserRole::Buyer,
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    let product = store
        .create_product(Product::create("Desk Lamp", "Warm light", 3500, seller.id, true).unwrap())
        .await
        .unwrap();
    (buyer, seller, product)
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn create_order_reserves_product_atomically() {
    let store = get_test_store().await;
    let (buyer, seller, product) = seed(&store).await;

    let aggregate = OrderAggregate::create_order(&buyer, product.clone(), &seller).unwrap();
    let order = store.create_order(aggregate.changeset()).await.unwrap();
    assert!(order.id.is_some());
    assert_eq!(order.status, OrderStatus::PendingPayment);

    let stored = store
        .get_product_by_id(product.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ProductStatus::Reserved);
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn concurrent_reservation_conflicts() {
    let store = get_test_store().await;
    let (buyer, seller, product) = seed(&store).await;

    let winner = OrderAggregate::create_order(&buyer, product.clone(), &seller).unwrap();
    store.create_order(winner.changeset()).await.unwrap();

    let loser = OrderAggregate::create_order(&buyer, product, &seller).unwrap();
    let err = store.create_order(loser.changeset()).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "product" }));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn cancel_transition_commits_order_and_product_together() {
    let store = get_test_store().await;
    let (buyer, seller, product) = seed(&store).await;

    let mut aggregate = OrderAggregate::create_order(&buyer, product.clone(), &seller).unwrap();
    let order = store.create_order(aggregate.changeset()).await.unwrap();
    aggregate.set_order_id(order.id.unwrap());

    aggregate.cancel().unwrap();
    store.commit_transition(aggregate.changeset()).await.unwrap();

    let stored = store
        .get_order_by_id(order.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);

    let released = store
        .get_product_by_id(product.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(released.status, ProductStatus::Available);

    // Replaying the transition hits the pending-status guard.
    let err = store
        .commit_transition(aggregate.changeset())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "order" }));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn details_join_falls_back_to_email_local_part() {
    let store = get_test_store().await;
    let (buyer, seller, product) = seed(&store).await;

    let mut aggregate = OrderAggregate::create_order(&buyer, product, &seller).unwrap();
    let order = store.create_order(aggregate.changeset()).await.unwrap();
    aggregate.set_order_id(order.id.unwrap());

    let details = store.get_buyer_orders_with_details(buyer.id).await.unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].product_name, "Desk Lamp");
    // Buyer registered with an empty name.
    assert_eq!(details[0].buyer_name, "buyer");
    assert_eq!(details[0].seller_name, "Sally");
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn duplicate_email_is_a_conflict() {
    let store = get_test_store().await;
    seed(&store).await;

    let err = store
        .create_user(NewUser {
            email: "buyer@example.com".to_string(),
            name: "Other".to_string(),
            role: UserRole::Buyer,
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict { entity: "user" }));
}

#[tokio::test]
#[ignore = "requires a local Docker daemon"]
async fn credentials_lookup_is_case_insensitive() {
    let store = get_test_store().await;
    let (buyer, _, _) = seed(&store).await;

    let found = store
        .get_user_credentials("BUYER@example.com")
        .await
        .unwrap();
    let (user, hash) = found.unwrap();
    assert_eq!(user.id, buyer.id);
    assert_eq!(hash, "hash");
}
