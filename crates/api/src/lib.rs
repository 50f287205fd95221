//! HTTP API server for the marketplace backend.
//!
//! Exposes user, product, and order endpoints over the use-case services,
//! with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use domain::repos::Store;
use domain::{MockEmailDispatcher, MockPaymentGateway, OrderService, ProductService};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::SessionStore;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/user", post(routes::users::register::<S>))
        .route("/user/login", post(routes::users::login::<S>))
        .route("/user/logout", post(routes::users::logout::<S>))
        .route("/product", post(routes::products::create::<S>))
        .route("/product", get(routes::products::list::<S>))
        .route("/product/{id}", get(routes::products::get::<S>))
        .route("/product/{id}", patch(routes::products::update::<S>))
        .route("/product/{id}", delete(routes::products::delete::<S>))
        .route("/order", post(routes::orders::create::<S>))
        .route("/order/my-orders", get(routes::orders::my_orders::<S>))
        .route("/order/{id}", get(routes::orders::get::<S>))
        .route("/order/{id}", delete(routes::orders::cancel::<S>))
        .route("/order/{id}/pay", post(routes::orders::pay::<S>))
        .route(
            "/order/seller/{seller_id}",
            get(routes::orders::seller_orders::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state with mock notification and payment
/// services. The dispatcher handle is returned so tests can inspect sent
/// emails.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
) -> (Arc<AppState<S>>, Arc<MockEmailDispatcher>) {
    let dispatcher = Arc::new(MockEmailDispatcher::new());
    let gateway = Arc::new(MockPaymentGateway::new());

    let state = Arc::new(AppState {
        order_service: OrderService::new(store.clone(), dispatcher.clone(), gateway),
        product_service: ProductService::new(store.clone()),
        store,
        sessions: SessionStore::new(),
    });

    (state, dispatcher)
}
