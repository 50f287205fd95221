//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use common::{OrderId, ProductId, UserId};
use domain::order::Order;
use domain::repos::{OrderDetails, Store};

use crate::auth;
use crate::error::ApiError;

use super::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: i64,
}

#[derive(Deserialize)]
pub struct PayOrderRequest {
    pub card_number: String,
}

#[derive(Debug, Deserialize)]
pub struct MyOrdersQuery {
    pub order_status: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub product_id: i64,
    pub price: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl OrderResponse {
    fn from_order(order: &Order) -> Self {
        Self {
            id: order.id.map(i64::from).unwrap_or_default(),
            buyer_id: order.buyer_id.as_i64(),
            seller_id: order.seller_id.as_i64(),
            product_id: order.product_id.as_i64(),
            price: order.price,
            status: order.status.as_str().to_string(),
            created_at: order.created_at,
            paid_at: order.paid_at,
        }
    }
}

#[derive(Serialize)]
pub struct PaymentResponse {
    pub order_id: i64,
    pub payment_id: String,
    pub status: String,
    pub paid_at: DateTime<Utc>,
}

// -- Handlers --

/// POST /order — create an order, reserving the product (buyers only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user = auth::authenticate(&state.sessions, &state.store, &headers).await?;
    auth::require_buyer(&user)?;

    let order = state
        .order_service
        .create_order(user.id, ProductId::new(req.product_id))
        .await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from_order(&order))))
}

/// GET /order/my-orders — the caller's orders (purchases for buyers, sales
/// for sellers), optionally filtered with `?order_status=`.
#[tracing::instrument(skip(state, headers))]
pub async fn my_orders<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Query(query): Query<MyOrdersQuery>,
) -> Result<Json<Vec<OrderDetails>>, ApiError> {
    let user = auth::authenticate(&state.sessions, &state.store, &headers).await?;

    let status = query.order_status.as_deref();
    let orders = match user.role {
        domain::UserRole::Buyer => {
            state.order_service.list_buyer_orders(user.id, status).await?
        }
        domain::UserRole::Seller => {
            state.order_service.list_seller_orders(user.id, status).await?
        }
    };
    Ok(Json(orders))
}

/// GET /order/{id} — a single order, readable by any authenticated user.
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError> {
    auth::authenticate(&state.sessions, &state.store, &headers).await?;

    let order = state.order_service.get_order(OrderId::new(id)).await?;
    Ok(Json(OrderResponse::from_order(&order)))
}

/// DELETE /order/{id} — cancel a pending order (buyer only).
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user = auth::authenticate(&state.sessions, &state.store, &headers).await?;
    auth::require_buyer(&user)?;

    state
        .order_service
        .cancel_order(OrderId::new(id), user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /order/{id}/pay — pay for a pending order (buyer only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn pay<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<PayOrderRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let user = auth::authenticate(&state.sessions, &state.store, &headers).await?;
    auth::require_buyer(&user)?;

    let receipt = state
        .order_service
        .pay_order(OrderId::new(id), user.id, &req.card_number)
        .await?;
    Ok(Json(PaymentResponse {
        order_id: receipt.order_id.as_i64(),
        payment_id: receipt.payment_id,
        status: receipt.status.as_str().to_string(),
        paid_at: receipt.paid_at,
    }))
}

/// GET /order/seller/{seller_id} — a seller's sales, readable by any
/// authenticated user.
#[tracing::instrument(skip(state, headers))]
pub async fn seller_orders<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(seller_id): Path<i64>,
    Query(query): Query<MyOrdersQuery>,
) -> Result<Json<Vec<OrderDetails>>, ApiError> {
    auth::authenticate(&state.sessions, &state.store, &headers).await?;

    let orders = state
        .order_service
        .list_seller_orders(UserId::new(seller_id), query.order_status.as_deref())
        .await?;
    Ok(Json(orders))
}
