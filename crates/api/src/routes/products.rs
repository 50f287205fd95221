//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use common::{ProductId, UserId};
use domain::product::{Product, ProductUpdate};
use domain::repos::Store;

use crate::auth;
use crate::error::ApiError;

use super::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub seller_id: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub seller_id: i64,
    pub is_active: bool,
    pub status: String,
}

impl ProductResponse {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.map(i64::from).unwrap_or_default(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            seller_id: product.seller_id.as_i64(),
            is_active: product.is_active,
            status: product.status.as_str().to_string(),
        }
    }
}

// -- Handlers --

/// POST /product — list a new product (sellers only).
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let user = auth::authenticate(&state.sessions, &state.store, &headers).await?;
    auth::require_seller(&user)?;

    let product = state
        .product_service
        .create_product(req.name, req.description, req.price, user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from_product(&product))))
}

/// GET /product — available listings, or a seller's catalog with
/// `?seller_id=`.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = match query.seller_id {
        Some(seller_id) => {
            state
                .product_service
                .list_by_seller(UserId::new(seller_id))
                .await?
        }
        None => state.product_service.list_available().await?,
    };
    Ok(Json(products.iter().map(ProductResponse::from_product).collect()))
}

/// GET /product/{id} — fetch a single product.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.product_service.get_product(ProductId::new(id)).await?;
    Ok(Json(ProductResponse::from_product(&product)))
}

/// PATCH /product/{id} — edit a listing (owner only).
#[tracing::instrument(skip(state, headers, update))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<ProductResponse>, ApiError> {
    let user = auth::authenticate(&state.sessions, &state.store, &headers).await?;
    auth::require_seller(&user)?;

    let product = state
        .product_service
        .update_product(ProductId::new(id), user.id, update)
        .await?;
    Ok(Json(ProductResponse::from_product(&product)))
}

/// DELETE /product/{id} — remove a listing (owner only, never while
/// reserved or sold).
#[tracing::instrument(skip(state, headers))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let user = auth::authenticate(&state.sessions, &state.store, &headers).await?;
    auth::require_seller(&user)?;

    state
        .product_service
        .delete_product(ProductId::new(id), user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
