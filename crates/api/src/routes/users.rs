//! User registration, login and logout endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use domain::repos::{NewUser, RepoError, Store};
use domain::user::{User, UserRole};

use crate::auth::{self, bearer_token};
use crate::error::ApiError;

use super::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub role: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl UserResponse {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id.as_i64(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: UserResponse,
}

// -- Handlers --

/// POST /user — register a new account.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let role = UserRole::parse(&req.role)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid role: {}", req.role)))?;
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty".to_string()));
    }

    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state
        .store
        .create_user(NewUser {
            email: req.email,
            name: req.name,
            role,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepoError::Conflict { .. } => {
                ApiError::BadRequest("Email already registered".to_string())
            }
            other => other.into(),
        })?;

    metrics::counter!("users_registered_total").increment(1);
    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// POST /user/login — exchange credentials for a session token.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let (user, hash) = state
        .store
        .get_user_credentials(&req.email)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(invalid)?;

    let valid = bcrypt::verify(&req.password, &hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        return Err(invalid());
    }

    let token = state.sessions.issue(user.id).await;
    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer",
        user: UserResponse::from_user(&user),
    }))
}

/// POST /user/logout — invalidate the current session token.
#[tracing::instrument(skip(state, headers))]
pub async fn logout<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    // Resolving the user also rejects stale tokens with 401.
    auth::authenticate(&state.sessions, &state.store, &headers).await?;
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token).await;
    }
    Ok(StatusCode::NO_CONTENT)
}
