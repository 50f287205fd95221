//! Session-token authentication.
//!
//! Login exchanges credentials for an opaque bearer token held in an
//! in-process session map. Tokens are random, unguessable, and die with the
//! process; there is no refresh or expiry.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use rand::Rng;
use tokio::sync::RwLock;

use common::UserId;
use domain::repos::Store;
use domain::user::{User, UserRole};

use crate::error::ApiError;

const TOKEN_LEN: usize = 48;
const TOKEN_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Maps bearer tokens to user ids.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, UserId>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh token for a user.
    pub async fn issue(&self, user_id: UserId) -> String {
        let token = generate_token();
        self.sessions.write().await.insert(token.clone(), user_id);
        token
    }

    /// Invalidates a token. Unknown tokens are a no-op.
    pub async fn revoke(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    pub async fn resolve(&self, token: &str) -> Option<UserId> {
        self.sessions.read().await.get(token).copied()
    }
}

fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
        .collect()
}

/// Pulls the bearer token out of the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the calling user from the request headers.
pub async fn authenticate<S: Store>(
    sessions: &SessionStore,
    store: &S,
    headers: &HeaderMap,
) -> Result<User, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
    let user_id = sessions
        .resolve(token)
        .await
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
    store
        .get_user_by_id(user_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

/// Role guard for buyer-only endpoints.
pub fn require_buyer(user: &User) -> Result<(), ApiError> {
    if user.role != UserRole::Buyer {
        return Err(ApiError::Forbidden(
            "Only buyers can perform this action".to_string(),
        ));
    }
    Ok(())
}

/// Role guard for seller-only endpoints.
pub fn require_seller(user: &User) -> Result<(), ApiError> {
    if user.role != UserRole::Seller {
        return Err(ApiError::Forbidden(
            "Only sellers can perform this action".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_round_trip_until_revoked() {
        let sessions = SessionStore::new();
        let token = sessions.issue(UserId::new(7)).await;
        assert_eq!(sessions.resolve(&token).await, Some(UserId::new(7)));

        sessions.revoke(&token).await;
        assert_eq!(sessions.resolve(&token).await, None);
    }

    #[tokio::test]
    async fn tokens_are_unique() {
        let sessions = SessionStore::new();
        let a = sessions.issue(UserId::new(1)).await;
        let b = sessions.issue(UserId::new(1)).await;
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_LEN);
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc123".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Basic abc123".parse().unwrap(),
        );
        assert!(bearer_token(&headers).is_none());
    }
}
