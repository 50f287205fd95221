//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, RepoError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid session token.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "detail": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, err.to_string()),
        DomainError::Order(order_err) if order_err.is_permission_error() => {
            (StatusCode::FORBIDDEN, err.to_string())
        }
        DomainError::Order(_) | DomainError::Product(_) | DomainError::Payment(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        DomainError::Repo(RepoError::NotFound { .. }) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        DomainError::Repo(RepoError::Conflict { .. }) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        DomainError::Repo(RepoError::Backend(_)) => {
            tracing::error!(error = %err, "storage backend error");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        ApiError::Domain(DomainError::Repo(err))
    }
}
