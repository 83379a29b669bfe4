//! The single place REST handlers translate internal errors to client-facing JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{auth::AuthError, db::StorageError};

/// Errors rendered to the client as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body or query parameters.
    #[error("{0}")]
    BadRequest(String),
    /// Missing or invalid bearer token.
    #[error("Unauthorized")]
    Unauthorized,
    /// The requested row does not exist, or is owned by another user.
    #[error("not found")]
    NotFound,
    /// The HTTP method is not supported on this route.
    #[error("method not allowed")]
    MethodNotAllowed,
    /// A checkout was submitted with a `header.code` that already exists.
    #[error("duplicate transaction code")]
    DuplicateCode,
    /// An unexpected storage or downstream failure.
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::DuplicateCode => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = self.to_string();
        (status, Json(ErrorBody { error: &message })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(_err: AuthError) -> Self { Self::Unauthorized }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound | StorageError::MissingOwnerScope => Self::NotFound,
            StorageError::DuplicateCode => Self::DuplicateCode,
            err @ (StorageError::Database(_) | StorageError::Pool(_)) => Self::Internal(err.into()),
        }
    }
}

/// Route fallback for a method not configured on a given path, rendering the
/// same `{"error": ...}` shape as every other rejection rather than axum's
/// default empty `405` body.
pub async fn method_not_allowed() -> ApiError { ApiError::MethodNotAllowed }
