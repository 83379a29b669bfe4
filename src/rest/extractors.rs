//! Bearer-token extraction for REST handlers.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{AppState, error::ApiError};
use crate::auth::{Claims, verify_token};

/// The authenticated identity bound to a REST request.
///
/// Extracting this type runs token verification; handlers that need an
/// authenticated caller take it as an argument and axum rejects the request
/// with `401` before the handler body runs if verification fails.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;
        let claims = verify_token(token, &app_state.auth_secret)?;
        Ok(Self(claims))
    }
}
