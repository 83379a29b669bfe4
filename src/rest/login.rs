//! `POST /login` — password verification and bearer-token issuance.

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiError};
use crate::{
    auth::{issue_token, verify_password},
    db::get_user_by_name,
};

const TOKEN_TTL_HOURS: i64 = 24;

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
    device_id: String,
}

/// Response body for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    user_id: i32,
    username: String,
    subscription_tier: String,
}

/// Verify credentials and issue a 24-hour bearer token.
///
/// # Errors
/// Returns [`ApiError::Unauthorized`] if the username is unknown or the
/// password does not match, and [`ApiError::Internal`] on a storage failure.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;

    let user = get_user_by_name(&mut conn, &request.username)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&user.password, &request.password) {
        return Err(ApiError::Unauthorized);
    }

    let tier = match user.tier_expires_at {
        Some(expiry) if expiry <= Utc::now().naive_utc() => "expired".to_owned(),
        _ => user.subscription_tier.clone(),
    };

    let expires_at = Utc::now() + Duration::hours(TOKEN_TTL_HOURS);
    let token = issue_token(
        &state.auth_secret,
        user.id,
        &user.username,
        &request.device_id,
        &tier,
        expires_at,
    )
    .map_err(ApiError::from)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
        username: user.username,
        subscription_tier: tier,
    }))
}
