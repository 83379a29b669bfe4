//! `/categories` resource: full CRUD, scoped to the authenticated user.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::{AppState, AuthUser, error::ApiError};
use crate::{
    db::{create_category, deactivate_category, get_category, list_categories, rename_category},
    models::NewCategory,
};

/// A category as rendered to the client.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    id: i32,
    name: String,
    active: bool,
}

impl From<crate::models::Category> for CategoryResponse {
    fn from(category: crate::models::Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            active: category.active,
        }
    }
}

/// Request body for `POST /categories`.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    name: String,
}

/// Request body for `PUT /categories/{id}`.
#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    name: String,
}

/// `GET /categories` — list active categories owned by the caller.
///
/// # Errors
/// Returns [`ApiError::Internal`] on a storage failure.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let categories = list_categories(&mut conn, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

/// `GET /categories/{id}` — fetch one category.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if absent or owned by another user.
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let category = get_category(&mut conn, id, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(category.into()))
}

/// `POST /categories` — create a category owned by the caller.
///
/// # Errors
/// Returns [`ApiError::Internal`] on a storage failure.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let new_category = NewCategory {
        user_id: claims.user_id,
        name: &request.name,
        active: true,
    };
    let id = create_category(&mut conn, &new_category)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    Ok(Json(CategoryResponse {
        id,
        name: request.name,
        active: true,
    }))
}

/// `PUT /categories/{id}` — rename a category owned by the caller.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if absent or owned by another user.
pub async fn rename(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<RenameCategoryRequest>,
) -> Result<(), ApiError> {
    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let affected = rename_category(&mut conn, id, claims.user_id, &request.name)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

/// `DELETE /categories/{id}` — soft-delete a category owned by the caller.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if absent or owned by another user.
pub async fn deactivate(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<(), ApiError> {
    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let affected = deactivate_category(&mut conn, id, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}
