//! `/products` resource: full CRUD, scoped to the authenticated user.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::{
    AppState, AuthUser,
    error::ApiError,
    money::{cents_to_decimal, decimal_to_cents},
};
use crate::{
    db::{
        DbConnection, create_product, deactivate_product, get_category, get_product, list_products,
        update_product,
    },
    models::{NewProduct, Product},
};

const DEFAULT_CATEGORY_ID: i32 = 1;

/// A product as rendered to the client, price expressed as a decimal string.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    id: i32,
    category_id: i32,
    name: String,
    price: String,
    active: bool,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            category_id: product.category_id,
            name: product.name,
            price: cents_to_decimal(product.price_cents),
            active: product.active,
        }
    }
}

/// Request body shared by `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    name: String,
    price: String,
    category_id: Option<i32>,
}

/// Validate the fields shared by create and update: a non-empty `name`, a
/// non-negative `price`, and — unless `category_id` is the shared default —
/// a `category_id` owned by `owner`.
///
/// # Errors
/// Returns [`ApiError::BadRequest`] if `name` is empty or `price_cents` is
/// negative, or [`ApiError::NotFound`] if `category_id` does not belong to
/// `owner`.
async fn validate_product_fields(
    conn: &mut DbConnection,
    owner: i32,
    name: &str,
    price_cents: i64,
    category_id: i32,
) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("product name must not be empty".to_owned()));
    }
    if price_cents < 0 {
        return Err(ApiError::BadRequest("product price must not be negative".to_owned()));
    }
    if category_id != DEFAULT_CATEGORY_ID {
        get_category(conn, category_id, owner)
            .await
            .map_err(|err| ApiError::Internal(err.into()))?
            .ok_or_else(|| ApiError::BadRequest(format!("category {category_id} does not belong to the caller")))?;
    }
    Ok(())
}

/// `GET /products` — list active products owned by the caller.
///
/// # Errors
/// Returns [`ApiError::Internal`] on a storage failure.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let products = list_products(&mut conn, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// `GET /products/{id}` — fetch one product.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if absent or owned by another user.
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let product = get_product(&mut conn, id, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(product.into()))
}

/// `POST /products` — create a product owned by the caller.
///
/// Falls back to category `1` ("Uncategorized") when `category_id` is omitted.
///
/// # Errors
/// Returns [`ApiError::BadRequest`] if `price` is not a valid amount, `name`
/// is empty, `price` is negative, or `category_id` does not belong to the
/// caller, or [`ApiError::Internal`] on a storage failure.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    let price_cents = decimal_to_cents(&request.price).map_err(ApiError::BadRequest)?;
    let category_id = request.category_id.unwrap_or(DEFAULT_CATEGORY_ID);

    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    validate_product_fields(&mut conn, claims.user_id, &request.name, price_cents, category_id).await?;
    let new_product = NewProduct {
        user_id: claims.user_id,
        category_id,
        name: &request.name,
        price_cents,
        active: true,
    };
    let id = create_product(&mut conn, &new_product)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;

    Ok(Json(ProductResponse {
        id,
        category_id,
        name: request.name,
        price: cents_to_decimal(price_cents),
        active: true,
    }))
}

/// `PUT /products/{id}` — update a product owned by the caller.
///
/// # Errors
/// Returns [`ApiError::BadRequest`] if `price` is not a valid amount, `name`
/// is empty, `price` is negative, or `category_id` does not belong to the
/// caller, or [`ApiError::NotFound`] if absent or owned by another user.
pub async fn update(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<ProductRequest>,
) -> Result<(), ApiError> {
    let price_cents = decimal_to_cents(&request.price).map_err(ApiError::BadRequest)?;
    let category_id = request.category_id.unwrap_or(DEFAULT_CATEGORY_ID);

    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    validate_product_fields(&mut conn, claims.user_id, &request.name, price_cents, category_id).await?;
    let affected = update_product(&mut conn, id, claims.user_id, &request.name, price_cents, category_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

/// `DELETE /products/{id}` — soft-delete a product owned by the caller.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if absent or owned by another user.
pub async fn deactivate(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<(), ApiError> {
    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let affected = deactivate_product(&mut conn, id, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?;
    if affected == 0 {
        return Err(ApiError::NotFound);
    }
    Ok(())
}
