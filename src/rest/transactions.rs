//! `/transactions` resource: checkout, listing, item lookup, and cancellation.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AppState, AuthUser,
    error::ApiError,
    money::{cents_to_decimal, decimal_to_cents},
};
use crate::{
    db::{CheckoutItem, cancel, checkout, get_header, get_product, list_headers, list_items, next_transaction_code},
    models::{NewTransactionHeader, TransactionHeader, TransactionItem},
};

const DEFAULT_STATUS: &str = "PAID";

/// Request body for one checkout line item.
#[derive(Debug, Deserialize)]
pub struct ItemRequest {
    product_id: Option<i32>,
    item_name: String,
    unit_price: String,
    quantity: i32,
}

/// Request body for the checkout header.
#[derive(Debug, Deserialize)]
pub struct HeaderRequest {
    code: Option<String>,
    subtotal: String,
    discount_total: String,
    tax_total: String,
    total: String,
    paid_amount: String,
    payment_method: String,
}

/// Request body for `POST /transactions`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    header: HeaderRequest,
    items: Vec<ItemRequest>,
}

/// A checkout header as rendered to the client, amounts as decimal strings.
#[derive(Debug, Serialize)]
pub struct HeaderResponse {
    id: i32,
    code: String,
    created_at: NaiveDateTime,
    status: String,
    subtotal: String,
    discount_total: String,
    tax_total: String,
    total: String,
    paid_amount: String,
    change_amount: String,
    payment_method: String,
}

impl From<TransactionHeader> for HeaderResponse {
    fn from(header: TransactionHeader) -> Self {
        Self {
            id: header.id,
            code: header.code,
            created_at: header.created_at,
            status: header.status,
            subtotal: cents_to_decimal(header.subtotal_cents),
            discount_total: cents_to_decimal(header.discount_total_cents),
            tax_total: cents_to_decimal(header.tax_total_cents),
            total: cents_to_decimal(header.total_cents),
            paid_amount: cents_to_decimal(header.paid_amount_cents),
            change_amount: cents_to_decimal(header.change_amount_cents),
            payment_method: header.payment_method,
        }
    }
}

/// A checkout line item as rendered to the client.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    id: i32,
    product_id: Option<i32>,
    item_name: String,
    unit_price: String,
    quantity: i32,
    subtotal: String,
    line_total: String,
}

impl From<TransactionItem> for ItemResponse {
    fn from(item: TransactionItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            item_name: item.item_name,
            unit_price: cents_to_decimal(item.unit_price_cents),
            quantity: item.quantity,
            subtotal: cents_to_decimal(item.subtotal_cents),
            line_total: cents_to_decimal(item.line_total_cents),
        }
    }
}

/// Query parameters accepted by `GET /transactions`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

/// `GET /transactions` — list headers owned by the caller, optionally bounded
/// by `start`/`end` ISO-8601 instants.
///
/// # Errors
/// Returns [`ApiError::Internal`] on a storage failure.
pub async fn list(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<HeaderResponse>>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let headers = list_headers(
        &mut conn,
        claims.user_id,
        query.start.map(|instant| instant.naive_utc()),
        query.end.map(|instant| instant.naive_utc()),
    )
    .await
    .map_err(|err| ApiError::Internal(err.into()))?;
    Ok(Json(headers.into_iter().map(HeaderResponse::from).collect()))
}

/// `GET /transactions/{id}` — fetch one header.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if absent or owned by another user.
pub async fn get_one(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<HeaderResponse>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let header = get_header(&mut conn, id, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(header.into()))
}

/// `GET /transactions/{id}/items` — list the items belonging to a header
/// already confirmed to be owned by the caller.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the header is absent or owned by
/// another user.
pub async fn items(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let mut conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    get_header(&mut conn, id, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
        .ok_or(ApiError::NotFound)?;
    let items = list_items(&mut conn, id).await.map_err(|err| ApiError::Internal(err.into()))?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

fn parse_amount(field: &str, value: &str) -> Result<i64, ApiError> {
    decimal_to_cents(value).map_err(|_reason| ApiError::BadRequest(format!("invalid amount for {field}")))
}

/// `POST /transactions` — atomically commit a checkout: header, items, one
/// cash movement, and one stock sale per product-backed item.
///
/// Generates `header.code` server-side in the shape `TRX-YYYYMMDD-NNN` when
/// omitted. A duplicate `header.code` is rejected without leaving partial
/// rows behind.
///
/// # Errors
/// Returns [`ApiError::BadRequest`] if any amount field is not a valid
/// decimal string, any item quantity is not positive, the item subtotals do
/// not sum to `header.subtotal`, or `header.total` does not equal
/// `subtotal − discount_total + tax_total`; or [`ApiError::DuplicateCode`] if
/// `header.code` already exists.
pub async fn checkout_handler(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<HeaderResponse>, ApiError> {
    let subtotal_cents = parse_amount("subtotal", &request.header.subtotal)?;
    let discount_total_cents = parse_amount("discount_total", &request.header.discount_total)?;
    let tax_total_cents = parse_amount("tax_total", &request.header.tax_total)?;
    let total_cents = parse_amount("total", &request.header.total)?;
    let paid_amount_cents = parse_amount("paid_amount", &request.header.paid_amount)?;
    let change_amount_cents = (paid_amount_cents - total_cents).max(0);

    let mut items = Vec::with_capacity(request.items.len());
    let mut items_subtotal_cents: i64 = 0;
    for item in &request.items {
        if item.quantity <= 0 {
            return Err(ApiError::BadRequest("item quantity must be positive".to_owned()));
        }
        let unit_price_cents = parse_amount("unit_price", &item.unit_price)?;
        let subtotal_cents = unit_price_cents
            .checked_mul(i64::from(item.quantity))
            .ok_or_else(|| ApiError::BadRequest("item subtotal overflow".to_owned()))?;
        items_subtotal_cents = items_subtotal_cents
            .checked_add(subtotal_cents)
            .ok_or_else(|| ApiError::BadRequest("checkout subtotal overflow".to_owned()))?;
        items.push(CheckoutItem {
            product_id: item.product_id,
            item_name: &item.item_name,
            unit_price_cents,
            quantity: item.quantity,
            subtotal_cents,
            line_total_cents: subtotal_cents,
        });
    }

    if items_subtotal_cents != subtotal_cents {
        return Err(ApiError::BadRequest(
            "sum of item subtotals does not match header.subtotal".to_owned(),
        ));
    }
    let expected_total_cents = subtotal_cents
        .checked_sub(discount_total_cents)
        .and_then(|net| net.checked_add(tax_total_cents))
        .ok_or_else(|| ApiError::BadRequest("checkout total overflow".to_owned()))?;
    // Allow a one-cent rounding tolerance between the stated total and
    // subtotal - discount + tax.
    const TOTAL_TOLERANCE_CENTS: i64 = 1;
    if (expected_total_cents - total_cents).abs() > TOTAL_TOLERANCE_CENTS {
        return Err(ApiError::BadRequest(
            "header.total does not equal subtotal minus discount plus tax".to_owned(),
        ));
    }

    {
        let mut read_conn = state.pools.read.get().await.map_err(|err| ApiError::Internal(err.into()))?;
        for item in &items {
            if let Some(product_id) = item.product_id {
                get_product(&mut read_conn, product_id, claims.user_id)
                    .await
                    .map_err(|err| ApiError::Internal(err.into()))?
                    .ok_or_else(|| {
                        ApiError::BadRequest(format!("product {product_id} does not belong to the caller"))
                    })?;
            }
        }
    }

    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;

    let now = Utc::now();
    let code = match &request.header.code {
        Some(code) => code.clone(),
        None => next_transaction_code(&mut conn, claims.user_id, now.date_naive())
            .await
            .map_err(|err| ApiError::Internal(err.into()))?,
    };

    let new_header = NewTransactionHeader {
        user_id: claims.user_id,
        code: &code,
        created_at: now.naive_utc(),
        status: DEFAULT_STATUS,
        subtotal_cents,
        discount_total_cents,
        tax_total_cents,
        total_cents,
        paid_amount_cents,
        change_amount_cents,
        payment_method: &request.header.payment_method,
    };

    let header_id = checkout(&mut conn, new_header, &items).await?;
    let header = get_header(&mut conn, header_id, claims.user_id)
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(header.into()))
}

/// `POST /transactions/{id}/cancel` — transition `PAID`/`COMPLETED` to
/// `CANCELLED`, appending compensating cash-movement and stock-sale rows.
///
/// # Errors
/// Returns [`ApiError::NotFound`] if the header is absent, owned by another
/// user, or not in a cancellable state.
pub async fn cancel_handler(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<i32>,
) -> Result<(), ApiError> {
    let mut conn = state.pools.write.get().await.map_err(|err| ApiError::Internal(err.into()))?;
    let cancelled = cancel(&mut conn, id, claims.user_id).await?;
    if !cancelled {
        return Err(ApiError::NotFound);
    }
    Ok(())
}
