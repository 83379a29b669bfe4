//! The ACID checkout path and transaction-header/item queries.
//!
//! [`checkout`] is the hot spot described in the data model: header, items,
//! one cash movement, and one stock-sale row per product-backed item are
//! written inside a single atomic unit. A duplicate `header.code` is
//! rejected without leaving partial rows behind.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use diesel::{
    dsl::count_star,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncConnection, RunQueryDsl, scoped_futures::ScopedFutureExt};

use super::{connection::DbConnection, errors::StorageError};
use crate::models::{
    NewCashMovement, NewStockSale, NewTransactionHeader, NewTransactionItem, TransactionHeader,
    TransactionItem,
};

/// One line item supplied to [`checkout`], prior to the header id being known.
pub struct CheckoutItem<'a> {
    /// Product id, if this item referenced a catalog product.
    pub product_id: Option<i32>,
    /// Snapshotted product name.
    pub item_name: &'a str,
    /// Snapshotted unit price, in cents.
    pub unit_price_cents: i64,
    /// Positive quantity sold.
    pub quantity: i32,
    /// `unit_price * quantity`, in cents.
    pub subtotal_cents: i64,
    /// Line total after any per-item adjustments, in cents.
    pub line_total_cents: i64,
}

fn is_unique_violation(err: &DieselError) -> bool {
    matches!(err, DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
}

/// Generate the next `TRX-YYYYMMDD-NNN` code for `owner` on `today`.
///
/// `NNN` is a per-day, per-owner monotonic counter derived from the count of
/// headers already created for that day. Callers that need this to be race
/// free against concurrent checkouts must hold the single write-pool
/// connection across this call and the subsequent [`checkout`] call.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn next_transaction_code(
    conn: &mut DbConnection,
    owner: i32,
    today: NaiveDate,
) -> QueryResult<String> {
    use crate::schema::transaction_headers::dsl::{created_at, transaction_headers, user_id};

    let day_start = NaiveDateTime::new(today, NaiveTime::MIN);
    let day_end = NaiveDateTime::new(today + Duration::days(1), NaiveTime::MIN);

    let count: i64 = transaction_headers
        .filter(user_id.eq(owner))
        .filter(created_at.ge(day_start))
        .filter(created_at.lt(day_end))
        .select(count_star())
        .get_result(conn)
        .await?;

    let sequence = count.checked_add(1).unwrap_or(count);
    Ok(format!("TRX-{}-{sequence:03}", today.format("%Y%m%d")))
}

/// Commit a checkout: header, items, one cash movement, and one stock sale
/// per product-backed item, in a single atomic unit.
///
/// Returns the new header's id. A duplicate `header.code` rolls back the
/// whole unit and returns [`StorageError::DuplicateCode`] rather than a raw
/// database error.
///
/// # Errors
/// Returns [`StorageError::DuplicateCode`] on a unique-constraint violation
/// on `header.code`, or [`StorageError::Database`] for any other failure.
pub async fn checkout(
    conn: &mut DbConnection,
    header: NewTransactionHeader<'_>,
    items: &[CheckoutItem<'_>],
) -> Result<i32, StorageError> {
    let header_id = conn
        .transaction(|conn| {
            async move {
                use crate::schema::{cash_movements, stock_sales, transaction_headers, transaction_items};

                let header_id: i32 = diesel::insert_into(transaction_headers::table)
                    .values(&header)
                    .returning(transaction_headers::id)
                    .get_result(conn)
                    .await?;

                for item in items {
                    let new_item = NewTransactionItem {
                        header_id,
                        product_id: item.product_id,
                        item_name: item.item_name,
                        unit_price_cents: item.unit_price_cents,
                        quantity: item.quantity,
                        subtotal_cents: item.subtotal_cents,
                        line_total_cents: item.line_total_cents,
                    };
                    diesel::insert_into(transaction_items::table)
                        .values(&new_item)
                        .execute(conn)
                        .await?;

                    if let Some(product_id) = item.product_id {
                        let stock_sale = NewStockSale {
                            header_id,
                            product_id,
                            qty: item.quantity,
                            kind: "sale",
                        };
                        diesel::insert_into(stock_sales::table)
                            .values(&stock_sale)
                            .execute(conn)
                            .await?;
                    }
                }

                let movement = NewCashMovement {
                    header_id,
                    amount_cents: header.paid_amount_cents,
                    kind: "sale",
                };
                diesel::insert_into(cash_movements::table)
                    .values(&movement)
                    .execute(conn)
                    .await?;

                Ok(header_id)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                StorageError::DuplicateCode
            } else {
                StorageError::Database(err)
            }
        })?;

    Ok(header_id)
}

/// List headers owned by `owner`, optionally bounded by `[start, end]`.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_headers(
    conn: &mut DbConnection,
    owner: i32,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
) -> QueryResult<Vec<TransactionHeader>> {
    use crate::schema::transaction_headers::dsl::{created_at, transaction_headers, user_id};

    let mut query = transaction_headers.filter(user_id.eq(owner)).into_boxed();
    if let Some(start) = start {
        query = query.filter(created_at.ge(start));
    }
    if let Some(end) = end {
        query = query.filter(created_at.le(end));
    }
    query.load(conn).await
}

/// Fetch one header, returning `None` if absent or owned by another user.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn get_header(
    conn: &mut DbConnection,
    header_id: i32,
    owner: i32,
) -> QueryResult<Option<TransactionHeader>> {
    use crate::schema::transaction_headers::dsl::{id, transaction_headers, user_id};
    transaction_headers
        .filter(id.eq(header_id))
        .filter(user_id.eq(owner))
        .first(conn)
        .await
        .optional()
}

/// List the items belonging to a header already confirmed to be owned by the caller.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_items(conn: &mut DbConnection, owning_header_id: i32) -> QueryResult<Vec<TransactionItem>> {
    use crate::schema::transaction_items::dsl::{header_id, transaction_items};
    transaction_items.filter(header_id.eq(owning_header_id)).load(conn).await
}

/// Cancel a `PAID`/`COMPLETED` header, writing compensating cash-movement and
/// stock-sale rows rather than mutating the originals.
///
/// Returns `true` if the header was found, owned by `owner`, and in a
/// cancellable state.
///
/// # Errors
/// Returns any error produced by the database.
pub async fn cancel(conn: &mut DbConnection, header_id: i32, owner: i32) -> Result<bool, StorageError> {
    let cancelled = conn
        .transaction(|conn| {
            async move {
                use crate::schema::{cash_movements, stock_sales, transaction_headers, transaction_items};

                let header: Option<TransactionHeader> = transaction_headers::table
                    .filter(transaction_headers::id.eq(header_id))
                    .filter(transaction_headers::user_id.eq(owner))
                    .first(conn)
                    .await
                    .optional()?;

                let Some(header) = header else {
                    return Ok(false);
                };
                if header.status != "PAID" && header.status != "COMPLETED" {
                    return Ok(false);
                }

                diesel::update(
                    transaction_headers::table.filter(transaction_headers::id.eq(header_id)),
                )
                .set(transaction_headers::status.eq("CANCELLED"))
                .execute(conn)
                .await?;

                let reversal = NewCashMovement {
                    header_id,
                    amount_cents: -header.paid_amount_cents,
                    kind: "reversal",
                };
                diesel::insert_into(cash_movements::table)
                    .values(&reversal)
                    .execute(conn)
                    .await?;

                let items: Vec<TransactionItem> = transaction_items::table
                    .filter(transaction_items::header_id.eq(header_id))
                    .load(conn)
                    .await?;
                for item in items {
                    if let Some(product_id) = item.product_id {
                        let reversal = NewStockSale {
                            header_id,
                            product_id,
                            qty: -item.quantity,
                            kind: "reversal",
                        };
                        diesel::insert_into(stock_sales::table)
                            .values(&reversal)
                            .execute(conn)
                            .await?;
                    }
                }

                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(StorageError::Database)?;

    Ok(cancelled)
}
