//! Diesel ORM models for persisted data.
//!
//! These structs correspond to tables defined in [`crate::schema`]. Status
//! and payment-method columns are stored as plain text; validation of the
//! allowed values happens at the REST boundary (see [`crate::rest`]).

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{
    cash_movements, categories, products, scan_audits, stock_sales, transaction_headers,
    transaction_items, users,
};

/// A user account.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = users)]
pub struct User {
    /// Unique user identifier.
    pub id: i32,
    /// Username used for login.
    pub username: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password: String,
    /// Subscription tier string (e.g. `"free"`, `"pro"`).
    pub subscription_tier: String,
    /// Optional tier expiry. A past expiry is reported as `"expired"` at read time.
    pub tier_expires_at: Option<NaiveDateTime>,
}

/// Parameters for creating a new user account.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    /// Username used for login.
    pub username: &'a str,
    /// Argon2 password hash.
    pub password: &'a str,
    /// Subscription tier granted on creation.
    pub subscription_tier: &'a str,
}

/// A product category, scoped to an owning user.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = categories)]
pub struct Category {
    /// Unique category identifier. `1` is the well-known "Uncategorized" row.
    pub id: i32,
    /// Owning user id.
    pub user_id: i32,
    /// Category name.
    pub name: String,
    /// Soft-delete flag.
    pub active: bool,
}

/// Parameters for creating a new category.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = categories)]
pub struct NewCategory<'a> {
    /// Owning user id.
    pub user_id: i32,
    /// Category name.
    pub name: &'a str,
    /// Soft-delete flag, `true` on creation.
    pub active: bool,
}

/// A sellable product, scoped to an owning user.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = products)]
pub struct Product {
    /// Unique product identifier.
    pub id: i32,
    /// Owning user id.
    pub user_id: i32,
    /// Category id; defaults to `1` ("Uncategorized") when unspecified.
    pub category_id: i32,
    /// Product name, non-empty.
    pub name: String,
    /// Unit price in integer cents.
    pub price_cents: i64,
    /// Soft-delete flag.
    pub active: bool,
}

/// Parameters for creating a new product.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = products)]
pub struct NewProduct<'a> {
    /// Owning user id.
    pub user_id: i32,
    /// Category id.
    pub category_id: i32,
    /// Product name.
    pub name: &'a str,
    /// Unit price in integer cents.
    pub price_cents: i64,
    /// Soft-delete flag, `true` on creation.
    pub active: bool,
}

/// A checkout header row.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = transaction_headers)]
pub struct TransactionHeader {
    /// Unique header identifier.
    pub id: i32,
    /// Owning user id.
    pub user_id: i32,
    /// Unique human-readable transaction code, e.g. `TRX-20260115-007`.
    pub code: String,
    /// Checkout timestamp.
    pub created_at: NaiveDateTime,
    /// One of `PENDING`, `PAID`, `CANCELLED`, `COMPLETED`.
    pub status: String,
    /// Sum of item subtotals, in cents.
    pub subtotal_cents: i64,
    /// Total discount applied, in cents.
    pub discount_total_cents: i64,
    /// Total tax applied, in cents.
    pub tax_total_cents: i64,
    /// `subtotal - discount_total + tax_total`, in cents.
    pub total_cents: i64,
    /// Amount tendered by the customer, in cents.
    pub paid_amount_cents: i64,
    /// `max(0, paid_amount - total)`, in cents.
    pub change_amount_cents: i64,
    /// One of `CASH`, `QRIS`, `CARD`, `DEBIT`.
    pub payment_method: String,
}

/// Parameters for inserting a new checkout header.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = transaction_headers)]
pub struct NewTransactionHeader<'a> {
    /// Owning user id.
    pub user_id: i32,
    /// Unique human-readable transaction code.
    pub code: &'a str,
    /// Checkout timestamp.
    pub created_at: NaiveDateTime,
    /// Initial status, always `PAID` for the synchronous checkout path.
    pub status: &'a str,
    /// Sum of item subtotals, in cents.
    pub subtotal_cents: i64,
    /// Total discount applied, in cents.
    pub discount_total_cents: i64,
    /// Total tax applied, in cents.
    pub tax_total_cents: i64,
    /// `subtotal - discount_total + tax_total`, in cents.
    pub total_cents: i64,
    /// Amount tendered by the customer, in cents.
    pub paid_amount_cents: i64,
    /// `max(0, paid_amount - total)`, in cents.
    pub change_amount_cents: i64,
    /// Payment method used.
    pub payment_method: &'a str,
}

/// A checkout line item, snapshotting the product name and price at sale time.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = transaction_items)]
pub struct TransactionItem {
    /// Unique item identifier.
    pub id: i32,
    /// Owning header id.
    pub header_id: i32,
    /// Product id, if this item referenced a catalog product.
    pub product_id: Option<i32>,
    /// Snapshotted product name.
    pub item_name: String,
    /// Snapshotted unit price, in cents.
    pub unit_price_cents: i64,
    /// Positive quantity sold.
    pub quantity: i32,
    /// `unit_price * quantity`, in cents.
    pub subtotal_cents: i64,
    /// Line total after any per-item adjustments, in cents.
    pub line_total_cents: i64,
}

/// Parameters for inserting a new checkout line item.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = transaction_items)]
pub struct NewTransactionItem<'a> {
    /// Owning header id.
    pub header_id: i32,
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

/// A cash-drawer movement tied to a checkout.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = cash_movements)]
pub struct CashMovement {
    /// Unique identifier.
    pub id: i32,
    /// Owning header id.
    pub header_id: i32,
    /// Movement amount, in cents.
    pub amount_cents: i64,
    /// `"sale"` for the original movement, `"reversal"` for a cancellation's
    /// compensating entry.
    pub kind: String,
}

/// Parameters for inserting a new cash movement.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = cash_movements)]
pub struct NewCashMovement<'a> {
    /// Owning header id.
    pub header_id: i32,
    /// Movement amount, in cents.
    pub amount_cents: i64,
    /// `"sale"` or `"reversal"`.
    pub kind: &'a str,
}

/// A stock-ledger entry tied to one checkout line item.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = stock_sales)]
pub struct StockSale {
    /// Unique identifier.
    pub id: i32,
    /// Owning header id.
    pub header_id: i32,
    /// Product sold.
    pub product_id: i32,
    /// Quantity sold (positive) or reversed (negative).
    pub qty: i32,
    /// `"sale"` or `"reversal"`.
    pub kind: String,
}

/// Parameters for inserting a new stock sale.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = stock_sales)]
pub struct NewStockSale {
    /// Owning header id.
    pub header_id: i32,
    /// Product sold.
    pub product_id: i32,
    /// Quantity sold (positive) or reversed (negative).
    pub qty: i32,
    /// `"sale"` or `"reversal"`.
    pub kind: &'static str,
}

/// An append-only scan-audit row, one per processed frame.
#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = scan_audits)]
pub struct ScanAudit {
    /// Unique identifier.
    pub id: i32,
    /// Authenticated user id.
    pub user_id: i32,
    /// Originating device id.
    pub device_id: String,
    /// Client-chosen session id.
    pub session_id: String,
    /// Frame sequence number.
    pub frame_seq: i64,
    /// Number of detections returned.
    pub detection_count: i32,
    /// `"success"` or `"error"`.
    pub outcome: String,
    /// When the audit row was written.
    pub created_at: NaiveDateTime,
}

/// Parameters for inserting a new scan-audit row.
#[derive(Insertable, Deserialize)]
#[diesel(table_name = scan_audits)]
pub struct NewScanAudit<'a> {
    /// Authenticated user id.
    pub user_id: i32,
    /// Originating device id.
    pub device_id: &'a str,
    /// Client-chosen session id.
    pub session_id: &'a str,
    /// Frame sequence number.
    pub frame_seq: i64,
    /// Number of detections returned.
    pub detection_count: i32,
    /// `"success"` or `"error"`.
    pub outcome: &'a str,
    /// When the audit row was written.
    pub created_at: NaiveDateTime,
}
