//! Database fixtures used by integration tests.
//!
//! Centralises repeated setup flows (users, catalogs, checkouts) so tests can
//! compose databases with minimal boilerplate.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use frame_gateway::{
    auth::hash_password,
    db::{DbConnection, apply_migrations, create_category, create_product, create_user},
    models::{NewCategory, NewProduct, NewUser},
};
use futures_util::future::BoxFuture;

use crate::AnyError;

/// Database URL wrapper to make fixture APIs more explicit.
#[derive(Clone, Debug)]
pub struct DatabaseUrl(String);

impl DatabaseUrl {
    /// Create a new database URL wrapper from a string.
    pub fn new(url: impl Into<String>) -> Self { Self(url.into()) }

    /// Borrow the wrapped URL as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &str { self.0.as_str() }
}

impl From<&str> for DatabaseUrl {
    fn from(value: &str) -> Self { Self::new(value) }
}

/// Execute a database operation within a connection.
///
/// Establishes a connection, runs migrations, and executes the provided closure.
///
/// # Errors
///
/// Returns an error if the connection cannot be established, migrations fail,
/// or the closure returns an error.
#[expect(
    clippy::needless_pass_by_value,
    reason = "DatabaseUrl is an owned API boundary for fixtures"
)]
pub fn with_db<F>(db: DatabaseUrl, f: F) -> Result<(), AnyError>
where
    F: for<'c> FnOnce(&'c mut DbConnection) -> BoxFuture<'c, Result<(), AnyError>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut conn = DbConnection::establish(db.as_str()).await?;
        apply_migrations(&mut conn, db.as_str()).await?;
        f(&mut conn).await
    })
}

/// Insert a user with a known plaintext password, returning its assigned id.
///
/// # Errors
/// Returns an error if hashing or insertion fails.
pub async fn seed_user(conn: &mut DbConnection, username: &str, password: &str) -> Result<i32, AnyError> {
    use frame_gateway::schema::users::dsl;

    let argon2 = argon2::Argon2::default();
    let hashed = hash_password(&argon2, password)?;
    let new_user = NewUser {
        username,
        password: &hashed,
        subscription_tier: "free",
    };
    create_user(conn, &new_user).await?;
    let id = dsl::users
        .filter(dsl::username.eq(username))
        .select(dsl::id)
        .first(conn)
        .await?;
    Ok(id)
}

/// Fetch the `outcome` column of every `scan_audits` row for `session_id`,
/// ordered by insertion, for asserting on the pipeline's audit trail.
///
/// # Errors
/// Returns any error produced by the database.
pub async fn scan_audit_outcomes(conn: &mut DbConnection, session_id: &str) -> Result<Vec<String>, AnyError> {
    use frame_gateway::schema::scan_audits::dsl;

    let outcomes = dsl::scan_audits
        .filter(dsl::session_id.eq(session_id))
        .order(dsl::id.asc())
        .select(dsl::outcome)
        .load(conn)
        .await?;
    Ok(outcomes)
}

/// Insert a category owned by `owner`, returning its assigned id.
///
/// # Errors
/// Returns any error produced by the database.
pub async fn seed_category(conn: &mut DbConnection, owner: i32, name: &str) -> Result<i32, AnyError> {
    let id = create_category(conn, &NewCategory { user_id: owner, name, active: true }).await?;
    Ok(id)
}

/// Insert a product owned by `owner`, returning its assigned id.
///
/// # Errors
/// Returns any error produced by the database.
pub async fn seed_product(
    conn: &mut DbConnection,
    owner: i32,
    category_id: i32,
    name: &str,
    price_cents: i64,
) -> Result<i32, AnyError> {
    let id = create_product(
        conn,
        &NewProduct { user_id: owner, category_id, name, price_cents, active: true },
    )
    .await?;
    Ok(id)
}

/// Build a database seeded with a single user, the well-known "Uncategorized"
/// category, and two priced products, ready for checkout tests.
///
/// # Errors
/// Returns an error if database setup fails.
pub fn setup_catalog_db(db: DatabaseUrl) -> Result<(), AnyError> {
    with_db(db, |conn| {
        Box::pin(async move {
            let owner = seed_user(conn, "alice", "secret").await?;
            seed_product(conn, owner, 1, "Coffee", 3_500).await?;
            seed_product(conn, owner, 1, "Tea", 2_750).await?;
            Ok(())
        })
    })
}

/// Build a database seeded with a user, a product, and one completed checkout
/// covering it, ready for transaction-listing and cancellation tests.
///
/// # Errors
/// Returns an error if database setup fails.
pub fn setup_checkout_db(db: DatabaseUrl) -> Result<(), AnyError> {
    with_db(db, |conn| {
        Box::pin(async move {
            let owner = seed_user(conn, "alice", "secret").await?;
            let product_id = seed_product(conn, owner, 1, "Coffee", 3_500).await?;

            use frame_gateway::db::{CheckoutItem, checkout};
            use frame_gateway::models::NewTransactionHeader;

            let header = NewTransactionHeader {
                user_id: owner,
                code: "TRX-20260101-001",
                created_at: Utc::now().naive_utc(),
                status: "PAID",
                subtotal_cents: 3_500,
                discount_total_cents: 0,
                tax_total_cents: 0,
                total_cents: 3_500,
                paid_amount_cents: 4_000,
                change_amount_cents: 500,
                payment_method: "CASH",
            };
            let items = [CheckoutItem {
                product_id: Some(product_id),
                item_name: "Coffee",
                unit_price_cents: 3_500,
                quantity: 1,
                subtotal_cents: 3_500,
                line_total_cents: 3_500,
            }];
            checkout(conn, header, &items).await?;
            Ok(())
        })
    })
}
