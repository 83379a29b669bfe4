//! Product helpers, scoped to an owning user.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{NewProduct, Product};

/// List active products owned by `user_id`.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_products(conn: &mut DbConnection, owner: i32) -> QueryResult<Vec<Product>> {
    use crate::schema::products::dsl::{active, products, user_id};
    products
        .filter(user_id.eq(owner))
        .filter(active.eq(true))
        .load(conn)
        .await
}

/// Fetch one product, returning `None` if it does not exist or belongs to a
/// different owner.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn get_product(
    conn: &mut DbConnection,
    product_id: i32,
    owner: i32,
) -> QueryResult<Option<Product>> {
    use crate::schema::products::dsl::{id, products, user_id};
    products
        .filter(id.eq(product_id))
        .filter(user_id.eq(owner))
        .first(conn)
        .await
        .optional()
}

/// Insert a new product, returning its assigned id.
///
/// # Errors
/// Returns any error produced by the database.
#[must_use = "handle the result"]
pub async fn create_product(conn: &mut DbConnection, product: &NewProduct<'_>) -> QueryResult<i32> {
    use crate::schema::products::dsl::{id, products};
    diesel::insert_into(products)
        .values(product)
        .returning(id)
        .get_result(conn)
        .await
}

/// Update a product's name and price, only if owned by `owner`.
///
/// Returns the number of affected rows (0 if not found or not owned).
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn update_product(
    conn: &mut DbConnection,
    product_id: i32,
    owner: i32,
    new_name: &str,
    new_price_cents: i64,
    new_category_id: i32,
) -> QueryResult<usize> {
    use crate::schema::products::dsl::{category_id, id, name, price_cents, products, user_id};
    diesel::update(products.filter(id.eq(product_id)).filter(user_id.eq(owner)))
        .set((
            name.eq(new_name),
            price_cents.eq(new_price_cents),
            category_id.eq(new_category_id),
        ))
        .execute(conn)
        .await
}

/// Soft-delete a product, only if owned by `owner`.
///
/// Returns the number of affected rows (0 if not found or not owned).
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn deactivate_product(
    conn: &mut DbConnection,
    product_id: i32,
    owner: i32,
) -> QueryResult<usize> {
    use crate::schema::products::dsl::{active, id, products, user_id};
    diesel::update(products.filter(id.eq(product_id)).filter(user_id.eq(owner)))
        .set(active.eq(false))
        .execute(conn)
        .await
}
