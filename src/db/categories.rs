//! Category helpers, scoped to an owning user.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::connection::DbConnection;
use crate::models::{Category, NewCategory};

/// List active categories owned by `user_id`.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn list_categories(conn: &mut DbConnection, owner: i32) -> QueryResult<Vec<Category>> {
    use crate::schema::categories::dsl::{active, categories, user_id};
    categories
        .filter(user_id.eq(owner))
        .filter(active.eq(true))
        .load(conn)
        .await
}

/// Fetch one category, returning `None` if it does not exist or belongs to a
/// different owner — the two cases are indistinguishable to the caller.
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn get_category(
    conn: &mut DbConnection,
    category_id: i32,
    owner: i32,
) -> QueryResult<Option<Category>> {
    use crate::schema::categories::dsl::{categories, id, user_id};
    categories
        .filter(id.eq(category_id))
        .filter(user_id.eq(owner))
        .first(conn)
        .await
        .optional()
}

/// Insert a new category, returning its assigned id.
///
/// # Errors
/// Returns any error produced by the database.
#[must_use = "handle the result"]
pub async fn create_category(conn: &mut DbConnection, cat: &NewCategory<'_>) -> QueryResult<i32> {
    use crate::schema::categories::dsl::{categories, id};
    diesel::insert_into(categories)
        .values(cat)
        .returning(id)
        .get_result(conn)
        .await
}

/// Rename a category, only if owned by `owner`.
///
/// Returns the number of affected rows (0 if not found or not owned).
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn rename_category(
    conn: &mut DbConnection,
    category_id: i32,
    owner: i32,
    new_name: &str,
) -> QueryResult<usize> {
    use crate::schema::categories::dsl::{categories, id, name, user_id};
    diesel::update(categories.filter(id.eq(category_id)).filter(user_id.eq(owner)))
        .set(name.eq(new_name))
        .execute(conn)
        .await
}

/// Soft-delete a category, only if owned by `owner`.
///
/// Returns the number of affected rows (0 if not found or not owned).
///
/// # Errors
/// Returns any error produced by the underlying database query.
#[must_use = "handle the result"]
pub async fn deactivate_category(
    conn: &mut DbConnection,
    category_id: i32,
    owner: i32,
) -> QueryResult<usize> {
    use crate::schema::categories::dsl::{active, categories, id, user_id};
    diesel::update(categories.filter(id.eq(category_id)).filter(user_id.eq(owner)))
        .set(active.eq(false))
        .execute(conn)
        .await
}
