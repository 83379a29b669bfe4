//! Manage database connections and domain queries.
//!
//! This module tree exposes helpers for creating pooled Diesel connections,
//! running embedded migrations, and executing application queries grouped by
//! domain concern. Single-writer discipline (see [`connection::Pools`]) is
//! the caller's responsibility: mutating queries must be run against a
//! connection drawn from the write pool.

mod audit;
mod categories;
mod connection;
mod errors;
mod migrations;
mod products;
mod transactions;
mod users;

pub use audit::record_scan;
pub use categories::{create_category, deactivate_category, get_category, list_categories, rename_category};
pub use connection::{Backend, DbConnection, DbPool, MIGRATIONS, Pools, ReadPool, WritePool};
pub use errors::StorageError;
pub use migrations::apply_migrations;
pub use products::{create_product, deactivate_product, get_product, list_products, update_product};
pub use transactions::{
    CheckoutItem, cancel, checkout, get_header, list_headers, list_items, next_transaction_code,
};
pub use users::{create_user, get_user_by_id, get_user_by_name};
