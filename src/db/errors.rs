//! Error taxonomy for the storage layer.

use diesel_async::pooled_connection::PoolError;
use thiserror::Error;

/// Failures surfaced by storage-layer queries and the checkout transaction.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested row does not exist, or exists but is owned by another user.
    #[error("not found")]
    NotFound,
    /// A checkout was submitted with a `header.code` that already exists.
    #[error("duplicate transaction code")]
    DuplicateCode,
    /// A query attempted to operate on an owner-scoped table without a user id.
    #[error("query missing required owner scope")]
    MissingOwnerScope,
    /// The underlying database reported a query failure.
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    /// The connection pool failed to hand out a connection.
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
}
