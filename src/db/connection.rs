//! Connection and pool helpers for database access.
//!
//! Single-writer discipline is enforced by splitting the pool in two: a
//! [`DbPool`] capped at one connection for all mutating statements and the
//! checkout transaction, and a [`DbReadPool`] sized for concurrency for list
//! and get queries. Both point at the same embedded file; `SQLite` is opened
//! with `journal_mode=WAL` and `foreign_keys=ON` via a connection customizer
//! so readers observe a consistent snapshot while the writer proceeds.

use cfg_if::cfg_if;
use diesel_async::{
    AsyncConnection,
    pooled_connection::{AsyncDieselConnectionManager, ManagerConfig, PoolError, bb8::Pool},
};
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use futures_util::future::BoxFuture;

cfg_if! {
    if #[cfg(all(feature = "sqlite", feature = "postgres", not(feature = "lint")))] {
        compile_error!("Either feature 'sqlite' or 'postgres' must be enabled, not both");
    } else if #[cfg(feature = "sqlite")] {
        use diesel::sqlite::{Sqlite, SqliteConnection};
        use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;

        /// Database backend type for `SQLite`.
        pub type Backend = Sqlite;
        /// Embedded database migrations for `SQLite`.
        pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/sqlite");
        /// Connection type for `SQLite` database access.
        pub type DbConnection = SyncConnectionWrapper<SqliteConnection>;
    } else if #[cfg(all(feature = "postgres", not(feature = "sqlite")))] {
        use diesel::pg::Pg;
        use diesel_async::AsyncPgConnection;

        /// Database backend type for `PostgreSQL`.
        pub type Backend = Pg;
        /// Embedded database migrations for `PostgreSQL`.
        pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/postgres");
        /// Connection type for `PostgreSQL` database access.
        pub type DbConnection = AsyncPgConnection;
    } else {
        compile_error!("Either the 'sqlite' or 'postgres' feature must be enabled");
    }
}

/// Connection pool type, shared by both the write and read pools.
pub type DbPool = Pool<DbConnection>;

/// The single-connection pool through which all mutating statements serialize.
pub type WritePool = DbPool;
/// The concurrency-sized pool used for list and get queries.
pub type ReadPool = DbPool;

#[cfg(feature = "sqlite")]
fn sqlite_manager(database_url: &str) -> AsyncDieselConnectionManager<DbConnection> {
    let mut config: ManagerConfig<DbConnection> = ManagerConfig::default();
    config.custom_setup = Box::new(setup_sqlite_connection);
    AsyncDieselConnectionManager::<DbConnection>::new_with_config(database_url, config)
}

#[cfg(feature = "sqlite")]
fn setup_sqlite_connection(
    database_url: &str,
) -> BoxFuture<'_, diesel::ConnectionResult<DbConnection>> {
    Box::pin(async move {
        let mut conn = DbConnection::establish(database_url).await?;
        conn.batch_execute("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .await
            .map_err(|err| diesel::ConnectionError::CouldntSetupConfiguration(err))?;
        Ok(conn)
    })
}

#[cfg(all(feature = "postgres", not(feature = "sqlite")))]
fn manager_for(database_url: &str) -> AsyncDieselConnectionManager<DbConnection> {
    AsyncDieselConnectionManager::<DbConnection>::new(database_url)
}

/// Build the single-connection write pool.
///
/// # Errors
/// Returns any error reported by the underlying connection pool builder.
pub async fn establish_write_pool(database_url: &str) -> Result<WritePool, PoolError> {
    #[cfg(feature = "sqlite")]
    let manager = sqlite_manager(database_url);
    #[cfg(all(feature = "postgres", not(feature = "sqlite")))]
    let manager = manager_for(database_url);

    Pool::builder().max_size(1).build(manager).await
}

/// Build the concurrency-sized read pool.
///
/// # Errors
/// Returns any error reported by the underlying connection pool builder.
pub async fn establish_read_pool(database_url: &str, max_size: u32) -> Result<ReadPool, PoolError> {
    #[cfg(feature = "sqlite")]
    let manager = sqlite_manager(database_url);
    #[cfg(all(feature = "postgres", not(feature = "sqlite")))]
    let manager = manager_for(database_url);

    Pool::builder().max_size(max_size).build(manager).await
}

/// The pair of pools a handler needs: one writer, many readers.
#[derive(Clone)]
pub struct Pools {
    /// Single-connection pool for mutating statements.
    pub write: WritePool,
    /// Concurrency-sized pool for list and get queries.
    pub read: ReadPool,
}

impl Pools {
    /// Establish both pools against the same database.
    ///
    /// # Errors
    /// Returns any error reported while building either pool.
    pub async fn establish(database_url: &str, read_pool_size: u32) -> Result<Self, PoolError> {
        let write = establish_write_pool(database_url).await?;
        let read = establish_read_pool(database_url, read_pool_size).await?;
        Ok(Self { write, read })
    }
}
