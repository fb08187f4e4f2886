//! Database operations for the storefront `SQLite` store.
//!
//! ## Tables
//!
//! - `categories` - Product categories (filter chips)
//! - `products` - Catalog entries; `category_id` is a soft reference
//! - `admins` - Admin credentials
//! - `orders` - Submitted orders with their item snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and embedded at
//! compile time. They run on server start-up when `STOREFRONT_AUTO_MIGRATE`
//! is set, or explicitly via:
//! ```bash
//! cargo run -p partfruit-cli -- migrate
//! ```

pub mod admins;
pub mod catalog;
pub mod orders;
pub mod seed;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use admins::AdminRepository;
pub use catalog::CatalogRepository;
pub use orders::{KeyedOrder, OrderRepository, Submission};

/// Embedded storefront migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, what: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(format!("{what} already exists"));
        }
        Self::Database(err)
    }
}

/// Create a `SQLite` connection pool.
///
/// The database file is created if missing. Foreign-key enforcement is
/// switched off so that products may keep pointing at deleted categories.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the database cannot be opened.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(false);

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create a pool over a private in-memory database.
///
/// Every connection to `sqlite::memory:` gets its own database, so the pool
/// holds exactly one connection that is never recycled.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(false);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history
/// does not match the embedded migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Pool with the schema applied, for tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = create_memory_pool()
        .await
        .expect("in-memory pool should open");
    migrate(&pool).await.expect("migrations should apply");
    pool
}
