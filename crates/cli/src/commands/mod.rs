//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use partfruit_storefront::config::{ConfigError, StorefrontConfig};
use partfruit_storefront::db;
use sqlx::SqlitePool;

/// Connect to the database the server is configured with.
async fn connect() -> Result<SqlitePool, CommandError> {
    let config = StorefrontConfig::from_env()?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&config.database_url).await?)
}

/// Errors shared by all commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Seed(#[from] db::seed::SeedError),

    #[error(transparent)]
    Repository(#[from] db::RepositoryError),

    #[error("Admin user already exists: {0}")]
    UserExists(String),

    #[error("Invalid admin user: {0}")]
    InvalidUser(&'static str),
}
