//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! pf-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `SQLite` connection string for the storefront

use partfruit_storefront::db;

use super::{CommandError, connect};

/// Apply pending storefront migrations.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    db::migrate(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
