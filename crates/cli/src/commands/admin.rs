//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! pf-cli admin create -u manager -p 'a long password'
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `SQLite` connection string for the storefront

use partfruit_storefront::db::{self, AdminRepository, RepositoryError};

use super::{CommandError, connect};

/// Create a new admin user.
///
/// # Returns
///
/// The ID of the created admin user.
///
/// # Errors
///
/// Returns `CommandError::InvalidUser` for a blank username or password and
/// `CommandError::UserExists` if the username is taken.
pub async fn create_user(username: &str, password: &str) -> Result<i64, CommandError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CommandError::InvalidUser("username must not be empty"));
    }
    if password.is_empty() {
        return Err(CommandError::InvalidUser("password must not be empty"));
    }

    let pool = connect().await?;
    db::migrate(&pool).await?;

    tracing::info!("Creating admin user: {username}");

    let admin = match AdminRepository::new(&pool).create(username, password).await {
        Ok(admin) => admin,
        Err(RepositoryError::Conflict(_)) => {
            return Err(CommandError::UserExists(username.to_owned()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "Admin user created successfully! ID: {}, Username: {}",
        admin.id,
        admin.username
    );

    Ok(admin.id.as_i64())
}
