//! Admin credential repository.

use sqlx::SqlitePool;
use tracing::instrument;

use partfruit_core::AdminId;

use super::RepositoryError;

/// An administrator account (without the password).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: AdminId,
    pub username: String,
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: i64,
    username: String,
}

impl From<AdminRow> for Admin {
    fn from(row: AdminRow) -> Self {
        Self {
            id: AdminId::new(row.id),
            username: row.username,
        }
    }
}

/// Repository for admin credentials.
pub struct AdminRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminRepository<'a> {
    /// Create a new admin repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up the admin whose username and password both match exactly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Admin>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, username FROM admins WHERE username = ? AND password = ?",
        )
        .bind(username)
        .bind(password)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Admin::from))
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password))]
    pub async fn create(&self, username: &str, password: &str) -> Result<Admin, RepositoryError> {
        let result = sqlx::query("INSERT INTO admins (username, password) VALUES (?, ?)")
            .bind(username)
            .bind(password)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_insert(e, "username"))?;

        Ok(Admin {
            id: AdminId::new(result.last_insert_rowid()),
            username: username.to_owned(),
        })
    }

    /// Number of admin accounts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
