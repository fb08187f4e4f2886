//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username/password pair did not match an admin.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No bearer token on a request that needs one.
    #[error("missing admin token")]
    MissingToken,

    /// Token unknown, revoked or expired.
    #[error("invalid or expired admin token")]
    InvalidToken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
