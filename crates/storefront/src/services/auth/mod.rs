//! Admin authentication service.
//!
//! A successful login issues an opaque bearer token. Tokens live only in
//! memory (a `moka` cache with a time-to-live), so a restart signs every
//! admin out.

mod error;

pub use error::AuthError;

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use sqlx::SqlitePool;
use tracing::{info, instrument, warn};

use partfruit_core::AdminId;

use crate::db::AdminRepository;

/// Upper bound on concurrently live admin tokens.
const MAX_LIVE_SESSIONS: u64 = 10_000;

/// An authenticated admin, resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub admin_id: AdminId,
    pub username: String,
    pub issued_at: DateTime<Utc>,
}

/// Store of live admin tokens.
#[derive(Clone)]
pub struct AdminSessions {
    cache: Cache<String, AdminSession>,
}

impl AdminSessions {
    /// Create a store whose tokens expire `ttl` after issue.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(MAX_LIVE_SESSIONS)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Record a session under a fresh token and return the token.
    pub async fn issue(&self, session: AdminSession) -> String {
        let token = generate_token();
        self.cache.insert(token.clone(), session).await;
        token
    }

    /// Resolve a token to its live session.
    pub async fn get(&self, token: &str) -> Option<AdminSession> {
        self.cache.get(token).await
    }

    /// Revoke a token. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) {
        self.cache.invalidate(token).await;
    }
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    admins: AdminRepository<'a>,
    sessions: &'a AdminSessions,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, sessions: &'a AdminSessions) -> Self {
        Self {
            admins: AdminRepository::new(pool),
            sessions,
        }
    }

    /// Verify credentials and issue a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the pair does not match an admin.
    /// Returns `AuthError::Repository` if the lookup fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let Some(admin) = self.admins.verify_credentials(username, password).await? else {
            warn!("Admin login failed");
            return Err(AuthError::InvalidCredentials);
        };

        let token = self
            .sessions
            .issue(AdminSession {
                admin_id: admin.id,
                username: admin.username,
                issued_at: Utc::now(),
            })
            .await;

        info!(admin_id = %admin.id, "Admin logged in");
        Ok(token)
    }

    /// Resolve a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    pub async fn authorize(&self, token: &str) -> Result<AdminSession, AuthError> {
        self.sessions
            .get(token)
            .await
            .ok_or(AuthError::InvalidToken)
    }

    /// Revoke a bearer token.
    pub async fn logout(&self, token: &str) {
        self.sessions.revoke(token).await;
    }
}

/// 32 random bytes, base64url without padding.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn test_login_issues_token_that_authorizes() {
        let pool = test_pool().await;
        AdminRepository::new(&pool)
            .create("admin", "partfruit2024")
            .await
            .unwrap();
        let sessions = AdminSessions::new(Duration::from_secs(60));
        let service = AdminAuthService::new(&pool, &sessions);

        let token = service.login("admin", "partfruit2024").await.unwrap();
        let session = service.authorize(&token).await.unwrap();
        assert_eq!(session.username, "admin");

        service.logout(&token).await;
        assert!(matches!(
            service.authorize(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let pool = test_pool().await;
        AdminRepository::new(&pool)
            .create("admin", "partfruit2024")
            .await
            .unwrap();
        let sessions = AdminSessions::new(Duration::from_secs(60));
        let service = AdminAuthService::new(&pool, &sessions);

        assert!(matches!(
            service.login("admin", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let sessions = AdminSessions::new(Duration::from_millis(50));
        let token = sessions
            .issue(AdminSession {
                admin_id: AdminId::new(1),
                username: "admin".to_string(),
                issued_at: Utc::now(),
            })
            .await;
        assert!(sessions.get(&token).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(sessions.get(&token).await.is_none());
    }
}
