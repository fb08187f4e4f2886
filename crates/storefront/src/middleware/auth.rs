//! Admin authentication extractor.
//!
//! Admin endpoints take a [`RequireAdmin`] argument. It reads
//! `Authorization: Bearer <token>` and resolves the token against the live
//! admin sessions, rejecting the request with 401 otherwise.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use partfruit_core::api::ErrorResponse;

use crate::error::set_sentry_user;
use crate::services::auth::{AdminAuthService, AdminSession, AuthError};
use crate::state::AppState;

/// Extractor that requires a valid admin bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_orders(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.session.username)
/// }
/// ```
pub struct RequireAdmin(pub AuthenticatedAdmin);

/// The resolved session together with the token that proved it.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub token: String,
    pub session: AdminSession,
}

/// Error returned when an admin endpoint is called without a valid token.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// No bearer token on the request.
    MissingToken,
    /// Token unknown, revoked or expired.
    InvalidToken,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        let err = match self {
            Self::MissingToken => AuthError::MissingToken,
            Self::InvalidToken => AuthError::InvalidToken,
        };
        (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(err.to_string()))).into_response()
    }
}

/// The token of an `Authorization: Bearer` header, if present.
#[must_use]
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| {
            v.strip_prefix("Bearer ")
                .or_else(|| v.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AdminAuthRejection::MissingToken)?;

        let session = AdminAuthService::new(state.pool(), state.sessions())
            .authorize(token)
            .await
            .map_err(|_| AdminAuthRejection::InvalidToken)?;

        set_sentry_user(&session.admin_id, &session.username);

        Ok(Self(AuthenticatedAdmin {
            token: token.to_owned(),
            session,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&parts(Some("bearer abc123"))), Some("abc123"));
        assert_eq!(bearer_token(&parts(Some("Basic YWRtaW4="))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[test]
    fn test_rejection_is_unauthorized() {
        assert_eq!(
            AdminAuthRejection::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdminAuthRejection::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
