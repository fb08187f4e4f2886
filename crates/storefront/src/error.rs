//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Every error body has the shape `{ "success": false, "message": "..." }`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use partfruit_core::api::ErrorResponse;

use crate::db::RepositoryError;
use crate::services::GatewayError;
use crate::services::auth::AuthError;
use crate::services::blobs::BlobError;
use crate::services::orders::OrderError;

/// Shown when an admin login fails.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "نام کاربری یا رمز عبور اشتباه است";
/// Shown when a manual transfer arrives without a receipt.
pub const MISSING_RECEIPT_MESSAGE: &str = "لطفا تصویر رسید واریز را آپلود کنید";
/// Shown when the `reject` policy refuses an order total.
pub const TOTAL_MISMATCH_MESSAGE: &str = "مبلغ سفارش با قیمت‌های فعلی محصولات مطابقت ندارد";

/// Shown when an idempotency key is replayed with a different order.
pub const KEY_REUSED_MESSAGE: &str = "این سفارش قبلا با اطلاعات دیگری ثبت شده است";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order was refused.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Payment or messaging provider failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Upload could not be stored or read.
    #[error("Blob error: {0}")]
    Blob(#[from] BlobError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request body or path could not be deserialized.
    #[error("Invalid request: {message}")]
    InvalidRequest { status: StatusCode, message: String },

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl AppError {
    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::Order(err) => match err {
                OrderError::MissingReceipt => StatusCode::BAD_REQUEST,
                OrderError::TotalMismatch { .. } => StatusCode::CONFLICT,
                OrderError::KeyReused(_) => StatusCode::UNPROCESSABLE_ENTITY,
                OrderError::Blob(BlobError::Io(_)) | OrderError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                OrderError::Blob(_) => StatusCode::BAD_REQUEST,
            },
            Self::Blob(err) => match err {
                BlobError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidRequest { status, .. } => *status,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    // Don't expose internal error details to clients
    fn public_message(&self) -> String {
        if self.is_server_error() {
            return match self {
                Self::Gateway(_) => "External service error".to_string(),
                _ => "Internal server error".to_string(),
            };
        }
        match self {
            Self::Auth(AuthError::InvalidCredentials) => INVALID_CREDENTIALS_MESSAGE.to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Order(OrderError::MissingReceipt) => MISSING_RECEIPT_MESSAGE.to_string(),
            Self::Order(OrderError::TotalMismatch { .. }) => TOTAL_MISMATCH_MESSAGE.to_string(),
            Self::Order(OrderError::KeyReused(_)) => KEY_REUSED_MESSAGE.to_string(),
            Self::Order(err) => err.to_string(),
            Self::Database(err) => err.to_string(),
            Self::InvalidRequest { message, .. } => message.clone(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = ErrorResponse::new(self.public_message());

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for an authenticated admin.
pub fn set_sentry_user(admin_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the admin.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use partfruit_core::{OrderId, Price};

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::MissingReceipt)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::TotalMismatch {
                submitted: Price::ZERO,
                catalog: Price::from_f64(1.0).unwrap(),
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Order(OrderError::KeyReused(OrderId::new(1)))),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Gateway(GatewayError::Parse("bad".to_string()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::InvalidRequest {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: "unknown variant".to_string(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_login_failure_body() {
        let body = body_json(AppError::Auth(AuthError::InvalidCredentials)).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], INVALID_CREDENTIALS_MESSAGE);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_json(AppError::Internal("secret path /var/db".to_string())).await;
        assert_eq!(body["message"], "Internal server error");

        let body = body_json(AppError::Gateway(GatewayError::Api {
            status: 401,
            message: "bad key sk_live".to_string(),
        }))
        .await;
        assert_eq!(body["message"], "External service error");
    }
}
