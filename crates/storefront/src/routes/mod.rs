//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Readiness check (database ping)
//!
//! # Admin (bearer token from /api/admin/login)
//! POST /api/admin/login                 - Issue admin token (rate limited)
//! POST /api/admin/logout                - Revoke admin token
//!
//! # Customer verification
//! POST /api/auth/whatsapp-code          - Send verification code (rate limited)
//!
//! # Orders
//! POST /api/orders                      - Place order (Idempotency-Key header)
//! GET  /api/orders                      - All orders, newest first (admin)
//!
//! # Payments
//! POST /api/payments/{provider}/session - Open hosted-checkout session
//!
//! # Catalog
//! GET    /api/categories                - Category listing
//! GET    /api/products                  - Products with category name
//! POST   /api/products                  - Create product (admin)
//! PUT    /api/products/{id}             - Overwrite product (admin)
//! DELETE /api/products/{id}             - Delete product (admin)
//!
//! # Uploads
//! GET  /api/blobs/{hash}                - Stored receipt or product image
//! ```

pub mod admin;
pub mod auth;
pub mod blobs;
pub mod catalog;
pub mod health;
pub mod orders;
pub mod payments;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest, FromRequestParts},
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::{
    login_rate_limiter, request_id_middleware, verification_code_rate_limiter,
};
use crate::state::AppState;

/// Largest accepted request body (inline receipt and product images).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// JSON body extractor whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path parameter extractor whose rejections use the API error shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login).layer(login_rate_limiter()))
        .route("/logout", post(admin::logout))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            put(catalog::update_product).delete(catalog::delete_product),
        )
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/admin", admin_routes())
        .route(
            "/auth/whatsapp-code",
            post(auth::whatsapp_code).layer(verification_code_rate_limiter()),
        )
        .route("/orders", post(orders::create).get(orders::list))
        .route(
            "/payments/{provider}/session",
            post(payments::create_session),
        )
        .route("/blobs/{hash}", get(blobs::show))
        .merge(catalog_routes())
}

/// Build the complete application: routes, middleware and state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    use partfruit_core::api::ErrorResponse;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::db::test_pool;

    async fn app() -> Router {
        let config = StorefrontConfig::with_database_url("sqlite::memory:");
        router(AppState::new(config, test_pool().await).unwrap())
    }

    fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn error_body(response: axum::response::Response) -> ErrorResponse {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_echoes_request_id() {
        let response = app()
            .await
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_shape() {
        let response = app()
            .await
            .oneshot(post_json("/api/orders", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!error_body(response).await.success);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let body = format!(r#"{{"address":"{}"}}"#, "a".repeat(MAX_BODY_BYTES));
        let response = app()
            .await
            .oneshot(post_json("/api/orders", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(!error_body(response).await.success);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = app()
            .await
            .oneshot(Request::get("/api/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
