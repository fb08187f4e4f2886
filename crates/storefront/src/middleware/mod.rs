//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per request)
//! 2. `TraceLayer` (request span with an empty `request_id` field)
//! 3. Request ID (fills the span field, echoes `x-request-id`)
//! 4. CORS (permissive, the client may be served from another origin)
//! 5. Body limit (10 MiB, inline images)
//! 6. Rate limiting (governor) on the login and verification-code routes

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthenticatedAdmin, RequireAdmin, bearer_token};
pub use rate_limit::{login_rate_limiter, verification_code_rate_limiter};
pub use request_id::request_id_middleware;
