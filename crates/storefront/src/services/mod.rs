//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Admin login and bearer-token sessions
//! - `blobs` - Content-addressed storage for uploaded images
//! - `messaging` - Verification-code delivery (WhatsApp or log)
//! - `orders` - Order placement: receipt storage, total check, idempotency
//! - `payments` - Hosted-checkout session creation (Thawani or mock)

pub mod auth;
pub mod blobs;
pub mod messaging;
pub mod orders;
pub mod payments;

use std::time::Duration;

use reqwest::header::HeaderMap;
use thiserror::Error;

/// Upper bound on a single provider request.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors returned by the external provider gateways.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse the provider response or build the request.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// HTTP client for a provider API.
fn provider_client(headers: HeaderMap, timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}
