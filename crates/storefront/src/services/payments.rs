//! Hosted-checkout session creation.
//!
//! A checkout gateway turns an amount into a session id and a URL the
//! customer is redirected to. The storefront never learns whether the
//! payment completed.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use url::Url;

use partfruit_core::Price;

use super::{GatewayError, PROVIDER_TIMEOUT, provider_client};
use crate::config::ThawaniConfig;

/// Provider name used in `/payments/{provider}/session`.
pub const THAWANI: &str = "thawani";

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
}

/// Something that can open a hosted-checkout session.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Provider name the gateway is routed under.
    fn provider(&self) -> &str;

    /// Open a session for `amount`.
    async fn create_session(&self, amount: Price) -> Result<CheckoutSession, GatewayError>;
}

// =============================================================================
// Mock provider
// =============================================================================

/// Gateway that fabricates sessions without contacting anyone.
#[derive(Debug, Clone)]
pub struct MockCheckoutGateway {
    provider: String,
}

impl MockCheckoutGateway {
    /// Fixed redirect target of every mock session.
    pub const CHECKOUT_URL: &'static str = "https://checkout.thawani.om/pay/mock_session";

    /// Mock gateway routed under `provider`.
    #[must_use]
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }
}

impl Default for MockCheckoutGateway {
    fn default() -> Self {
        Self::new(THAWANI)
    }
}

#[async_trait]
impl CheckoutGateway for MockCheckoutGateway {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn create_session(&self, amount: Price) -> Result<CheckoutSession, GatewayError> {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();

        info!(%amount, "Created mock checkout session");
        Ok(CheckoutSession {
            session_id: format!("{}_{suffix}", self.provider),
            checkout_url: Self::CHECKOUT_URL.to_string(),
        })
    }
}

// =============================================================================
// Thawani
// =============================================================================

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    client_reference_id: String,
    mode: &'static str,
    products: [SessionProduct<'a>; 1],
    success_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Serialize)]
struct SessionProduct<'a> {
    name: &'a str,
    quantity: u32,
    unit_amount: i64,
}

#[derive(Deserialize)]
struct CreateSessionResponse {
    success: bool,
    #[serde(default)]
    description: String,
    data: Option<SessionData>,
}

#[derive(Deserialize)]
struct SessionData {
    session_id: String,
}

/// Thawani checkout API client.
#[derive(Clone)]
pub struct ThawaniGateway {
    client: reqwest::Client,
    base_url: Url,
    publishable_key: String,
    success_url: String,
    cancel_url: String,
}

impl ThawaniGateway {
    /// Create a new Thawani client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ThawaniConfig) -> Result<Self, GatewayError> {
        Self::with_timeout(config, PROVIDER_TIMEOUT)
    }

    /// Create a Thawani client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Same as [`ThawaniGateway::new`].
    pub fn with_timeout(config: &ThawaniConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "thawani-api-key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| GatewayError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = provider_client(headers, timeout)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            publishable_key: config.publishable_key.clone(),
            success_url: config.success_url.clone(),
            cancel_url: config.cancel_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::Parse(format!("Invalid endpoint {path}: {e}")))
    }

    fn pay_url(&self, session_id: &str) -> Result<String, GatewayError> {
        let mut url = self.endpoint(&format!("/pay/{session_id}"))?;
        url.query_pairs_mut().append_pair("key", &self.publishable_key);
        Ok(url.into())
    }
}

#[async_trait]
impl CheckoutGateway for ThawaniGateway {
    fn provider(&self) -> &str {
        THAWANI
    }

    #[instrument(skip(self))]
    async fn create_session(&self, amount: Price) -> Result<CheckoutSession, GatewayError> {
        let request = CreateSessionRequest {
            client_reference_id: uuid::Uuid::new_v4().to_string(),
            mode: "payment",
            products: [SessionProduct {
                name: "سفارش پارت فروت",
                quantity: 1,
                unit_amount: baisa(amount)?,
            }],
            success_url: &self.success_url,
            cancel_url: &self.cancel_url,
        };

        let response = self
            .client
            .post(self.endpoint("/api/v1/checkout/session")?)
            .json(&request)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreateSessionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        let data = match body.data {
            Some(data) if body.success => data,
            _ => {
                return Err(GatewayError::Api {
                    status: status.as_u16(),
                    message: body.description,
                });
            }
        };

        Ok(CheckoutSession {
            checkout_url: self.pay_url(&data.session_id)?,
            session_id: data.session_id,
        })
    }
}

/// Amount in baisa (1/1000 rial), the unit Thawani expects.
fn baisa(amount: Price) -> Result<i64, GatewayError> {
    amount
        .to_minor_units(1000)
        .ok_or_else(|| GatewayError::Parse(format!("amount out of range: {amount}")))
}
