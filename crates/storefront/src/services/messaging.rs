//! Verification-code delivery.
//!
//! The storefront does not generate per-customer codes: every customer
//! receives the same fixed test code. What varies is how it is delivered.
//! [`LogMessagingGateway`] only logs it, [`HttpMessagingGateway`] posts it
//! to a WhatsApp send endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{info, instrument};

use super::{GatewayError, PROVIDER_TIMEOUT, provider_client};
use crate::config::WhatsAppConfig;

/// The code sent to every customer.
pub const VERIFICATION_CODE: &str = "1234";

/// Message text for a verification code.
#[must_use]
pub fn verification_message(code: &str) -> String {
    format!("کد تایید پارت فروت: {code}")
}

/// Confirmation returned to the customer once the code is on its way.
#[must_use]
pub fn code_sent_notice(code: &str) -> String {
    format!("کد تایید به واتساپ شما ارسال شد (کد تستی: {code})")
}

/// Something that can deliver a text message to a phone number.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Deliver `message` to `phone`.
    async fn send(&self, phone: &str, message: &str) -> Result<(), GatewayError>;
}

/// Gateway that only logs messages.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMessagingGateway;

#[async_trait]
impl MessagingGateway for LogMessagingGateway {
    async fn send(&self, phone: &str, message: &str) -> Result<(), GatewayError> {
        info!(%phone, %message, "Sending WhatsApp message (log only)");
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    to: &'a str,
    message: &'a str,
}

/// Gateway posting to an HTTP send endpoint with a bearer token.
#[derive(Clone)]
pub struct HttpMessagingGateway {
    client: reqwest::Client,
    api_url: url::Url,
}

impl HttpMessagingGateway {
    /// Create a new messaging client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, GatewayError> {
        Self::with_timeout(config, PROVIDER_TIMEOUT)
    }

    /// Create a messaging client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Same as [`HttpMessagingGateway::new`].
    pub fn with_timeout(config: &WhatsAppConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| GatewayError::Parse(format!("Invalid API token format: {e}")))?,
        );

        let client = provider_client(headers, timeout)?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl MessagingGateway for HttpMessagingGateway {
    #[instrument(skip(self, message))]
    async fn send(&self, phone: &str, message: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.api_url.clone())
            .json(&SendMessageRequest { to: phone, message })
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

        Ok(())
    }
}
