//! Request and response bodies of the JSON API.
//!
//! Shared by the storefront handlers and the client so the two sides cannot
//! drift apart.

use serde::{Deserialize, Serialize};

use super::id::{OrderId, ProductId};
use super::price::Price;

/// `POST /admin/login` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful `POST /admin/login` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    /// Opaque bearer token for the admin endpoints.
    pub token: String,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    /// Build a failure body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Plain acknowledgement (`{"success": true}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    /// The success acknowledgement.
    pub const OK: Self = Self { success: true };
}

/// `POST /auth/whatsapp-code` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationCodeRequest {
    pub phone: String,
}

/// `POST /auth/whatsapp-code` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCodeResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /orders` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderCreated {
    pub success: bool,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

/// `POST /payments/{provider}/session` body.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentSessionRequest {
    pub amount: Price,
}

/// `POST /payments/{provider}/session` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub checkout_url: String,
}

/// `POST /products` response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProductCreated {
    pub id: ProductId,
}
