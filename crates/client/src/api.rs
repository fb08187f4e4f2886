//! Storefront API client.
//!
//! [`StoreApi`] is the seam between the view-state machine and the network.
//! [`HttpStoreApi`] talks to a running storefront over HTTP.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use partfruit_core::api::{
    Ack, ErrorResponse, LoginRequest, LoginResponse, OrderCreated, PaymentSessionRequest,
    PaymentSessionResponse, ProductCreated, VerificationCodeRequest, VerificationCodeResponse,
};
use partfruit_core::{Category, NewOrder, Order, OrderId, Price, Product, ProductId, ProductInput};

use crate::error::ClientError;

/// Header carrying the per-checkout idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Operations the client performs against the storefront.
#[async_trait]
pub trait StoreApi: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>, ClientError>;

    async fn products(&self) -> Result<Vec<Product>, ClientError>;

    /// Exchange credentials for an admin token.
    async fn login(&self, username: &str, password: &str) -> Result<SecretString, ClientError>;

    async fn logout(&self, token: &SecretString) -> Result<(), ClientError>;

    /// Ask the storefront to message a verification code; returns its notice.
    async fn request_verification_code(&self, phone: &str) -> Result<String, ClientError>;

    async fn create_payment_session(
        &self,
        provider: &str,
        amount: Price,
    ) -> Result<PaymentSessionResponse, ClientError>;

    async fn create_order(
        &self,
        order: &NewOrder,
        idempotency_key: &str,
    ) -> Result<OrderId, ClientError>;

    async fn orders(&self, token: &SecretString) -> Result<Vec<Order>, ClientError>;

    async fn create_product(
        &self,
        token: &SecretString,
        input: &ProductInput,
    ) -> Result<ProductId, ClientError>;

    async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), ClientError>;

    async fn delete_product(&self, token: &SecretString, id: ProductId) -> Result<(), ClientError>;
}

/// HTTP implementation of [`StoreApi`].
#[derive(Clone)]
pub struct HttpStoreApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpStoreApi {
    /// Create a client for the storefront at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(base_url: Url) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(&format!("api/{path}"))
            .map_err(|e| ClientError::Platform(format!("invalid API URL: {e}")))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Turn a non-success response into `ClientError::Api`, keeping the server message.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.message)
        .unwrap_or(body);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl StoreApi for HttpStoreApi {
    async fn categories(&self) -> Result<Vec<Category>, ClientError> {
        Self::send(self.client.get(self.url("categories")?)).await
    }

    async fn products(&self) -> Result<Vec<Product>, ClientError> {
        Self::send(self.client.get(self.url("products")?)).await
    }

    #[instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<SecretString, ClientError> {
        let body = LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        let response: LoginResponse =
            Self::send(self.client.post(self.url("admin/login")?).json(&body)).await?;
        Ok(SecretString::from(response.token))
    }

    async fn logout(&self, token: &SecretString) -> Result<(), ClientError> {
        let _: Ack = Self::send(
            self.client
                .post(self.url("admin/logout")?)
                .bearer_auth(token.expose_secret()),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn request_verification_code(&self, phone: &str) -> Result<String, ClientError> {
        let body = VerificationCodeRequest {
            phone: phone.to_owned(),
        };
        let response: VerificationCodeResponse =
            Self::send(self.client.post(self.url("auth/whatsapp-code")?).json(&body)).await?;
        Ok(response.message)
    }

    #[instrument(skip(self))]
    async fn create_payment_session(
        &self,
        provider: &str,
        amount: Price,
    ) -> Result<PaymentSessionResponse, ClientError> {
        let path = format!("payments/{}/session", urlencoding::encode(provider));
        Self::send(
            self.client
                .post(self.url(&path)?)
                .json(&PaymentSessionRequest { amount }),
        )
        .await
    }

    #[instrument(skip(self, order), fields(payment_method = %order.payment_method))]
    async fn create_order(
        &self,
        order: &NewOrder,
        idempotency_key: &str,
    ) -> Result<OrderId, ClientError> {
        let response: OrderCreated = Self::send(
            self.client
                .post(self.url("orders")?)
                .header(IDEMPOTENCY_KEY_HEADER, idempotency_key)
                .json(order),
        )
        .await?;
        Ok(response.order_id)
    }

    async fn orders(&self, token: &SecretString) -> Result<Vec<Order>, ClientError> {
        Self::send(
            self.client
                .get(self.url("orders")?)
                .bearer_auth(token.expose_secret()),
        )
        .await
    }

    async fn create_product(
        &self,
        token: &SecretString,
        input: &ProductInput,
    ) -> Result<ProductId, ClientError> {
        let response: ProductCreated = Self::send(
            self.client
                .post(self.url("products")?)
                .bearer_auth(token.expose_secret())
                .json(input),
        )
        .await?;
        Ok(response.id)
    }

    async fn update_product(
        &self,
        token: &SecretString,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), ClientError> {
        let _: Ack = Self::send(
            self.client
                .put(self.url(&format!("products/{id}"))?)
                .bearer_auth(token.expose_secret())
                .json(input),
        )
        .await?;
        Ok(())
    }

    async fn delete_product(&self, token: &SecretString, id: ProductId) -> Result<(), ClientError> {
        let _: Ack = Self::send(
            self.client
                .delete(self.url(&format!("products/{id}"))?)
                .bearer_auth(token.expose_secret()),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_resolve_under_api() {
        let api = HttpStoreApi::new(Url::parse("http://localhost:3000").unwrap()).unwrap();
        assert_eq!(
            api.url("products/7").unwrap().as_str(),
            "http://localhost:3000/api/products/7"
        );

        let mounted = HttpStoreApi::new(Url::parse("https://shop.example/fruit/").unwrap()).unwrap();
        assert_eq!(
            mounted.url("orders").unwrap().as_str(),
            "https://shop.example/fruit/api/orders"
        );
    }
}
