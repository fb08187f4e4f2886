//! The client view-state machine.
//!
//! [`App`] owns everything the storefront UI shows: the current view, at most
//! one overlay, the fetched catalog, the cart, and the admin session. Front
//! ends render its state and call its methods in response to user input.
//!
//! Failed network calls never close the form they came from. The error is
//! returned and also left in [`App::notice`] for display.

use std::path::Path;

use tracing::{info, instrument, warn};

use partfruit_core::{Category, CategoryId, Order, OrderId, PaymentMethod, Product, ProductId};

use crate::admin::{AdminSession, LoginForm, ProductDraft};
use crate::api::{HttpStoreApi, StoreApi};
use crate::cart::Cart;
use crate::checkout::{
    CheckoutForm, order_message, payment_label, transfer_instructions, whatsapp_link,
};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::filter::CatalogFilter;
use crate::platform::{NativePlatform, Platform};

/// Provider used for hosted checkout.
pub const HOSTED_CHECKOUT_PROVIDER: &str = "thawani";

const LOCATION_FAILED_NOTICE: &str = "دسترسی به موقعیت مکانی امکان‌پذیر نیست";

/// Top-level view. Exactly one is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Store,
    Cart,
    Admin,
    AdminOrders,
}

impl View {
    /// Whether the view needs an admin session.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::AdminOrders)
    }
}

/// Modal shown over the current view.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    AdminLogin(LoginForm),
    Checkout(CheckoutForm),
    ProductEditor(ProductDraft),
    OrderComplete { order_id: OrderId },
}

/// Result of a successful checkout submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Hosted checkout: the customer was sent to the provider.
    Redirected {
        order_id: OrderId,
        checkout_url: String,
    },
    /// Order handed to the shop over WhatsApp.
    Completed {
        order_id: OrderId,
        whatsapp_url: String,
    },
}

/// Storefront application state.
pub struct App<A, P> {
    api: A,
    platform: P,
    config: ClientConfig,
    view: View,
    overlay: Option<Overlay>,
    session: Option<AdminSession>,
    categories: Vec<Category>,
    products: Vec<Product>,
    filter: CatalogFilter,
    cart: Cart,
    orders: Vec<Order>,
    notice: Option<String>,
}

impl App<HttpStoreApi, NativePlatform> {
    /// The native application configured from `PARTFRUIT_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` for an invalid variable, or the HTTP
    /// client error.
    pub fn from_env() -> Result<Self, ClientError> {
        let config = ClientConfig::from_env()?;
        let api = HttpStoreApi::new(config.api_url.clone())?;
        let platform = NativePlatform::new(config.position);
        Ok(Self::new(api, platform, config))
    }
}

impl<A: StoreApi, P: Platform> App<A, P> {
    /// A fresh application on the store view, without admin session.
    #[must_use]
    pub fn new(api: A, platform: P, config: ClientConfig) -> Self {
        Self {
            api,
            platform,
            config,
            view: View::Store,
            overlay: None,
            session: None,
            categories: Vec::new(),
            products: Vec::new(),
            filter: CatalogFilter::default(),
            cart: Cart::new(),
            orders: Vec::new(),
            notice: None,
        }
    }

    /// An application restoring a previously issued admin session.
    #[must_use]
    pub fn with_session(api: A, platform: P, config: ClientConfig, session: AdminSession) -> Self {
        let mut app = Self::new(api, platform, config);
        app.session = Some(session);
        app
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub const fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    #[must_use]
    pub const fn session(&self) -> Option<&AdminSession> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Products passing the current category and search filter.
    #[must_use]
    pub fn visible_products(&self) -> Vec<&Product> {
        self.filter.apply(&self.products)
    }

    #[must_use]
    pub const fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Orders fetched by the admin orders view.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Loaded orders with the short label of their payment method.
    pub fn labelled_orders(&self) -> impl Iterator<Item = (&Order, &'static str)> {
        self.orders
            .iter()
            .map(|order| (order, payment_label(order.payment_method)))
    }

    /// Where to pay, while the checkout form has manual transfer selected.
    #[must_use]
    pub fn transfer_instructions(&self) -> Option<String> {
        match &self.overlay {
            Some(Overlay::Checkout(form))
                if form.payment_method == PaymentMethod::ManualTransfer =>
            {
                Some(transfer_instructions(&self.config.transfer_number))
            }
            _ => None,
        }
    }

    /// Message waiting to be shown to the user.
    #[must_use]
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Take the pending message, clearing it.
    pub const fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    // =========================================================================
    // Catalog and navigation
    // =========================================================================

    /// Fetch categories and products, replacing what was loaded before.
    ///
    /// # Errors
    ///
    /// Returns the network error; the previous catalog stays in place.
    pub async fn load_catalog(&mut self) -> Result<(), ClientError> {
        let result = async {
            let categories = self.api.categories().await?;
            let products = self.api.products().await?;
            Ok::<_, ClientError>((categories, products))
        }
        .await;

        match result {
            Ok((categories, products)) => {
                self.categories = categories;
                self.products = products;
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    pub fn select_category(&mut self, category: Option<CategoryId>) {
        self.filter.category = category;
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.filter.query = query.into();
    }

    /// Switch view. Admin views without a session open the login form instead.
    pub async fn navigate(&mut self, view: View) {
        if view.is_admin() && self.session.is_none() {
            self.open_admin_login();
            return;
        }

        self.view = view;
        if view == View::AdminOrders
            && let Err(e) = self.refresh_orders().await
        {
            // Already reported in the notice; the view shows the last list.
            warn!(error = %e, "Could not refresh orders");
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add one unit of a loaded product.
    pub fn add_to_cart(&mut self, id: ProductId) {
        if let Some(product) = self.products.iter().find(|p| p.id == id) {
            self.cart.add(product);
        }
    }

    pub fn increment(&mut self, id: ProductId) {
        self.cart.increment(id);
    }

    pub fn decrement(&mut self, id: ProductId) {
        self.cart.decrement(id);
    }

    pub fn remove_from_cart(&mut self, id: ProductId) {
        self.cart.remove(id);
    }

    // =========================================================================
    // Admin session
    // =========================================================================

    pub fn open_admin_login(&mut self) {
        self.overlay = Some(Overlay::AdminLogin(LoginForm::default()));
    }

    pub const fn login_form_mut(&mut self) -> Option<&mut LoginForm> {
        match &mut self.overlay {
            Some(Overlay::AdminLogin(form)) => Some(form),
            _ => None,
        }
    }

    /// Submit the login form.
    ///
    /// On success the session is stored and the form closes. A refused login
    /// keeps the form open with the server message in [`LoginForm::error`].
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotOpen` without a login form, or the API error.
    #[instrument(skip(self))]
    pub async fn submit_admin_login(&mut self) -> Result<(), ClientError> {
        let Some(form) = self.login_form_mut() else {
            return Err(ClientError::NotOpen("admin login"));
        };
        let (username, password) = (form.username.clone(), form.password.clone());

        match self.api.login(&username, &password).await {
            Ok(token) => {
                info!(username, "Admin logged in");
                self.session = Some(AdminSession::new(token));
                self.overlay = None;
                Ok(())
            }
            Err(ClientError::Api { status, message }) => {
                if let Some(form) = self.login_form_mut() {
                    form.error = Some(message.clone());
                    form.password.clear();
                }
                Err(ClientError::Api { status, message })
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Drop the admin session and leave admin views.
    pub async fn logout(&mut self) {
        if let Some(session) = self.session.take()
            && let Err(e) = self.api.logout(session.token()).await
        {
            warn!(error = %e, "Server-side logout failed");
        }
        self.orders.clear();
        if self.view.is_admin() {
            self.view = View::Store;
        }
        if matches!(self.overlay, Some(Overlay::ProductEditor(_))) {
            self.overlay = None;
        }
    }

    /// Fetch all orders for the admin orders view.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthorized` without a session, or the API error.
    pub async fn refresh_orders(&mut self) -> Result<(), ClientError> {
        let session = self.require_session()?;
        match self.api.orders(session.token()).await {
            Ok(orders) => {
                self.orders = orders;
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Open the checkout form with a fresh idempotency key.
    pub fn open_checkout(&mut self) {
        if self.cart.is_empty() {
            return;
        }
        self.overlay = Some(Overlay::Checkout(CheckoutForm::new()));
    }

    pub const fn checkout_form_mut(&mut self) -> Option<&mut CheckoutForm> {
        match &mut self.overlay {
            Some(Overlay::Checkout(form)) => Some(form),
            _ => None,
        }
    }

    /// Ask the storefront to send the verification code to the entered phone.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotOpen` without a checkout form, or the API error.
    pub async fn request_verification_code(&mut self) -> Result<(), ClientError> {
        let Some(form) = self.checkout_form_mut() else {
            return Err(ClientError::NotOpen("checkout"));
        };
        let phone = form.phone.clone();

        match self.api.request_verification_code(&phone).await {
            Ok(message) => {
                if let Some(form) = self.checkout_form_mut() {
                    form.code_requested = true;
                }
                self.notice = Some(message);
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Record the device position on the checkout form.
    ///
    /// A failure only leaves a notice; checkout continues without coordinates.
    pub async fn capture_location(&mut self) {
        if self.checkout_form_mut().is_none() {
            return;
        }
        match self.platform.current_position().await {
            Ok(position) => {
                if let Some(form) = self.checkout_form_mut() {
                    form.location = Some(position);
                }
            }
            Err(e) => {
                warn!(error = %e, "Location unavailable");
                self.notice = Some(LOCATION_FAILED_NOTICE.to_owned());
            }
        }
    }

    /// Read a receipt file into the checkout form.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotOpen` without a checkout form, or the platform error.
    pub async fn attach_receipt(&mut self, path: &Path) -> Result<(), ClientError> {
        if self.checkout_form_mut().is_none() {
            return Err(ClientError::NotOpen("checkout"));
        }
        match self.platform.read_data_url(path).await {
            Ok(data_url) => {
                if let Some(form) = self.checkout_form_mut() {
                    form.receipt_image = Some(data_url);
                }
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    /// Validate and submit the checkout form.
    ///
    /// Validation runs before any request. Hosted checkout opens a payment
    /// session, stores the order and sends the customer to the provider.
    /// Other methods store the order, open the WhatsApp message to the shop
    /// and show the completion screen.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for an incomplete form and the API
    /// error for a failed request. The form stays open in both cases.
    #[instrument(skip(self))]
    pub async fn submit_checkout(&mut self) -> Result<CheckoutOutcome, ClientError> {
        let Some(Overlay::Checkout(form)) = self.overlay.clone() else {
            return Err(ClientError::NotOpen("checkout"));
        };

        if let Err(e) = form.validate(&self.config.verification_code) {
            return Err(self.report(e.into()));
        }

        let order = form.to_order(&self.cart);
        let key = match self.checkout_form_mut() {
            Some(current) => current.key_for(&order).to_owned(),
            None => return Err(ClientError::NotOpen("checkout")),
        };

        if order.payment_method == PaymentMethod::HostedCheckout {
            let result = async {
                let session = self
                    .api
                    .create_payment_session(HOSTED_CHECKOUT_PROVIDER, order.total_price)
                    .await?;
                let order_id = self.api.create_order(&order, &key).await?;
                Ok::<_, ClientError>((order_id, session.checkout_url))
            }
            .await;

            let (order_id, checkout_url) = result.map_err(|e| self.report(e))?;
            if let Err(e) = self.platform.open_url(&checkout_url).await {
                warn!(error = %e, "Could not open checkout page");
            }
            self.overlay = None;
            return Ok(CheckoutOutcome::Redirected {
                order_id,
                checkout_url,
            });
        }

        let order_id = match self.api.create_order(&order, &key).await {
            Ok(id) => id,
            Err(e) => return Err(self.report(e)),
        };

        let message = order_message(&form, &self.cart);
        let whatsapp_url = whatsapp_link(&self.config.whatsapp_number, &message);
        if let Err(e) = self.platform.open_url(&whatsapp_url).await {
            warn!(error = %e, "Could not open WhatsApp");
        }

        info!(%order_id, "Order submitted");
        self.overlay = Some(Overlay::OrderComplete { order_id });
        Ok(CheckoutOutcome::Completed {
            order_id,
            whatsapp_url,
        })
    }

    /// Leave the completion screen: empty cart, back to the store.
    pub fn finish_order(&mut self) {
        self.cart.clear();
        self.overlay = None;
        self.view = View::Store;
    }

    // =========================================================================
    // Product editing
    // =========================================================================

    /// Open the editor for an existing product, or for a new one with `None`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthorized` without a session.
    pub fn open_product_editor(&mut self, product: Option<ProductId>) -> Result<(), ClientError> {
        self.require_session()?;

        let draft = product
            .and_then(|id| self.products.iter().find(|p| p.id == id))
            .map_or_else(|| ProductDraft::template(&self.categories), ProductDraft::edit);
        self.overlay = Some(Overlay::ProductEditor(draft));
        Ok(())
    }

    pub const fn product_draft_mut(&mut self) -> Option<&mut ProductDraft> {
        match &mut self.overlay {
            Some(Overlay::ProductEditor(draft)) => Some(draft),
            _ => None,
        }
    }

    /// Save the draft (update with an id, create without) and reload the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthorized` without a session,
    /// `ClientError::NotOpen` without an editor, or the API error.
    pub async fn save_product(&mut self) -> Result<(), ClientError> {
        let session = self.require_session()?;
        let Some(Overlay::ProductEditor(draft)) = self.overlay.clone() else {
            return Err(ClientError::NotOpen("product editor"));
        };

        let saved = match draft.id {
            Some(id) => self.api.update_product(session.token(), id, &draft.input).await,
            None => self
                .api
                .create_product(session.token(), &draft.input)
                .await
                .map(|_| ()),
        };
        if let Err(e) = saved {
            return Err(self.report(e));
        }

        self.overlay = None;
        self.load_catalog().await
    }

    /// Delete a product and reload the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthorized` without a session, or the API error.
    pub async fn delete_product(&mut self, id: ProductId) -> Result<(), ClientError> {
        let session = self.require_session()?;
        if let Err(e) = self.api.delete_product(session.token(), id).await {
            return Err(self.report(e));
        }
        self.load_catalog().await
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn require_session(&self) -> Result<AdminSession, ClientError> {
        self.session.clone().ok_or(ClientError::NotAuthorized)
    }

    /// Leave `err` in the notice and hand it back.
    ///
    /// A token the server no longer accepts ends the session.
    fn report(&mut self, err: ClientError) -> ClientError {
        if matches!(err, ClientError::Api { status: 401, .. }) && self.session.is_some() {
            warn!("Admin session rejected by server");
            self.session = None;
            if self.view.is_admin() {
                self.view = View::Store;
            }
            self.open_admin_login();
        }
        self.notice = Some(err.to_string());
        err
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use secrecy::{ExposeSecret, SecretString};

    use partfruit_core::api::PaymentSessionResponse;
    use partfruit_core::{NewOrder, Price, ProductInput};

    use super::*;
    use crate::cart::tests::product;
    use crate::error::CheckoutError;
    use crate::platform::Position;

    const TOKEN: &str = "test-token";

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        orders: Mutex<Vec<(NewOrder, String)>>,
        fail_orders: bool,
    }

    impl FakeApi {
        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn check_token(token: &SecretString) -> Result<(), ClientError> {
            if token.expose_secret() == TOKEN {
                Ok(())
            } else {
                Err(ClientError::Api {
                    status: 401,
                    message: "invalid or expired admin token".to_string(),
                })
            }
        }
    }

    #[async_trait]
    impl StoreApi for FakeApi {
        async fn categories(&self) -> Result<Vec<Category>, ClientError> {
            self.record("categories");
            Ok(vec![Category {
                id: CategoryId::new(1),
                name: "میوه".to_string(),
            }])
        }

        async fn products(&self) -> Result<Vec<Product>, ClientError> {
            self.record("products");
            Ok(vec![product(1, "سیب", 1.5), product(2, "موز", 0.5)])
        }

        async fn login(&self, username: &str, password: &str) -> Result<SecretString, ClientError> {
            self.record("login");
            if username == "admin" && password == "partfruit2024" {
                Ok(SecretString::from(TOKEN))
            } else {
                Err(ClientError::Api {
                    status: 401,
                    message: "نام کاربری یا رمز عبور اشتباه است".to_string(),
                })
            }
        }

        async fn logout(&self, _token: &SecretString) -> Result<(), ClientError> {
            self.record("logout");
            Ok(())
        }

        async fn request_verification_code(&self, _phone: &str) -> Result<String, ClientError> {
            self.record("whatsapp-code");
            Ok("کد تایید به واتساپ شما ارسال شد (کد تستی: 1234)".to_string())
        }

        async fn create_payment_session(
            &self,
            provider: &str,
            _amount: Price,
        ) -> Result<PaymentSessionResponse, ClientError> {
            self.record(&format!("payment-session:{provider}"));
            Ok(PaymentSessionResponse {
                success: true,
                session_id: "thawani_abc".to_string(),
                checkout_url: "https://checkout.thawani.om/pay/mock_session".to_string(),
            })
        }

        async fn create_order(
            &self,
            order: &NewOrder,
            idempotency_key: &str,
        ) -> Result<OrderId, ClientError> {
            self.record("create-order");
            if self.fail_orders {
                return Err(ClientError::Api {
                    status: 500,
                    message: "Internal server error".to_string(),
                });
            }
            let mut orders = self.orders.lock().unwrap();
            if let Some(index) = orders.iter().position(|(_, key)| key == idempotency_key) {
                return Ok(OrderId::new(i64::try_from(index).unwrap() + 1));
            }
            orders.push((order.clone(), idempotency_key.to_string()));
            Ok(OrderId::new(i64::try_from(orders.len()).unwrap()))
        }

        async fn orders(&self, token: &SecretString) -> Result<Vec<Order>, ClientError> {
            self.record("orders");
            Self::check_token(token)?;
            Ok(Vec::new())
        }

        async fn create_product(
            &self,
            token: &SecretString,
            _input: &ProductInput,
        ) -> Result<ProductId, ClientError> {
            self.record("create-product");
            Self::check_token(token)?;
            Ok(ProductId::new(11))
        }

        async fn update_product(
            &self,
            token: &SecretString,
            id: ProductId,
            _input: &ProductInput,
        ) -> Result<(), ClientError> {
            self.record(&format!("update-product:{id}"));
            Self::check_token(token)
        }

        async fn delete_product(&self, token: &SecretString, id: ProductId) -> Result<(), ClientError> {
            self.record(&format!("delete-product:{id}"));
            Self::check_token(token)
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        position: Option<Position>,
        opened: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Platform for FakePlatform {
        async fn current_position(&self) -> Result<Position, ClientError> {
            self.position
                .ok_or_else(|| ClientError::Platform("denied".to_string()))
        }

        async fn read_data_url(&self, _path: &Path) -> Result<String, ClientError> {
            Ok("data:image/png;base64,cmVjZWlwdA==".to_string())
        }

        async fn open_url(&self, url: &str) -> Result<(), ClientError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    async fn app() -> App<FakeApi, FakePlatform> {
        let mut app = App::new(FakeApi::default(), FakePlatform::default(), ClientConfig::default());
        app.load_catalog().await.unwrap();
        app
    }

    async fn admin_app() -> App<FakeApi, FakePlatform> {
        let mut app = App::with_session(
            FakeApi::default(),
            FakePlatform::default(),
            ClientConfig::default(),
            AdminSession::new(SecretString::from(TOKEN)),
        );
        app.load_catalog().await.unwrap();
        app
    }

    fn fill_checkout(app: &mut App<FakeApi, FakePlatform>, method: PaymentMethod) {
        let form = app.checkout_form_mut().unwrap();
        form.phone = "96890000000".to_string();
        form.address = "مسقط".to_string();
        form.payment_method = method;
    }

    #[tokio::test]
    async fn test_admin_views_require_session() {
        let mut app = app().await;
        app.navigate(View::AdminOrders).await;

        assert_eq!(app.view(), View::Store);
        assert!(matches!(app.overlay(), Some(Overlay::AdminLogin(_))));
        assert!(!app.api.calls().contains(&"orders".to_string()));
    }

    #[tokio::test]
    async fn test_login_failure_keeps_form_open_with_message() {
        let mut app = app().await;
        app.open_admin_login();
        let form = app.login_form_mut().unwrap();
        form.username = "admin".to_string();
        form.password = "wrong".to_string();

        assert!(app.submit_admin_login().await.is_err());
        let Some(Overlay::AdminLogin(form)) = app.overlay() else {
            panic!("login form closed");
        };
        assert_eq!(form.error.as_deref(), Some("نام کاربری یا رمز عبور اشتباه است"));
        assert!(!app.is_admin());
    }

    #[tokio::test]
    async fn test_login_then_admin_orders() {
        let mut app = app().await;
        app.open_admin_login();
        let form = app.login_form_mut().unwrap();
        form.username = "admin".to_string();
        form.password = "partfruit2024".to_string();

        app.submit_admin_login().await.unwrap();
        assert!(app.is_admin());
        assert!(app.overlay().is_none());

        app.navigate(View::AdminOrders).await;
        assert_eq!(app.view(), View::AdminOrders);
        assert!(app.api.calls().contains(&"orders".to_string()));

        app.logout().await;
        assert!(!app.is_admin());
        assert_eq!(app.view(), View::Store);
    }

    #[tokio::test]
    async fn test_rejected_token_ends_session() {
        let mut app = App::with_session(
            FakeApi::default(),
            FakePlatform::default(),
            ClientConfig::default(),
            AdminSession::new(SecretString::from("stale")),
        );
        app.navigate(View::AdminOrders).await;

        assert!(!app.is_admin());
        assert_eq!(app.view(), View::Store);
        assert!(matches!(app.overlay(), Some(Overlay::AdminLogin(_))));
    }

    #[tokio::test]
    async fn test_filtering_over_loaded_catalog() {
        let mut app = app().await;
        app.set_search("سیب");
        assert_eq!(app.visible_products().len(), 1);
        app.set_search("");
        app.select_category(Some(CategoryId::new(9)));
        assert!(app.visible_products().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_does_not_open() {
        let mut app = app().await;
        app.open_checkout();
        assert!(app.overlay().is_none());
    }

    #[tokio::test]
    async fn test_manual_transfer_without_receipt_sends_nothing() {
        let mut app = app().await;
        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::ManualTransfer);
        let before = app.api.calls().len();

        let result = app.submit_checkout().await;

        assert!(matches!(
            result,
            Err(ClientError::Validation(CheckoutError::MissingReceipt))
        ));
        assert_eq!(app.api.calls().len(), before);
        assert_eq!(app.notice(), Some("لطفا تصویر رسید واریز را آپلود کنید"));
        assert!(matches!(app.overlay(), Some(Overlay::Checkout(_))));
    }

    #[tokio::test]
    async fn test_wrong_code_after_request_blocks_submit() {
        let mut app = app().await;
        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::CashOnDelivery);

        app.request_verification_code().await.unwrap();
        app.checkout_form_mut().unwrap().code = "0000".to_string();

        assert!(matches!(
            app.submit_checkout().await,
            Err(ClientError::Validation(CheckoutError::WrongCode))
        ));
        app.checkout_form_mut().unwrap().code = "1234".to_string();
        app.submit_checkout().await.unwrap();
    }

    #[tokio::test]
    async fn test_cash_on_delivery_opens_whatsapp_and_completes() {
        let mut app = app().await;
        app.add_to_cart(ProductId::new(1));
        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::CashOnDelivery);
        app.capture_location().await;
        assert!(app.take_notice().is_some());

        let outcome = app.submit_checkout().await.unwrap();
        let CheckoutOutcome::Completed { order_id, whatsapp_url } = outcome else {
            panic!("expected completion");
        };
        assert!(whatsapp_url.starts_with("https://wa.me/96800000000?text="));
        assert_eq!(app.platform.opened.lock().unwrap().as_slice(), [whatsapp_url]);
        assert_eq!(app.overlay(), Some(&Overlay::OrderComplete { order_id }));

        let (order, _) = app.api.orders.lock().unwrap()[0].clone();
        assert_eq!(order.total_price, Price::from_f64(3.0).unwrap());
        assert_eq!(order.latitude, None);

        app.finish_order();
        assert!(app.cart().is_empty());
        assert_eq!(app.view(), View::Store);
    }

    #[tokio::test]
    async fn test_hosted_checkout_redirects() {
        let mut app = app().await;
        app.add_to_cart(ProductId::new(2));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::HostedCheckout);

        let outcome = app.submit_checkout().await.unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Redirected { .. }));
        let calls = app.api.calls();
        assert_eq!(
            &calls[calls.len() - 2..],
            ["payment-session:thawani", "create-order"]
        );
        assert_eq!(
            app.platform.opened.lock().unwrap().as_slice(),
            ["https://checkout.thawani.om/pay/mock_session"]
        );
    }

    #[tokio::test]
    async fn test_receipt_and_location_reach_the_order() {
        let mut app = App::new(
            FakeApi::default(),
            FakePlatform {
                position: Some(Position {
                    latitude: 23.6,
                    longitude: 58.4,
                }),
                ..FakePlatform::default()
            },
            ClientConfig::default(),
        );
        app.load_catalog().await.unwrap();
        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::ManualTransfer);
        app.capture_location().await;
        app.attach_receipt(Path::new("receipt.png")).await.unwrap();

        app.submit_checkout().await.unwrap();

        let (order, _) = app.api.orders.lock().unwrap()[0].clone();
        assert_eq!(order.latitude, Some(23.6));
        assert_eq!(order.receipt_image.as_deref(), Some("data:image/png;base64,cmVjZWlwdA=="));
    }

    #[tokio::test]
    async fn test_network_failure_keeps_form_open() {
        let mut app = App::new(
            FakeApi {
                fail_orders: true,
                ..FakeApi::default()
            },
            FakePlatform::default(),
            ClientConfig::default(),
        );
        app.load_catalog().await.unwrap();
        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::CashOnDelivery);

        assert!(app.submit_checkout().await.is_err());
        assert!(matches!(app.overlay(), Some(Overlay::Checkout(_))));
        assert_eq!(app.notice(), Some("Internal server error"));
        assert!(app.platform.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edited_form_after_failure_gets_new_key() {
        let mut app = App::new(
            FakeApi {
                fail_orders: true,
                ..FakeApi::default()
            },
            FakePlatform::default(),
            ClientConfig::default(),
        );
        app.load_catalog().await.unwrap();
        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::CashOnDelivery);
        let key = |app: &mut App<FakeApi, FakePlatform>| {
            app.checkout_form_mut().unwrap().idempotency_key().to_owned()
        };

        assert!(app.submit_checkout().await.is_err());
        let first = key(&mut app);
        assert!(app.submit_checkout().await.is_err());
        assert_eq!(key(&mut app), first);

        app.checkout_form_mut().unwrap().address = "صلالة".to_string();
        assert!(app.submit_checkout().await.is_err());
        assert_ne!(key(&mut app), first);
    }

    #[tokio::test]
    async fn test_transfer_instructions_follow_payment_method() {
        let mut app = app().await;
        assert_eq!(app.transfer_instructions(), None);

        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::CashOnDelivery);
        assert_eq!(app.transfer_instructions(), None);

        app.checkout_form_mut().unwrap().payment_method = PaymentMethod::ManualTransfer;
        let instructions = app.transfer_instructions().unwrap();
        assert!(instructions.contains(&app.config().transfer_number));
    }

    #[tokio::test]
    async fn test_resubmitting_a_form_reuses_its_key() {
        let mut app = app().await;
        app.add_to_cart(ProductId::new(1));
        app.open_checkout();
        fill_checkout(&mut app, PaymentMethod::CashOnDelivery);
        let form = app.checkout_form_mut().unwrap().clone();

        let first = app.submit_checkout().await.unwrap();
        app.overlay = Some(Overlay::Checkout(form));
        let second = app.submit_checkout().await.unwrap();

        let id = |outcome: CheckoutOutcome| match outcome {
            CheckoutOutcome::Completed { order_id, .. }
            | CheckoutOutcome::Redirected { order_id, .. } => order_id,
        };
        assert_eq!(id(first), id(second));
        assert_eq!(app.api.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_product_editor_saves_and_refetches() {
        let mut app = admin_app().await;

        app.open_product_editor(Some(ProductId::new(2))).unwrap();
        app.product_draft_mut().unwrap().input.price = Some(Price::from_f64(0.6).unwrap());
        app.save_product().await.unwrap();

        app.open_product_editor(None).unwrap();
        app.product_draft_mut().unwrap().input.name = "انبه".to_string();
        app.save_product().await.unwrap();

        app.delete_product(ProductId::new(2)).await.unwrap();

        let calls = app.api.calls();
        let writes: Vec<_> = calls
            .iter()
            .filter(|c| c.contains("product:") || c.as_str() == "create-product")
            .cloned()
            .collect();
        assert_eq!(writes, ["update-product:2", "create-product", "delete-product:2"]);
        // initial load plus one reload per write
        assert_eq!(calls.iter().filter(|c| c.as_str() == "products").count(), 4);
        assert!(app.overlay().is_none());
    }

    #[tokio::test]
    async fn test_product_editor_requires_session() {
        let mut app = app().await;
        assert!(matches!(
            app.open_product_editor(None),
            Err(ClientError::NotAuthorized)
        ));
    }
}
