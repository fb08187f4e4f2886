//! The client view-state machine driving a live storefront.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use partfruit_client::{
    App, CheckoutOutcome, ClientConfig, ClientError, HttpStoreApi, NativePlatform, Overlay,
    Platform, Position, View,
};
use partfruit_core::{PaymentMethod, Price, ProductId};
use partfruit_integration_tests::{ADMIN_PASSWORD, ADMIN_USERNAME, TestContext};

// 1x1 transparent PNG
const PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x04, 0x00, 0x00, 0x00, 0xb5,
    0x1c, 0x0c, 0x02, 0x00, 0x00, 0x00, 0x0b, 0x49, 0x44, 0x41, 0x54, 0x78, 0xda, 0x63, 0x64,
    0x60, 0x00, 0x00, 0x00, 0x06, 0x00, 0x02, 0x30, 0x81, 0xd0, 0x2f, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// Native file and position access; opened URLs are recorded instead of launched.
struct RecordingPlatform {
    native: NativePlatform,
    opened: Mutex<Vec<String>>,
}

impl RecordingPlatform {
    fn new(position: Option<Position>) -> Self {
        Self {
            native: NativePlatform::new(position),
            opened: Mutex::new(Vec::new()),
        }
    }

    fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn current_position(&self) -> Result<Position, ClientError> {
        self.native.current_position().await
    }

    async fn read_data_url(&self, path: &Path) -> Result<String, ClientError> {
        self.native.read_data_url(path).await
    }

    async fn open_url(&self, url: &str) -> Result<(), ClientError> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

type TestApp = App<HttpStoreApi, RecordingPlatform>;

async fn app(ctx: &TestContext, position: Option<Position>) -> TestApp {
    let config = ClientConfig::with_api_url(ctx.base_url.clone());
    let mut app = App::new(ctx.api(), RecordingPlatform::new(position), config);
    app.load_catalog().await.unwrap();
    app
}

async fn log_in(app: &mut TestApp) {
    app.open_admin_login();
    let form = app.login_form_mut().unwrap();
    form.username = ADMIN_USERNAME.to_string();
    form.password = ADMIN_PASSWORD.to_string();
    app.submit_admin_login().await.unwrap();
}

// =============================================================================
// Shopping
// =============================================================================

#[tokio::test]
async fn test_cash_on_delivery_checkout() {
    let ctx = TestContext::new().await;
    let mut app = app(
        &ctx,
        Some(Position {
            latitude: 23.588,
            longitude: 58.3829,
        }),
    )
    .await;
    assert_eq!(app.products().len(), 10);

    let first = app.products()[0].clone();
    let second = app.products()[1].clone();
    app.add_to_cart(first.id);
    app.add_to_cart(first.id);
    app.add_to_cart(second.id);
    app.navigate(View::Cart).await;

    app.open_checkout();
    app.checkout_form_mut().unwrap().phone = "96890000000".to_string();
    app.request_verification_code().await.unwrap();
    assert!(app.take_notice().unwrap().contains("1234"));
    let form = app.checkout_form_mut().unwrap();
    form.code = "1234".to_string();
    form.address = "مسقط، الخوير".to_string();
    app.capture_location().await;

    let outcome = app.submit_checkout().await.unwrap();
    let CheckoutOutcome::Completed {
        order_id,
        whatsapp_url,
    } = outcome
    else {
        panic!("expected WhatsApp hand-off");
    };
    assert!(whatsapp_url.starts_with("https://wa.me/96800000000?text="));
    assert_eq!(app.platform().opened(), vec![whatsapp_url]);

    app.finish_order();
    assert!(app.cart().is_empty());
    assert_eq!(app.view(), View::Store);

    log_in(&mut app).await;
    app.navigate(View::AdminOrders).await;
    let (order, label) = app.labelled_orders().next().unwrap();
    assert_eq!(label, "در محل");
    assert_eq!(order.id, order_id);
    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.items.len(), 2);
    assert_eq!(
        order.total_price,
        [first.price.times(2), second.price].into_iter().sum::<Price>()
    );
    assert!(!order.total_mismatch());
    assert_eq!(order.latitude, Some(23.588));
}

#[tokio::test]
async fn test_manual_transfer_with_receipt() {
    let ctx = TestContext::new().await;
    let mut app = app(&ctx, None).await;
    let dir = tempfile::tempdir().unwrap();
    let receipt = dir.path().join("receipt.png");
    std::fs::write(&receipt, PNG).unwrap();

    let id = app.products()[0].id;
    app.add_to_cart(id);
    app.open_checkout();
    let form = app.checkout_form_mut().unwrap();
    form.address = "صحار".to_string();
    form.payment_method = PaymentMethod::ManualTransfer;

    assert!(matches!(
        app.submit_checkout().await,
        Err(ClientError::Validation(_))
    ));

    app.capture_location().await;
    assert!(app.take_notice().is_some());
    app.attach_receipt(&receipt).await.unwrap();
    app.submit_checkout().await.unwrap();

    log_in(&mut app).await;
    app.navigate(View::AdminOrders).await;
    let receipt_ref = app.orders()[0].receipt_image.clone().unwrap();
    assert!(receipt_ref.starts_with("/api/blobs/"));

    let stored = ctx
        .client
        .get(ctx.url(&receipt_ref))
        .send()
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(stored.as_ref(), PNG);
}

#[tokio::test]
async fn test_hosted_checkout_redirects_to_provider() {
    let ctx = TestContext::new().await;
    let mut app = app(&ctx, None).await;

    app.add_to_cart(app.products()[0].id);
    app.open_checkout();
    let form = app.checkout_form_mut().unwrap();
    form.address = "نزوى".to_string();
    form.payment_method = PaymentMethod::HostedCheckout;

    let outcome = app.submit_checkout().await.unwrap();
    assert!(matches!(outcome, CheckoutOutcome::Redirected { .. }));
    assert_eq!(
        app.platform().opened(),
        vec!["https://checkout.thawani.om/pay/mock_session".to_string()]
    );
    assert!(app.overlay().is_none());
}

// =============================================================================
// Administration
// =============================================================================

#[tokio::test]
async fn test_wrong_password_stays_on_login_form() {
    let ctx = TestContext::new().await;
    let mut app = app(&ctx, None).await;

    app.navigate(View::Admin).await;
    let form = app.login_form_mut().unwrap();
    form.username = ADMIN_USERNAME.to_string();
    form.password = "guess".to_string();

    let err = app.submit_admin_login().await.unwrap_err();
    assert!(err.is_unauthorized());
    let Some(Overlay::AdminLogin(form)) = app.overlay() else {
        panic!("login form closed");
    };
    assert_eq!(
        form.error.as_deref(),
        Some("نام کاربری یا رمز عبور اشتباه است")
    );
    assert_eq!(app.view(), View::Store);
}

#[tokio::test]
async fn test_admin_edits_catalog() {
    let ctx = TestContext::new().await;
    let mut app = app(&ctx, None).await;
    log_in(&mut app).await;
    app.navigate(View::Admin).await;
    assert_eq!(app.view(), View::Admin);

    app.open_product_editor(None).unwrap();
    let draft = app.product_draft_mut().unwrap();
    draft.input.name = "انبه".to_string();
    draft.input.price = Some(Price::from_f64(2.75).unwrap());
    app.save_product().await.unwrap();
    assert_eq!(app.products().len(), 11);

    let mango = app
        .products()
        .iter()
        .find(|p| p.name == "انبه")
        .unwrap()
        .clone();
    assert_eq!(mango.category_name, app.categories()[0].name);

    app.open_product_editor(Some(mango.id)).unwrap();
    app.product_draft_mut().unwrap().input.price = Some(Price::from_f64(3.0).unwrap());
    app.save_product().await.unwrap();
    let updated = app.products().iter().find(|p| p.id == mango.id).unwrap();
    assert_eq!(updated.price, Price::from_f64(3.0).unwrap());

    app.delete_product(mango.id).await.unwrap();
    assert_eq!(app.products().len(), 10);

    app.logout().await;
    assert!(!app.is_admin());
    assert!(matches!(
        app.delete_product(ProductId::new(1)).await,
        Err(ClientError::NotAuthorized)
    ));
}
