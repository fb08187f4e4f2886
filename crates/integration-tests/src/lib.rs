//! Integration tests for Part Fruit.
//!
//! Every [`TestContext`] runs a complete storefront in-process: a private
//! in-memory database with the seed catalog, a temporary blob directory and
//! the real router listening on an ephemeral port.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p partfruit-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_api` - HTTP contract of the storefront
//! - `client_app` - Client view-state machine against a live server
//!
//! The login and verification-code endpoints are rate limited per client
//! address. A test that needs many calls should use its own context.

use std::net::SocketAddr;

use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use url::Url;

use partfruit_client::HttpStoreApi;
use partfruit_core::api::LoginResponse;
use partfruit_storefront::config::{OrderTotalPolicy, StorefrontConfig};
use partfruit_storefront::db::{self, seed::SeedCatalog};
use partfruit_storefront::routes;
use partfruit_storefront::state::AppState;

/// Seeded admin credentials.
pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "partfruit2024";

/// A running storefront and a client pointed at it.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: Url,
    pub pool: SqlitePool,
    _blob_dir: TempDir,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Storefront with the default order total policy.
    pub async fn new() -> Self {
        Self::with_policy(OrderTotalPolicy::default()).await
    }

    /// Storefront applying `policy` to submitted order totals.
    ///
    /// # Panics
    ///
    /// Panics if the database, blob directory or listener cannot be set up.
    pub async fn with_policy(policy: OrderTotalPolicy) -> Self {
        let pool = db::create_memory_pool()
            .await
            .expect("in-memory pool should open");
        db::migrate(&pool).await.expect("migrations should apply");
        let catalog = SeedCatalog::embedded().expect("embedded catalog should parse");
        db::seed::ensure_seeded(&pool, &catalog)
            .await
            .expect("seeding should succeed");

        let blob_dir = tempfile::tempdir().expect("temp dir should be created");
        let mut config = StorefrontConfig::with_database_url("sqlite::memory:");
        config.blob_dir = blob_dir.path().to_path_buf();
        config.order_total_policy = policy;

        let state = AppState::new(config, pool.clone()).expect("state should build");
        let app = routes::router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("listener has an address");

        let server = tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Self {
            client: reqwest::Client::new(),
            base_url: Url::parse(&format!("http://{addr}")).expect("valid server URL"),
            pool,
            _blob_dir: blob_dir,
            server,
        }
    }

    /// Absolute URL of `path` (with leading slash) on the test server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Typed client for the test server.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn api(&self) -> HttpStoreApi {
        HttpStoreApi::new(self.base_url.clone()).expect("client should build")
    }

    /// Log in as the seeded admin and return the bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the login is refused.
    pub async fn admin_token(&self) -> String {
        let response = self
            .client
            .post(self.url("/api/admin/login"))
            .json(&serde_json::json!({
                "username": ADMIN_USERNAME,
                "password": ADMIN_PASSWORD,
            }))
            .send()
            .await
            .expect("login request should be sent");
        assert_eq!(response.status(), 200, "seeded admin should log in");

        let body: LoginResponse = response.json().await.expect("login body should parse");
        body.token
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}
