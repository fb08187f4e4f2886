//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::StorefrontConfig;
use crate::services::GatewayError;
use crate::services::auth::AdminSessions;
use crate::services::blobs::BlobStore;
use crate::services::messaging::{HttpMessagingGateway, LogMessagingGateway, MessagingGateway};
use crate::services::payments::{CheckoutGateway, MockCheckoutGateway, ThawaniGateway};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: SqlitePool,
    sessions: AdminSessions,
    blobs: BlobStore,
    messaging: Arc<dyn MessagingGateway>,
    checkout: HashMap<String, Arc<dyn CheckoutGateway>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Real provider gateways are used when configured, otherwise the
    /// log-only messaging gateway and the mock checkout gateway.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `SQLite` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if a provider HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: SqlitePool) -> Result<Self, GatewayError> {
        let messaging: Arc<dyn MessagingGateway> = match &config.whatsapp {
            Some(whatsapp) => Arc::new(HttpMessagingGateway::new(whatsapp)?),
            None => Arc::new(LogMessagingGateway),
        };

        let checkout: Arc<dyn CheckoutGateway> = match &config.thawani {
            Some(thawani) => Arc::new(ThawaniGateway::new(thawani)?),
            None => Arc::new(MockCheckoutGateway::default()),
        };

        Ok(Self::with_gateways(config, pool, messaging, vec![checkout]))
    }

    /// Create application state with explicit gateways.
    #[must_use]
    pub fn with_gateways(
        config: StorefrontConfig,
        pool: SqlitePool,
        messaging: Arc<dyn MessagingGateway>,
        checkout: Vec<Arc<dyn CheckoutGateway>>,
    ) -> Self {
        let sessions = AdminSessions::new(config.admin_session_ttl);
        let blobs = BlobStore::new(config.blob_dir.clone());
        let checkout = checkout
            .into_iter()
            .map(|gateway| (gateway.provider().to_owned(), gateway))
            .collect();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions,
                blobs,
                messaging,
                checkout,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the live admin sessions.
    #[must_use]
    pub fn sessions(&self) -> &AdminSessions {
        &self.inner.sessions
    }

    /// Get a reference to the upload store.
    #[must_use]
    pub fn blobs(&self) -> &BlobStore {
        &self.inner.blobs
    }

    /// Get the messaging gateway.
    #[must_use]
    pub fn messaging(&self) -> &dyn MessagingGateway {
        self.inner.messaging.as_ref()
    }

    /// Get the checkout gateway registered under `provider`.
    #[must_use]
    pub fn checkout(&self, provider: &str) -> Option<&dyn CheckoutGateway> {
        self.inner.checkout.get(provider).map(Arc::as_ref)
    }
}
