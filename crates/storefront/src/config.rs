//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Server
//! - `STOREFRONT_DATABASE_URL` - `SQLite` URL (default: `sqlite://partfruit.db?mode=rwc`,
//!   falls back to `DATABASE_URL`)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BLOB_DIR` - Directory for uploaded images (default: `data/blobs`)
//! - `STOREFRONT_ADMIN_SESSION_TTL_SECS` - Admin token lifetime (default: 43200)
//! - `STOREFRONT_AUTO_MIGRATE` - Migrate and seed on start-up (default: true)
//! - `STOREFRONT_SEED_FILE` - YAML seed catalog replacing the embedded one
//! - `STOREFRONT_ORDER_TOTAL_POLICY` - `trust`, `flag` or `reject` (default: flag)
//!
//! ## Payment provider (hosted checkout)
//! - `THAWANI_API_KEY` - Secret key; when unset a mock provider is used
//! - `THAWANI_PUBLISHABLE_KEY` - Publishable key appended to the pay URL
//! - `THAWANI_BASE_URL` - Provider base URL (default: `https://uatcheckout.thawani.om`)
//! - `THAWANI_SUCCESS_URL` / `THAWANI_CANCEL_URL` - Return URLs after payment
//!
//! ## Messaging provider (verification codes)
//! - `WHATSAPP_API_URL` - Send endpoint; when unset codes are only logged
//! - `WHATSAPP_API_TOKEN` - Bearer token for the send endpoint
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://partfruit.db?mode=rwc";
const DEFAULT_SESSION_TTL_SECS: u64 = 12 * 60 * 60;
const DEFAULT_THAWANI_BASE_URL: &str = "https://uatcheckout.thawani.om";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// How the server treats an order whose client-computed total disagrees
/// with the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderTotalPolicy {
    /// Store the client total without checking.
    Trust,
    /// Store the client total, record the catalog total and log a warning.
    #[default]
    Flag,
    /// Refuse the order.
    Reject,
}

impl FromStr for OrderTotalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "flag" => Ok(Self::Flag),
            "reject" => Ok(Self::Reject),
            other => Err(format!("expected trust, flag or reject (got {other})")),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `SQLite` connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding content-addressed uploads
    pub blob_dir: PathBuf,
    /// Lifetime of an admin bearer token
    pub admin_session_ttl: Duration,
    /// Run migrations and seeding on start-up
    pub auto_migrate: bool,
    /// Seed catalog overriding the embedded one
    pub seed_file: Option<PathBuf>,
    /// Order total trust boundary
    pub order_total_policy: OrderTotalPolicy,
    /// Hosted-checkout provider; mock when `None`
    pub thawani: Option<ThawaniConfig>,
    /// Messaging provider; log-only when `None`
    pub whatsapp: Option<WhatsAppConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Thawani hosted-checkout configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct ThawaniConfig {
    pub api_key: SecretString,
    pub publishable_key: String,
    pub base_url: Url,
    pub success_url: String,
    pub cancel_url: String,
}

impl std::fmt::Debug for ThawaniConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThawaniConfig")
            .field("api_key", &"[REDACTED]")
            .field("publishable_key", &self.publishable_key)
            .field("base_url", &self.base_url.as_str())
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .finish()
    }
}

/// WhatsApp messaging API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct WhatsAppConfig {
    pub api_url: Url,
    pub api_token: SecretString,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is missing or cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL");
        let host = get_parsed_or_default("STOREFRONT_HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?;
        let port = get_parsed_or_default("STOREFRONT_PORT", 3000_u16)?;
        let blob_dir = PathBuf::from(get_env_or_default("STOREFRONT_BLOB_DIR", "data/blobs"));
        let ttl_secs =
            get_parsed_or_default("STOREFRONT_ADMIN_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let auto_migrate = get_parsed_or_default("STOREFRONT_AUTO_MIGRATE", true)?;
        let seed_file = get_optional_env("STOREFRONT_SEED_FILE").map(PathBuf::from);
        let order_total_policy =
            get_parsed_or_default("STOREFRONT_ORDER_TOTAL_POLICY", OrderTotalPolicy::default())?;

        let thawani = ThawaniConfig::from_env()?;
        let whatsapp = WhatsAppConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            blob_dir,
            admin_session_ttl: Duration::from_secs(ttl_secs),
            auto_migrate,
            seed_file,
            order_total_policy,
            thawani,
            whatsapp,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_parsed_or_default("SENTRY_SAMPLE_RATE", 1.0_f32)?,
            sentry_traces_sample_rate: get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", 0.1_f32)?,
        })
    }

    /// Configuration with every optional setting at its default.
    ///
    /// Used by the CLI and by tests that build the server in-process.
    #[must_use]
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: SecretString::from(database_url.into()),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            blob_dir: PathBuf::from("data/blobs"),
            admin_session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            auto_migrate: true,
            seed_file: None,
            order_total_policy: OrderTotalPolicy::default(),
            thawani: None,
            whatsapp: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ThawaniConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("THAWANI_API_KEY") else {
            return Ok(None);
        };

        let base_url = get_env_or_default("THAWANI_BASE_URL", DEFAULT_THAWANI_BASE_URL);
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("THAWANI_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            publishable_key: get_required_env("THAWANI_PUBLISHABLE_KEY")?,
            base_url,
            success_url: get_env_or_default(
                "THAWANI_SUCCESS_URL",
                "http://localhost:3000/?payment=success",
            ),
            cancel_url: get_env_or_default(
                "THAWANI_CANCEL_URL",
                "http://localhost:3000/?payment=cancelled",
            ),
        }))
    }
}

impl WhatsAppConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_url) = get_optional_env("WHATSAPP_API_URL") else {
            return Ok(None);
        };

        let api_url = Url::parse(&api_url).map_err(|e| {
            ConfigError::InvalidEnvVar("WHATSAPP_API_URL".to_string(), e.to_string())
        })?;

        Ok(Some(Self {
            api_url,
            api_token: SecretString::from(get_required_env("WHATSAPP_API_TOKEN")?),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`, then the local file.
fn get_database_url(primary_key: &str) -> SecretString {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_or_else(|_| SecretString::from(DEFAULT_DATABASE_URL), SecretString::from)
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(value) => parse_value(key, &value),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
