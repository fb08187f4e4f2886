//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `PARTFRUIT_API_URL` - Storefront base URL (default `http://localhost:3000`)
//! - `PARTFRUIT_WHATSAPP_NUMBER` - Shop number orders are sent to (default `96800000000`)
//! - `PARTFRUIT_TRANSFER_NUMBER` - Number manual transfers are paid to (default `96812345678`)
//! - `PARTFRUIT_VERIFICATION_CODE` - Code the customer must type back (default `1234`)
//! - `PARTFRUIT_LATITUDE` / `PARTFRUIT_LONGITUDE` - Fixed device position, if any

use thiserror::Error;
use url::Url;

use crate::platform::Position;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_WHATSAPP_NUMBER: &str = "96800000000";
const DEFAULT_TRANSFER_NUMBER: &str = "96812345678";
const DEFAULT_VERIFICATION_CODE: &str = "1234";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Storefront base URL; API paths are resolved under `/api/`
    pub api_url: Url,
    /// Shop WhatsApp number used in the order deep link
    pub whatsapp_number: String,
    /// Number shown in the manual-transfer instructions
    pub transfer_number: String,
    /// Code a customer must enter after requesting one
    pub verification_code: String,
    /// Position reported by the native platform
    pub position: Option<Position>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_owned(),
            transfer_number: DEFAULT_TRANSFER_NUMBER.to_owned(),
            verification_code: DEFAULT_VERIFICATION_CODE.to_owned(),
            position: None,
        }
    }
}

impl ClientConfig {
    /// Client configuration pointing at `api_url`, all else default.
    #[must_use]
    pub fn with_api_url(api_url: Url) -> Self {
        Self {
            api_url,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let api_url = match get_optional_env("PARTFRUIT_API_URL") {
            Some(raw) => Url::parse(&raw)
                .map_err(|e| ConfigError::InvalidEnvVar("PARTFRUIT_API_URL".to_string(), e.to_string()))?,
            None => defaults.api_url,
        };

        let latitude = get_parsed_env::<f64>("PARTFRUIT_LATITUDE")?;
        let longitude = get_parsed_env::<f64>("PARTFRUIT_LONGITUDE")?;
        let position = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Position {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(Self {
            api_url,
            whatsapp_number: get_optional_env("PARTFRUIT_WHATSAPP_NUMBER")
                .unwrap_or(defaults.whatsapp_number),
            transfer_number: get_optional_env("PARTFRUIT_TRANSFER_NUMBER")
                .unwrap_or(defaults.transfer_number),
            verification_code: get_optional_env("PARTFRUIT_VERIFICATION_CODE")
                .unwrap_or(defaults.verification_code),
            position,
        })
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_parsed_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key)
        .map(|raw| parse_value(key, &raw))
        .transpose()
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
