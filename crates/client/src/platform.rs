//! Device capabilities the application depends on.
//!
//! The application never touches the device directly: geolocation, file
//! reads and URL opening go through a [`Platform`], so tests can substitute
//! a fake and other front ends can supply their own.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::ClientError;

/// A device position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Device capabilities used by the checkout flow.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Current device position.
    async fn current_position(&self) -> Result<Position, ClientError>;

    /// Read a file and encode it as a `data:` URL.
    async fn read_data_url(&self, path: &Path) -> Result<String, ClientError>;

    /// Hand a URL to the system (browser, messaging app).
    async fn open_url(&self, url: &str) -> Result<(), ClientError>;
}

/// Platform backed by the local filesystem.
///
/// Position comes from configuration; opened URLs are logged.
#[derive(Debug, Clone, Default)]
pub struct NativePlatform {
    position: Option<Position>,
}

impl NativePlatform {
    #[must_use]
    pub const fn new(position: Option<Position>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl Platform for NativePlatform {
    async fn current_position(&self) -> Result<Position, ClientError> {
        self.position
            .ok_or_else(|| ClientError::Platform("location unavailable".to_string()))
    }

    #[instrument(skip(self))]
    async fn read_data_url(&self, path: &Path) -> Result<String, ClientError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::Platform(format!("{}: {e}", path.display())))?;

        Ok(format!(
            "data:{};base64,{}",
            content_type_for(path),
            STANDARD.encode(bytes)
        ))
    }

    async fn open_url(&self, url: &str) -> Result<(), ClientError> {
        info!(url, "Open URL");
        Ok(())
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}
