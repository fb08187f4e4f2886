//! Content-addressed storage for uploaded images.
//!
//! Clients send images inline as `data:` URLs. Before anything is persisted
//! the payload is decoded, written once under the hex SHA-256 of its bytes,
//! and replaced by a `/api/blobs/<hash>` reference. The content type is kept
//! in a sidecar file next to the bytes. Both files are written to a temporary
//! name and renamed into place, bytes last, so a blob is only visible once
//! it is complete.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Path prefix under which stored blobs are served.
pub const BLOB_URL_PREFIX: &str = "/api/blobs/";

const CONTENT_TYPE_SUFFIX: &str = ".type";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors that can occur while storing or loading blobs.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Value starts with `data:` but is not a base64 data URL.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// Payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Filesystem error.
    #[error("blob storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Blob store rooted at a directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Replace an inline `data:` URL with a blob reference.
    ///
    /// Any other value (an external URL, a previous blob reference, an empty
    /// string) is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `BlobError` if the data URL is malformed or cannot be written.
    pub async fn resolve_image(&self, value: &str) -> Result<String, BlobError> {
        if value.starts_with("data:") {
            self.store_data_url(value).await
        } else {
            Ok(value.to_owned())
        }
    }

    /// Store the payload of a `data:` URL and return its reference.
    ///
    /// # Errors
    ///
    /// Returns `BlobError` if the data URL is malformed or cannot be written.
    #[instrument(skip_all)]
    pub async fn store_data_url(&self, data_url: &str) -> Result<String, BlobError> {
        let (content_type, bytes) = parse_data_url(data_url)?;
        let hash = hex::encode(Sha256::digest(&bytes));

        let path = self.dir.join(&hash);
        if tokio::fs::try_exists(&path).await? {
            debug!(%hash, "Blob already stored");
        } else {
            tokio::fs::create_dir_all(&self.dir).await?;
            write_atomic(&self.type_path(&hash), content_type.as_bytes()).await?;
            write_atomic(&path, &bytes).await?;
            debug!(%hash, size = bytes.len(), %content_type, "Stored blob");
        }

        Ok(format!("{BLOB_URL_PREFIX}{hash}"))
    }

    /// Load a blob by hash. Anything that is not a 64-character hex digest
    /// is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `BlobError::Io` if the blob exists but cannot be read.
    pub async fn load(&self, hash: &str) -> Result<Option<Blob>, BlobError> {
        if !is_hash(hash) {
            return Ok(None);
        }

        let bytes = match tokio::fs::read(self.dir.join(hash)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = match tokio::fs::read_to_string(self.type_path(hash)).await {
            Ok(content_type) => content_type,
            Err(e) if e.kind() == ErrorKind::NotFound => FALLBACK_CONTENT_TYPE.to_owned(),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(Blob {
            content_type,
            bytes,
        }))
    }

    fn type_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{hash}{CONTENT_TYPE_SUFFIX}"))
    }
}

/// Write `bytes` to a temporary sibling of `path`, then rename it over `path`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BlobError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn is_hash(value: &str) -> bool {
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Split `data:<type>;base64,<payload>` into content type and decoded bytes.
fn parse_data_url(data_url: &str) -> Result<(String, Vec<u8>), BlobError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| BlobError::InvalidDataUrl("missing data: prefix".to_owned()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| BlobError::InvalidDataUrl("missing payload separator".to_owned()))?;
    let content_type = meta
        .strip_suffix(";base64")
        .ok_or_else(|| BlobError::InvalidDataUrl("only base64 payloads are supported".to_owned()))?;

    let content_type = if content_type.is_empty() {
        FALLBACK_CONTENT_TYPE.to_owned()
    } else {
        content_type.to_owned()
    };
    let bytes = STANDARD.decode(payload.trim())?;

    Ok((content_type, bytes))
}
