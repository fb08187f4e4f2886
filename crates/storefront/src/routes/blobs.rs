//! Upload serving.

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
};

use super::ApiPath;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Serve a stored blob with its recorded content type.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(hash): ApiPath<String>,
) -> Result<impl IntoResponse> {
    let blob = state
        .blobs()
        .load(&hash)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("blob {hash}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_owned()),
        ],
        blob.bytes,
    ))
}
