//! Hosted-checkout route handlers.

use axum::{
    Json,
    extract::State,
};
use tracing::instrument;

use partfruit_core::api::{PaymentSessionRequest, PaymentSessionResponse};

use super::{ApiJson, ApiPath};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Open a checkout session with `provider` for the given amount.
#[instrument(skip(state, body), fields(amount = %body.amount))]
pub async fn create_session(
    State(state): State<AppState>,
    ApiPath(provider): ApiPath<String>,
    ApiJson(body): ApiJson<PaymentSessionRequest>,
) -> Result<Json<PaymentSessionResponse>> {
    let gateway = state
        .checkout(&provider)
        .ok_or_else(|| AppError::NotFound(format!("payment provider {provider}")))?;

    let session = gateway.create_session(body.amount).await?;

    Ok(Json(PaymentSessionResponse {
        success: true,
        session_id: session.session_id,
        checkout_url: session.checkout_url,
    }))
}
