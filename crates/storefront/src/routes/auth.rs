//! Customer verification route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use partfruit_core::api::{VerificationCodeRequest, VerificationCodeResponse};

use super::ApiJson;
use crate::error::Result;
use crate::services::messaging::{VERIFICATION_CODE, code_sent_notice, verification_message};
use crate::state::AppState;

/// Send the verification code to the customer's WhatsApp number.
///
/// Every customer receives the same fixed code; the client compares it.
#[instrument(skip(state, body), fields(phone = %body.phone))]
pub async fn whatsapp_code(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<VerificationCodeRequest>,
) -> Result<Json<VerificationCodeResponse>> {
    state
        .messaging()
        .send(&body.phone, &verification_message(VERIFICATION_CODE))
        .await?;

    Ok(Json(VerificationCodeResponse {
        success: true,
        message: code_sent_notice(VERIFICATION_CODE),
    }))
}
