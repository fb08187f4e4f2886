//! Admin session route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use partfruit_core::api::{Ack, LoginRequest, LoginResponse};

use super::ApiJson;
use crate::error::{Result, clear_sentry_user};
use crate::middleware::RequireAdmin;
use crate::services::auth::AdminAuthService;
use crate::state::AppState;

/// Exchange admin credentials for a bearer token.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let token = AdminAuthService::new(state.pool(), state.sessions())
        .login(&body.username, &body.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        token,
    }))
}

/// Revoke the token the request was made with.
#[instrument(skip_all, fields(admin = %admin.session.username))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Json<Ack> {
    AdminAuthService::new(state.pool(), state.sessions())
        .logout(&admin.token)
        .await;
    clear_sentry_user();

    Json(Ack::OK)
}
