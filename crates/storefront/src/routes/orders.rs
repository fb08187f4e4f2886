//! Order route handlers.

use axum::{Json, extract::State, http::HeaderMap};
use tracing::instrument;

use partfruit_core::api::OrderCreated;
use partfruit_core::{NewOrder, Order};

use super::ApiJson;
use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Header carrying the client's per-checkout idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Place an order.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<Json<OrderCreated>> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty());

    let order_id = OrderService::new(
        state.pool(),
        state.blobs(),
        state.config().order_total_policy,
    )
    .place(order, idempotency_key)
    .await?;

    Ok(Json(OrderCreated {
        success: true,
        order_id,
    }))
}

/// All orders, newest first.
#[instrument(skip_all, fields(admin = %admin.session.username))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_orders().await?;
    Ok(Json(orders))
}
