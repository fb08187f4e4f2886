//! Category and product route handlers.
//!
//! Reads are public. Writes require an admin token and accept partial
//! bodies; missing fields are stored as NULL and read back with defaults.

use axum::{
    Json,
    extract::State,
};
use tracing::instrument;

use partfruit_core::api::{Ack, ProductCreated};
use partfruit_core::{Category, Product, ProductId, ProductInput};

use super::{ApiJson, ApiPath};
use crate::db::CatalogRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// All categories in id order.
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(categories))
}

/// All products whose category exists, with the category name.
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = CatalogRepository::new(state.pool()).list_products().await?;
    Ok(Json(products))
}

/// Create a product.
#[instrument(skip_all, fields(admin = %admin.session.username))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<ProductCreated>> {
    let input = store_inline_image(&state, input).await?;
    let id = CatalogRepository::new(state.pool())
        .create_product(&input)
        .await?;

    tracing::info!(product_id = %id, "Product created");
    Ok(Json(ProductCreated { id }))
}

/// Overwrite every editable field of a product.
#[instrument(skip(state, admin, input), fields(admin = %admin.session.username))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Ack>> {
    let input = store_inline_image(&state, input).await?;
    CatalogRepository::new(state.pool())
        .update_product(id, &input)
        .await?;

    Ok(Json(Ack::OK))
}

/// Delete a product. Deleting an unknown id succeeds.
#[instrument(skip(state, admin), fields(admin = %admin.session.username))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Ack>> {
    CatalogRepository::new(state.pool()).delete_product(id).await?;
    Ok(Json(Ack::OK))
}

async fn store_inline_image(state: &AppState, mut input: ProductInput) -> Result<ProductInput> {
    if let Some(image) = input.image.take() {
        input.image = Some(state.blobs().resolve_image(&image).await?);
    }
    Ok(input)
}
