//! Seed an empty store with the default admin and catalog.
//!
//! Seeding never touches a store that already has an admin or categories,
//! so it is safe to run repeatedly.

use std::path::Path;

use tracing::info;

use partfruit_storefront::db::{self, seed::SeedCatalog};

use super::{CommandError, connect};

/// Migrate, then insert the seed catalog from `file` or the embedded one.
///
/// # Errors
///
/// Returns an error if the seed file is invalid or a database operation fails.
pub async fn run(file: Option<&Path>) -> Result<(), CommandError> {
    // Validate before connecting
    let catalog = SeedCatalog::load(file).await?;
    info!(
        categories = catalog.categories.len(),
        products = catalog.products.len(),
        "Parsed seed catalog"
    );

    let pool = connect().await?;
    db::migrate(&pool).await?;

    let report = db::seed::ensure_seeded(&pool, &catalog).await?;
    if report.is_noop() {
        info!("Store already seeded, nothing inserted");
    } else {
        info!(
            admin_created = report.admin_created,
            categories = report.categories,
            products = report.products,
            "Seeding complete!"
        );
    }
    Ok(())
}
