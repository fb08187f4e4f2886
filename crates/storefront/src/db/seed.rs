//! Default data for an empty store.
//!
//! The seed catalog ships embedded in the binary (`seed/catalog.yaml`) and
//! can be replaced with another YAML file of the same shape. Seeding is
//! idempotent: the admin account is only inserted when there is no admin,
//! and the catalog only when there are no categories.

use std::path::Path;

use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, instrument};

use partfruit_core::Price;

use super::{AdminRepository, CatalogRepository, RepositoryError};

const EMBEDDED_CATALOG: &str = include_str!("../../seed/catalog.yaml");

/// Errors that can occur while loading or applying seed data.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("seed product {product:?} names unknown category {category:?}")]
    UnknownCategory { product: String, category: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for SeedError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Seed file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedCatalog {
    pub admin: SeedAdmin,
    pub categories: Vec<String>,
    pub products: Vec<SeedProduct>,
}

/// Default admin account.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
}

/// A seed product; `category` is a category name, resolved at insert time.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub image: String,
    pub description: String,
}

/// What a seeding run inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub categories: usize,
    pub products: usize,
}

impl SeedReport {
    /// Whether the run inserted nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.admin_created && self.categories == 0 && self.products == 0
    }
}

impl SeedCatalog {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` if the embedded YAML is malformed.
    pub fn embedded() -> Result<Self, SeedError> {
        Self::parse(EMBEDDED_CATALOG)
    }

    /// Parse and validate a YAML catalog.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` for malformed YAML and
    /// `SeedError::UnknownCategory` if a product names a category that is
    /// not listed.
    pub fn parse(yaml: &str) -> Result<Self, SeedError> {
        let catalog: Self = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read a catalog from a file.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Io` if the file cannot be read, otherwise as [`Self::parse`].
    pub async fn from_file(path: &Path) -> Result<Self, SeedError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// The file at `path` when given, otherwise the embedded catalog.
    ///
    /// # Errors
    ///
    /// As [`Self::from_file`] and [`Self::embedded`].
    pub async fn load(path: Option<&Path>) -> Result<Self, SeedError> {
        match path {
            Some(path) => {
                info!(path = %path.display(), "Loading seed catalog from file");
                Self::from_file(path).await
            }
            None => Self::embedded(),
        }
    }

    fn validate(&self) -> Result<(), SeedError> {
        for product in &self.products {
            if !self.categories.contains(&product.category) {
                return Err(SeedError::UnknownCategory {
                    product: product.name.clone(),
                    category: product.category.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Insert the default admin and catalog into an empty store.
///
/// # Errors
///
/// Returns `SeedError::Repository` if a query fails. The catalog insert runs
/// in one transaction, so a failure leaves no partial catalog behind.
#[instrument(skip_all)]
pub async fn ensure_seeded(pool: &SqlitePool, catalog: &SeedCatalog) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    let admins = AdminRepository::new(pool);
    if admins.count().await? == 0 {
        admins
            .create(&catalog.admin.username, &catalog.admin.password)
            .await?;
        report.admin_created = true;
        info!(username = %catalog.admin.username, "Seeded default admin");
    }

    if CatalogRepository::new(pool).count_categories().await? == 0 {
        let mut tx = pool.begin().await?;

        for name in &catalog.categories {
            sqlx::query("INSERT INTO categories (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            report.categories += 1;
        }

        for product in &catalog.products {
            sqlx::query(
                r"
                INSERT INTO products (name, category_id, price, image, description)
                VALUES (?, (SELECT id FROM categories WHERE name = ?), ?, ?, ?)
                ",
            )
            .bind(&product.name)
            .bind(&product.category)
            .bind(product.price.to_f64())
            .bind(&product.image)
            .bind(&product.description)
            .execute(&mut *tx)
            .await?;
            report.products += 1;
        }

        tx.commit().await?;
        info!(
            categories = report.categories,
            products = report.products,
            "Seeded catalog"
        );
    }

    Ok(report)
}
