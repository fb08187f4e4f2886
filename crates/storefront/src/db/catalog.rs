//! Catalog repository: categories and products.
//!
//! Writes are deliberately permissive. Product bodies are stored without
//! validation, updates and deletes of unknown ids succeed silently, and
//! `category_id` is never checked against `categories`. The listing query
//! hides products whose category does not resolve.

use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use partfruit_core::{Category, CategoryId, Price, Product, ProductId, ProductInput};

use super::RepositoryError;

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a SqlitePool,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    category_id: i64,
    category_name: String,
    price: Option<f64>,
    image: Option<String>,
    description: Option<String>,
    is_available: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = row
            .price
            .map(Price::from_f64)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
            })?
            .unwrap_or(Price::ZERO);

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            category_id: CategoryId::new(row.category_id),
            category_name: row.category_name,
            price,
            image: row.image.unwrap_or_default(),
            description: row.description.unwrap_or_default(),
            is_available: row.is_available,
        })
    }
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All categories in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Number of categories.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_categories(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a category and return its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_category(&self, name: &str) -> Result<CategoryId, RepositoryError> {
        let result = sqlx::query("INSERT INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(self.pool)
            .await?;
        Ok(CategoryId::new(result.last_insert_rowid()))
    }

    /// Delete a category. Its products stay in place but drop out of listings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// All products whose category exists, with the category name joined in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is not finite.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.name, p.category_id, c.name AS category_name,
                   p.price, p.image, p.description, p.is_available
            FROM products p
            INNER JOIN categories c ON p.category_id = c.id
            ORDER BY p.id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Insert a product and return the generated id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<ProductId, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO products (name, category_id, price, image, description)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(&input.name)
        .bind(input.category_id.map(|id| id.as_i64()))
        .bind(input.price.map(Price::to_f64))
        .bind(input.image.as_deref())
        .bind(input.description.as_deref())
        .execute(self.pool)
        .await?;

        Ok(ProductId::new(result.last_insert_rowid()))
    }

    /// Overwrite all editable fields of a product.
    ///
    /// An unknown id matches no row and still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = ?, category_id = ?, price = ?, image = ?, description = ?
            WHERE id = ?
            ",
        )
        .bind(&input.name)
        .bind(input.category_id.map(|id| id.as_i64()))
        .bind(input.price.map(Price::to_f64))
        .bind(input.image.as_deref())
        .bind(input.description.as_deref())
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(%id, "update matched no product");
        }
        Ok(())
    }

    /// Delete a product. Unknown ids succeed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Current prices of the given products, regardless of category.
    ///
    /// Ids that do not exist are absent from the map; a NULL price reads as zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored price is not finite.
    pub async fn product_prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Price>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, price FROM products WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_i64());
        }
        separated.push_unseparated(")");

        let rows: Vec<(i64, Option<f64>)> = query.build_query_as().fetch_all(self.pool).await?;

        rows.into_iter()
            .map(|(id, price)| {
                let price = price
                    .map(Price::from_f64)
                    .transpose()
                    .map_err(|e| {
                        RepositoryError::DataCorruption(format!("invalid price for product {id}: {e}"))
                    })?
                    .unwrap_or(Price::ZERO);
                Ok((ProductId::new(id), price))
            })
            .collect()
    }
}
