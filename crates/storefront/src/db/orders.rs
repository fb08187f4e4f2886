//! Order repository.
//!
//! Orders are append-only. Items are stored as JSON text exactly as the
//! client submitted them.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::instrument;

use partfruit_core::{NewOrder, Order, OrderId, OrderItem, OrderStatus, PaymentMethod, Price};

use super::RepositoryError;

/// Idempotency key of a submission and the fingerprint of its body.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'k> {
    pub key: &'k str,
    pub fingerprint: &'k str,
}

/// Order previously stored under an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedOrder {
    pub id: OrderId,
    /// `None` for rows stored without a fingerprint.
    pub fingerprint: Option<String>,
}

impl KeyedOrder {
    /// Whether a submission with `fingerprint` repeats this order.
    #[must_use]
    pub fn matches(&self, fingerprint: &str) -> bool {
        self.fingerprint.as_deref().is_none_or(|f| f == fingerprint)
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_phone: Option<String>,
    items: Option<String>,
    total_price: Option<f64>,
    catalog_total: Option<f64>,
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    payment_method: String,
    receipt_image: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid {what} in order {}: {e}", row.id))
        };

        let items: Vec<OrderItem> = match row.items.as_deref() {
            Some(json) => serde_json::from_str(json).map_err(|e| corrupt("items", &e))?,
            None => Vec::new(),
        };
        let total_price = row
            .total_price
            .map(Price::from_f64)
            .transpose()
            .map_err(|e| corrupt("total_price", &e))?
            .unwrap_or(Price::ZERO);
        let catalog_total = row
            .catalog_total
            .map(Price::from_f64)
            .transpose()
            .map_err(|e| corrupt("catalog_total", &e))?;
        let payment_method: PaymentMethod = row
            .payment_method
            .parse()
            .map_err(|e: String| corrupt("payment_method", &e))?;
        let status: OrderStatus = row
            .status
            .parse()
            .map_err(|e: String| corrupt("status", &e))?;

        Ok(Self {
            id: OrderId::new(row.id),
            customer_phone: row.customer_phone.unwrap_or_default(),
            items,
            total_price,
            catalog_total,
            address: row.address.unwrap_or_default(),
            latitude: row.latitude,
            longitude: row.longitude,
            payment_method,
            receipt_image: row.receipt_image,
            status,
            created_at: row.created_at,
        })
    }
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an order and return the generated id.
    ///
    /// `order.receipt_image` is stored as given; callers replace inline
    /// images with blob references first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the submission key was already used.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, order), fields(payment_method = %order.payment_method, items = order.items.len()))]
    pub async fn create_order(
        &self,
        order: &NewOrder,
        catalog_total: Option<Price>,
        submission: Option<Submission<'_>>,
    ) -> Result<OrderId, RepositoryError> {
        let items = serde_json::to_string(&order.items)
            .map_err(|e| RepositoryError::DataCorruption(format!("unserializable items: {e}")))?;

        let result = sqlx::query(
            r"
            INSERT INTO orders (
                customer_phone, items, total_price, catalog_total, address,
                latitude, longitude, payment_method, receipt_image, status,
                idempotency_key, request_fingerprint, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&order.customer_phone)
        .bind(items)
        .bind(order.total_price.to_f64())
        .bind(catalog_total.map(Price::to_f64))
        .bind(&order.address)
        .bind(order.latitude)
        .bind(order.longitude)
        .bind(order.payment_method.as_str())
        .bind(order.receipt_image.as_deref())
        .bind(OrderStatus::default().as_str())
        .bind(submission.map(|s| s.key))
        .bind(submission.map(|s| s.fingerprint))
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "idempotency key"))?;

        Ok(OrderId::new(result.last_insert_rowid()))
    }

    /// The order previously created with this idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<KeyedOrder>, RepositoryError> {
        let row: Option<(i64, Option<String>)> = sqlx::query_as(
            "SELECT id, request_fingerprint FROM orders WHERE idempotency_key = ?",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, fingerprint)| KeyedOrder {
            id: OrderId::new(id),
            fingerprint,
        }))
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row cannot be decoded.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_phone, items, total_price, catalog_total, address,
                   latitude, longitude, payment_method, receipt_image, status, created_at
            FROM orders
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
