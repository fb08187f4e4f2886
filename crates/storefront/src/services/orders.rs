//! Order placement.
//!
//! Wraps the order repository with the rules that apply before an order is
//! stored: a manual transfer needs a receipt, inline receipts move to the
//! blob store, the client total is checked against current catalog prices,
//! and a repeated idempotency key returns the order created the first time.
//! A key reused with a different body is refused.

use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, instrument, warn};

use partfruit_core::{NewOrder, OrderId, Price};

use super::blobs::{BlobError, BlobStore};
use crate::config::OrderTotalPolicy;
use crate::db::{CatalogRepository, KeyedOrder, OrderRepository, RepositoryError, Submission};

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Manual transfer submitted without a receipt image.
    #[error("receipt image is required for manual transfer")]
    MissingReceipt,

    /// Client total disagrees with the catalog under the `reject` policy.
    #[error("order total {submitted} does not match catalog total {catalog}")]
    TotalMismatch { submitted: Price, catalog: Price },

    /// Idempotency key already used for a different order.
    #[error("idempotency key already used for order {0} with a different body")]
    KeyReused(OrderId),

    /// Receipt could not be stored.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// Repository/database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Order placement service.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
    blobs: &'a BlobStore,
    policy: OrderTotalPolicy,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool, blobs: &'a BlobStore, policy: OrderTotalPolicy) -> Self {
        Self {
            pool,
            blobs,
            policy,
        }
    }

    /// Validate and store an order, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::MissingReceipt` for a manual transfer without receipt.
    /// Returns `OrderError::TotalMismatch` when the `reject` policy refuses the total.
    /// Returns `OrderError::KeyReused` when the key belongs to a different order.
    /// Returns `OrderError::Blob` or `OrderError::Repository` on storage failures.
    #[instrument(skip(self, order, idempotency_key), fields(payment_method = %order.payment_method))]
    pub async fn place(
        &self,
        mut order: NewOrder,
        idempotency_key: Option<&str>,
    ) -> Result<OrderId, OrderError> {
        let orders = OrderRepository::new(self.pool);
        let fingerprint = fingerprint(&order)?;
        let submission = idempotency_key.map(|key| Submission {
            key,
            fingerprint: &fingerprint,
        });

        if let Some(key) = idempotency_key
            && let Some(existing) = orders.find_by_idempotency_key(key).await?
        {
            return replay(existing, &fingerprint);
        }

        let has_receipt = order.receipt_image.as_deref().is_some_and(|r| !r.is_empty());
        if order.payment_method.requires_receipt() && !has_receipt {
            return Err(OrderError::MissingReceipt);
        }

        let catalog_total = self.check_total(&order).await?;

        if let Some(receipt) = order.receipt_image.take() {
            order.receipt_image = Some(self.blobs.resolve_image(&receipt).await?);
        }

        let created = orders.create_order(&order, catalog_total, submission).await;

        match (created, idempotency_key) {
            (Ok(id), _) => {
                info!(order_id = %id, total = %order.total_price, "Order placed");
                Ok(id)
            }
            // Lost a race with a concurrent submission of the same key.
            (Err(RepositoryError::Conflict(_)), Some(key)) => {
                let existing = orders
                    .find_by_idempotency_key(key)
                    .await?
                    .ok_or(OrderError::Repository(RepositoryError::NotFound))?;
                replay(existing, &fingerprint)
            }
            (Err(e), _) => Err(e.into()),
        }
    }

    /// Apply the total policy and return the catalog total to record.
    async fn check_total(&self, order: &NewOrder) -> Result<Option<Price>, OrderError> {
        if self.policy == OrderTotalPolicy::Trust {
            return Ok(None);
        }

        let Some(catalog) = self.catalog_total(order).await? else {
            warn!("Order references products missing from the catalog; total not checked");
            return Ok(None);
        };

        if catalog != order.total_price {
            if self.policy == OrderTotalPolicy::Reject {
                return Err(OrderError::TotalMismatch {
                    submitted: order.total_price,
                    catalog,
                });
            }
            warn!(
                submitted = %order.total_price,
                catalog = %catalog,
                "Order total differs from catalog prices"
            );
        }

        Ok(Some(catalog))
    }

    /// Σ current price × quantity, or `None` if any item no longer exists.
    async fn catalog_total(&self, order: &NewOrder) -> Result<Option<Price>, OrderError> {
        let ids: Vec<_> = order.items.iter().map(|item| item.id).collect();
        let prices = CatalogRepository::new(self.pool).product_prices(&ids).await?;

        Ok(order
            .items
            .iter()
            .map(|item| prices.get(&item.id).map(|price| price.times(item.quantity)))
            .sum())
    }
}

/// Hex SHA-256 of the order body as submitted.
fn fingerprint(order: &NewOrder) -> Result<String, OrderError> {
    let body = serde_json::to_vec(order)
        .map_err(|e| RepositoryError::DataCorruption(format!("unserializable order: {e}")))?;
    Ok(hex::encode(Sha256::digest(body)))
}

fn replay(existing: KeyedOrder, fingerprint: &str) -> Result<OrderId, OrderError> {
    if existing.matches(fingerprint) {
        info!(order_id = %existing.id, "Order resubmitted, returning original");
        Ok(existing.id)
    } else {
        warn!(order_id = %existing.id, "Idempotency key reused with a different order");
        Err(OrderError::KeyReused(existing.id))
    }
}
