//! Order records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::catalog::Product;
use super::id::{OrderId, ProductId};
use super::price::Price;
use super::status::{OrderStatus, PaymentMethod};

/// One line of an order: a snapshot of the product as the customer saw it,
/// plus the quantity.
///
/// Only `id` and `quantity` are typed. Every other product field the client
/// sent is kept verbatim in `snapshot` and never re-validated against the
/// current catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ProductId,
    pub quantity: u32,
    #[serde(flatten)]
    pub snapshot: Map<String, Value>,
}

impl OrderItem {
    /// Snapshot a product at the given quantity.
    #[must_use]
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        let snapshot = match serde_json::to_value(product) {
            Ok(Value::Object(mut fields)) => {
                fields.remove("id");
                fields.remove("quantity");
                fields
            }
            _ => Map::new(),
        };

        Self {
            id: product.id,
            quantity,
            snapshot,
        }
    }

    /// Product name as captured in the snapshot.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.snapshot.get("name").and_then(Value::as_str)
    }
}

/// Body of the order submission endpoint.
///
/// The total is computed by the client. Apart from `payment_method`, which
/// must be one of the closed set, missing fields fall back to empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub total_price: Price,
    #[serde(default)]
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_method: PaymentMethod,
    /// Inline `data:` URL of the transfer receipt. Required for manual transfer.
    pub receipt_image: Option<String>,
}

/// A submitted order. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_phone: String,
    pub items: Vec<OrderItem>,
    /// Total as submitted by the client.
    pub total_price: Price,
    /// Total recomputed from catalog prices when the order was created;
    /// `None` when an ordered product no longer existed.
    pub catalog_total: Option<Price>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_method: PaymentMethod,
    /// Reference to the stored receipt (`/api/blobs/<hash>`).
    pub receipt_image: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether the client total disagrees with the catalog at creation time.
    #[must_use]
    pub fn total_mismatch(&self) -> bool {
        self.catalog_total
            .is_some_and(|catalog| catalog != self.total_price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::CategoryId;

    fn product() -> Product {
        Product {
            id: ProductId::new(5),
            name: "آجیل مخلوط ممتاز".to_string(),
            category_id: CategoryId::new(2),
            category_name: "آجیل و خشکبار".to_string(),
            price: Price::from_f64(5.0).unwrap(),
            image: "https://picsum.photos/seed/nuts/400/400".to_string(),
            description: String::new(),
            is_available: true,
        }
    }

    #[test]
    fn test_order_item_keeps_product_snapshot() {
        let item = OrderItem::from_product(&product(), 2);
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(json["id"], 5);
        assert_eq!(json["quantity"], 2);
        assert_eq!(json["category_name"], "آجیل و خشکبار");
        assert_eq!(item.name(), Some("آجیل مخلوط ممتاز"));
        assert_eq!(json["price"], 5.0);
    }

    #[test]
    fn test_order_item_accepts_unknown_snapshot_fields() {
        let item: OrderItem =
            serde_json::from_str(r#"{"id":1,"quantity":3,"colour":"red"}"#).unwrap();
        assert_eq!(item.quantity, 3);
        assert_eq!(item.snapshot.get("colour"), Some(&Value::from("red")));
        assert_eq!(item.name(), None);
    }

    #[test]
    fn test_new_order_requires_payment_method() {
        assert!(serde_json::from_str::<NewOrder>(r#"{"address":"x"}"#).is_err());

        let order: NewOrder =
            serde_json::from_str(r#"{"payment_method":"cod","receipt_image":null}"#).unwrap();
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert!(order.items.is_empty());
        assert_eq!(order.total_price, Price::ZERO);
    }
}
