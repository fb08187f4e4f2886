//! Catalog records: categories and products.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};
use super::price::Price;

/// A product category shown as a filter chip in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A product as listed to customers.
///
/// `category_name` is not stored on the product; it is joined from the
/// category at read time, and products whose category no longer exists are
/// not listed at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    pub price: Price,
    /// Image URL (external, or `/api/blobs/<hash>` for uploaded images).
    pub image: String,
    pub description: String,
    /// Stored flag, defaults to true. Nothing toggles it yet.
    #[serde(default = "default_available")]
    pub is_available: bool,
}

const fn default_available() -> bool {
    true
}

/// Body of the product create and update endpoints.
///
/// Every field is optional on the wire. Missing fields are stored as
/// NULL (or an empty name) rather than rejected, and an update overwrites
/// all five fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInput {
    pub name: String,
    pub category_id: Option<CategoryId>,
    pub price: Option<Price>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category_id: Some(product.category_id),
            price: Some(product.price),
            image: Some(product.image.clone()),
            description: Some(product.description.clone()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_input_tolerates_missing_fields() {
        let input: ProductInput = serde_json::from_str(r#"{"name":"انار"}"#).unwrap();
        assert_eq!(input.name, "انار");
        assert_eq!(input.category_id, None);
        assert_eq!(input.price, None);
    }

    #[test]
    fn test_product_input_ignores_read_only_fields() {
        let body = r#"{"id":3,"name":"چای","category_id":4,"category_name":"نوشیدنی","price":2.5,"image":"x","description":"d"}"#;
        let input: ProductInput = serde_json::from_str(body).unwrap();
        assert_eq!(input.category_id, Some(CategoryId::new(4)));
        assert_eq!(input.price, Some(Price::from_f64(2.5).unwrap()));
    }

    #[test]
    fn test_product_defaults_to_available() {
        let body = r#"{"id":1,"name":"n","category_id":1,"category_name":"c","price":1,"image":"","description":""}"#;
        let product: Product = serde_json::from_str(body).unwrap();
        assert!(product.is_available);
    }
}
