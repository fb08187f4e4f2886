//! Client-side catalog filtering.

use partfruit_core::{CategoryId, Product};

/// Category chip and search box state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Option<CategoryId>,
    pub query: String,
}

impl CatalogFilter {
    /// Whether `product` passes both the category and the name filter.
    ///
    /// The name match is a case-insensitive substring match; an empty query
    /// matches everything.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let in_category = self.category.is_none_or(|id| product.category_id == id);
        let query = self.query.trim();
        let in_search =
            query.is_empty() || product.name.to_lowercase().contains(&query.to_lowercase());
        in_category && in_search
    }

    /// The products that pass, in catalog order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}
