//! Admin session and product editor state.

use secrecy::SecretString;

use partfruit_core::{Category, Price, Product, ProductId, ProductInput};

/// Image used for new products until the admin picks one.
pub const PLACEHOLDER_IMAGE: &str = "https://picsum.photos/400/400";

/// Proof of an admin login.
///
/// Admin views and catalog writes are only reachable while the application
/// holds one of these.
#[derive(Debug, Clone)]
pub struct AdminSession {
    token: SecretString,
}

impl AdminSession {
    /// Wrap a token issued by `/api/admin/login`.
    #[must_use]
    pub const fn new(token: SecretString) -> Self {
        Self { token }
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Admin login overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Server message from the last failed attempt.
    pub error: Option<String>,
}

/// Product being created or edited.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    /// `None` for a product that does not exist yet.
    pub id: Option<ProductId>,
    pub input: ProductInput,
}

impl ProductDraft {
    /// Blank draft: empty name, zero price, first category, placeholder image.
    #[must_use]
    pub fn template(categories: &[Category]) -> Self {
        Self {
            id: None,
            input: ProductInput {
                name: String::new(),
                category_id: categories.first().map(|c| c.id),
                price: Some(Price::ZERO),
                image: Some(PLACEHOLDER_IMAGE.to_owned()),
                description: Some(String::new()),
            },
        }
    }

    /// Draft pre-filled from an existing product.
    #[must_use]
    pub fn edit(product: &Product) -> Self {
        Self {
            id: Some(product.id),
            input: ProductInput::from(product),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partfruit_core::CategoryId;

    #[test]
    fn test_template_uses_first_category() {
        let categories = vec![
            Category {
                id: CategoryId::new(3),
                name: "سبزیجات".to_string(),
            },
            Category {
                id: CategoryId::new(1),
                name: "میوه".to_string(),
            },
        ];
        let draft = ProductDraft::template(&categories);

        assert_eq!(draft.id, None);
        assert_eq!(draft.input.name, "");
        assert_eq!(draft.input.category_id, Some(CategoryId::new(3)));
        assert_eq!(draft.input.price, Some(Price::ZERO));
        assert_eq!(draft.input.image.as_deref(), Some(PLACEHOLDER_IMAGE));
        assert_eq!(draft.input.description.as_deref(), Some(""));
    }

    #[test]
    fn test_template_without_categories() {
        assert_eq!(ProductDraft::template(&[]).input.category_id, None);
    }
}
