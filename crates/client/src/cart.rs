//! Shopping cart.

use partfruit_core::{OrderItem, Price, Product, ProductId};

/// One cart line. Quantity is always at least one.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

/// Ordered cart lines keyed by product id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit; a new product is appended at the end.
    pub fn add(&mut self, product: &Product) {
        match self.lines.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => line.quantity += 1,
            None => self.lines.push(CartLine {
                product: product.clone(),
                quantity: 1,
            }),
        }
    }

    /// Add one unit of a product already in the cart.
    pub fn increment(&mut self, id: ProductId) {
        if let Some(line) = self.lines.iter_mut().find(|line| line.product.id == id) {
            line.quantity += 1;
        }
    }

    /// Remove one unit; the line disappears when it reaches zero.
    pub fn decrement(&mut self, id: ProductId) {
        if let Some(line) = self.lines.iter_mut().find(|line| line.product.id == id) {
            line.quantity = line.quantity.saturating_sub(1);
        }
        self.lines.retain(|line| line.quantity > 0);
    }

    /// Drop a line whatever its quantity.
    pub fn remove(&mut self, id: ProductId) {
        self.lines.retain(|line| line.product.id != id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ price × quantity.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines
            .iter()
            .map(|line| line.product.price.times(line.quantity))
            .sum()
    }

    /// Σ quantity.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Snapshot of the lines as order items.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.lines
            .iter()
            .map(|line| OrderItem::from_product(&line.product, line.quantity))
            .collect()
    }
}
