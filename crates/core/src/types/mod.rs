//! Core types for Part Fruit.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod api;
pub mod catalog;
pub mod id;
pub mod order;
pub mod price;
pub mod status;

pub use catalog::{Category, Product, ProductInput};
pub use id::*;
pub use order::{NewOrder, Order, OrderItem};
pub use price::{Price, PriceError};
pub use status::*;
