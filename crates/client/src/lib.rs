//! Part Fruit client.
//!
//! The customer and admin application as a view-state machine. [`App`] holds
//! the view, overlays, cart and admin session and talks to the storefront
//! through [`StoreApi`]. Device capabilities sit behind [`Platform`].
//!
//! # Modules
//!
//! - [`app`] - View-state machine
//! - [`api`] - Storefront HTTP client
//! - [`cart`] - Cart lines and totals
//! - [`checkout`] - Checkout form, validation and the WhatsApp order message
//! - [`filter`] - Category and search filtering
//! - [`admin`] - Admin session, login form and product drafts
//! - [`platform`] - Location, file and URL capabilities
//! - [`config`] - Environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod app;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filter;
pub mod platform;

pub use admin::{AdminSession, LoginForm, ProductDraft};
pub use api::{HttpStoreApi, StoreApi};
pub use app::{App, CheckoutOutcome, Overlay, View};
pub use cart::{Cart, CartLine};
pub use checkout::CheckoutForm;
pub use config::ClientConfig;
pub use error::{CheckoutError, ClientError};
pub use filter::CatalogFilter;
pub use platform::{NativePlatform, Platform, Position};
