//! Part Fruit Core - Shared types library.
//!
//! This crate provides common types used across all Part Fruit components:
//! - `storefront` - The HTTP API over the catalog, order and admin stores
//! - `client` - The customer/admin application state machine
//! - `cli` - Command-line tools for migrations, seeding and admin accounts
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The request and response records in [`types::api`] are
//! the wire contract shared by the server and the client.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, statuses, catalog and order records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
