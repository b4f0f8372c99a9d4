//! Merchdesk Core - Shared types library.
//!
//! This crate provides common types used across all Merchdesk components:
//! - `admin` - Multi-tenant admin backend (WooCommerce, WordPress, Shopify)
//! - `cli` - Command-line tools for migrations and tenant management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, platforms, job statuses and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
