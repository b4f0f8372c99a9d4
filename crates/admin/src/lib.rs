//! Merchdesk admin library.
//!
//! One backend for operators who run WooCommerce, WordPress and Shopify
//! stores side by side: product and post management, Yoast SEO fields,
//! page-builder text extraction, AI copywriting and Shopify development
//! store provisioning.
//!
//! # Security
//!
//! Every `/api` route is scoped to the tenant whose API key is presented.
//! Platform credentials are stored per tenant and never returned by the API.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod ai;
pub mod builders;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod provisioning;
pub mod routes;
pub mod seo;
pub mod shopify;
pub mod state;
pub mod tables;
pub mod woocommerce;
pub mod wordpress;
