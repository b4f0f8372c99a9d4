//! Integration tests for Merchdesk.
//!
//! The tests in `tests/` exercise the admin library across module
//! boundaries without a database or network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p merchdesk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `content_pipeline` - WordPress post → builder extraction → SEO checklist
//! - `store_provisioning` - job requests, templates, status machine, webhooks
