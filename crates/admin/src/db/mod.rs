//! Database operations for the admin `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `tenants` - Operator accounts, authenticated by hashed API key
//! - `platform_connections` - Per-tenant WooCommerce/WordPress/Shopify credentials
//! - `store_jobs` - Shopify development store creation jobs
//! - `store_job_events` - Append-only status history for each job
//!
//! Queries are checked at runtime (`sqlx::query`/`query_as`), so building
//! the crate does not need a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p merchdesk-cli -- migrate
//! ```

pub mod connections;
pub mod jobs;
pub mod tenants;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation or invalid state change.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
