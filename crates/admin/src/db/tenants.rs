//! Tenant accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use merchdesk_core::TenantId;

use super::RepositoryError;

/// A tenant (operator account).
///
/// The API key hash is deliberately not part of this struct.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Default destination for job webhooks.
    pub webhook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const TENANT_COLUMNS: &str = "id, name, webhook_url, created_at, updated_at";

/// Create a tenant.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the API key hash is already in use.
pub async fn create(
    pool: &PgPool,
    name: &str,
    api_key_hash: &str,
    webhook_url: Option<&str>,
) -> Result<Tenant, RepositoryError> {
    let sql = format!(
        "INSERT INTO tenants (id, name, api_key_hash, webhook_url)
         VALUES ($1, $2, $3, $4)
         RETURNING {TENANT_COLUMNS}"
    );

    sqlx::query_as::<_, Tenant>(&sql)
        .bind(TenantId::generate())
        .bind(name)
        .bind(api_key_hash)
        .bind(webhook_url)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict("API key already in use".to_string())
            }
            other => RepositoryError::Database(other),
        })
}

/// Look up a tenant by the SHA-256 hash of its API key.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_by_api_key_hash(
    pool: &PgPool,
    api_key_hash: &str,
) -> Result<Option<Tenant>, RepositoryError> {
    let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE api_key_hash = $1");

    Ok(sqlx::query_as::<_, Tenant>(&sql)
        .bind(api_key_hash)
        .fetch_optional(pool)
        .await?)
}

/// Get a tenant by ID.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get(pool: &PgPool, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
    let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = $1");

    Ok(sqlx::query_as::<_, Tenant>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

/// List all tenants, oldest first.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list(pool: &PgPool) -> Result<Vec<Tenant>, RepositoryError> {
    let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at");

    Ok(sqlx::query_as::<_, Tenant>(&sql).fetch_all(pool).await?)
}

/// Set or clear the default webhook URL.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the tenant does not exist.
pub async fn update_webhook_url(
    pool: &PgPool,
    id: TenantId,
    webhook_url: Option<&str>,
) -> Result<Tenant, RepositoryError> {
    let sql = format!(
        "UPDATE tenants SET webhook_url = $2, updated_at = NOW()
         WHERE id = $1
         RETURNING {TENANT_COLUMNS}"
    );

    sqlx::query_as::<_, Tenant>(&sql)
        .bind(id)
        .bind(webhook_url)
        .fetch_optional(pool)
        .await?
        .ok_or(RepositoryError::NotFound)
}

/// Replace the API key hash. The old key stops working immediately.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the tenant does not exist.
pub async fn rotate_api_key(
    pool: &PgPool,
    id: TenantId,
    api_key_hash: &str,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE tenants SET api_key_hash = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(api_key_hash)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
