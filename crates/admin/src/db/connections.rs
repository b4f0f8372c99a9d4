//! Per-tenant platform credentials.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use merchdesk_core::{Platform, TenantId};

use super::RepositoryError;

/// Credentials for one platform of one tenant.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone, sqlx::FromRow)]
pub struct PlatformConnection {
    pub tenant_id: TenantId,
    pub platform: Platform,
    /// Store URL, site URL or shop domain.
    pub base_url: String,
    /// Consumer key (WooCommerce) or username (WordPress).
    pub username: Option<String>,
    /// Consumer secret, application password or access token.
    pub secret: String,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for PlatformConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConnection")
            .field("tenant_id", &self.tenant_id)
            .field("platform", &self.platform)
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Parameters for creating or replacing a connection.
pub struct UpsertConnection<'a> {
    pub tenant_id: TenantId,
    pub platform: Platform,
    pub base_url: &'a str,
    pub username: Option<&'a str>,
    pub secret: &'a str,
}

/// Create or replace the connection for `(tenant, platform)`.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn upsert(
    pool: &PgPool,
    params: UpsertConnection<'_>,
) -> Result<PlatformConnection, RepositoryError> {
    let connection = sqlx::query_as::<_, PlatformConnection>(
        r"
        INSERT INTO platform_connections (tenant_id, platform, base_url, username, secret)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (tenant_id, platform) DO UPDATE
        SET base_url = EXCLUDED.base_url,
            username = EXCLUDED.username,
            secret = EXCLUDED.secret,
            updated_at = NOW()
        RETURNING tenant_id, platform, base_url, username, secret, updated_at
        ",
    )
    .bind(params.tenant_id)
    .bind(params.platform)
    .bind(params.base_url)
    .bind(params.username)
    .bind(params.secret)
    .fetch_one(pool)
    .await?;

    Ok(connection)
}

/// Get the connection for one platform.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get(
    pool: &PgPool,
    tenant_id: TenantId,
    platform: Platform,
) -> Result<Option<PlatformConnection>, RepositoryError> {
    let connection = sqlx::query_as::<_, PlatformConnection>(
        r"
        SELECT tenant_id, platform, base_url, username, secret, updated_at
        FROM platform_connections
        WHERE tenant_id = $1 AND platform = $2
        ",
    )
    .bind(tenant_id)
    .bind(platform)
    .fetch_optional(pool)
    .await?;

    Ok(connection)
}

/// List all connections of a tenant.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list_for_tenant(
    pool: &PgPool,
    tenant_id: TenantId,
) -> Result<Vec<PlatformConnection>, RepositoryError> {
    let connections = sqlx::query_as::<_, PlatformConnection>(
        r"
        SELECT tenant_id, platform, base_url, username, secret, updated_at
        FROM platform_connections
        WHERE tenant_id = $1
        ORDER BY platform
        ",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;

    Ok(connections)
}

/// Remove a connection.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if no such connection exists.
pub async fn delete(
    pool: &PgPool,
    tenant_id: TenantId,
    platform: Platform,
) -> Result<(), RepositoryError> {
    let result =
        sqlx::query("DELETE FROM platform_connections WHERE tenant_id = $1 AND platform = $2")
            .bind(tenant_id)
            .bind(platform)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
