//! Tenant profile, default webhook and platform connections.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use merchdesk_core::{Platform, TenantId};

use crate::db::connections::{self, PlatformConnection, UpsertConnection};
use crate::db::tenants;
use crate::error::AppError;
use crate::middleware::auth::RequireTenant;
use crate::provisioning::service::validate_webhook_url;
use crate::shopify::normalize_shop_domain;
use crate::state::AppState;
use crate::wordpress::site_url;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tenant", get(show))
        .route("/api/tenant/webhook", put(update_webhook))
        .route("/api/tenant/connections", get(list_connections))
        .route(
            "/api/tenant/connections/{platform}",
            put(upsert_connection).delete(delete_connection),
        )
}

/// A connection as shown to the UI. The secret is never included.
#[derive(Debug, Serialize)]
pub struct ConnectionSummary {
    pub platform: Platform,
    pub base_url: String,
    /// WordPress username; WooCommerce consumer keys are not echoed.
    pub username: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<PlatformConnection> for ConnectionSummary {
    fn from(connection: PlatformConnection) -> Self {
        let username = match connection.platform {
            Platform::WordPress => connection.username,
            Platform::WooCommerce | Platform::Shopify => None,
        };
        Self {
            platform: connection.platform,
            base_url: connection.base_url,
            username,
            updated_at: connection.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TenantResponse {
    pub id: TenantId,
    pub name: String,
    pub webhook_url: Option<String>,
    pub connections: Vec<ConnectionSummary>,
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn show(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
) -> Result<Json<TenantResponse>, AppError> {
    let tenant = tenants::get(state.pool(), tenant.id)
        .await?
        .ok_or_else(|| AppError::NotFound("tenant".to_string()))?;
    let connections = connections::list_for_tenant(state.pool(), tenant.id).await?;

    Ok(Json(TenantResponse {
        id: tenant.id,
        name: tenant.name,
        webhook_url: tenant.webhook_url,
        connections: connections.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    /// `null` clears the default.
    pub webhook_url: Option<String>,
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn update_webhook(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(body): Json<WebhookRequest>,
) -> Result<Json<TenantResponse>, AppError> {
    let webhook_url = body
        .webhook_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty());
    if let Some(url) = webhook_url {
        validate_webhook_url(url)?;
    }

    let updated = tenants::update_webhook_url(state.pool(), tenant.id, webhook_url).await?;
    // cached entries carry the old webhook URL
    state.tenant_cache().invalidate_all();

    let connections = connections::list_for_tenant(state.pool(), updated.id).await?;
    Ok(Json(TenantResponse {
        id: updated.id,
        name: updated.name,
        webhook_url: updated.webhook_url,
        connections: connections.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn list_connections(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
) -> Result<Json<Vec<ConnectionSummary>>, AppError> {
    let connections = connections::list_for_tenant(state.pool(), tenant.id).await?;
    Ok(Json(connections.into_iter().map(Into::into).collect()))
}

/// Body of `PUT /api/tenant/connections/{platform}`.
#[derive(Debug, Deserialize)]
pub struct ConnectionRequest {
    /// Store URL (WooCommerce), site URL (WordPress) or shop domain (Shopify).
    pub base_url: String,
    /// Consumer key (WooCommerce) or username (WordPress).
    #[serde(default)]
    pub username: Option<String>,
    /// Consumer secret, application password or Admin API access token.
    pub secret: String,
}

/// Check a connection request and normalise its base URL.
///
/// # Errors
///
/// Returns `AppError::BadRequest` describing the first problem found.
pub fn normalize_connection(
    platform: Platform,
    request: &ConnectionRequest,
) -> Result<(String, Option<String>), AppError> {
    if request.secret.trim().is_empty() {
        return Err(AppError::BadRequest("secret is required".to_string()));
    }

    let username = request
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string);

    match platform {
        Platform::WooCommerce | Platform::WordPress => {
            let base_url = site_url(&request.base_url).map_err(AppError::BadRequest)?;
            if username.is_none() {
                return Err(AppError::BadRequest(format!(
                    "username is required for {platform}"
                )));
            }
            Ok((base_url, username))
        }
        Platform::Shopify => {
            let shop = normalize_shop_domain(&request.base_url)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            Ok((shop, None))
        }
    }
}

fn parse_platform(raw: &str) -> Result<Platform, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, platform = %platform))]
async fn upsert_connection(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Json(body): Json<ConnectionRequest>,
) -> Result<Json<ConnectionSummary>, AppError> {
    let platform = parse_platform(&platform)?;
    let (base_url, username) = normalize_connection(platform, &body)?;

    let connection = connections::upsert(
        state.pool(),
        UpsertConnection {
            tenant_id: tenant.id,
            platform,
            base_url: &base_url,
            username: username.as_deref(),
            secret: body.secret.trim(),
        },
    )
    .await?;

    tracing::info!(base_url = %connection.base_url, "Connection saved");
    Ok(Json(connection.into()))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, platform = %platform))]
async fn delete_connection(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(platform): Path<String>,
) -> Result<StatusCode, AppError> {
    let platform = parse_platform(&platform)?;
    connections::delete(state.pool(), tenant.id, platform).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(base_url: &str, username: Option<&str>, secret: &str) -> ConnectionRequest {
        ConnectionRequest {
            base_url: base_url.to_string(),
            username: username.map(str::to_string),
            secret: secret.to_string(),
        }
    }

    #[test]
    fn test_normalize_woocommerce_connection() {
        let (base_url, username) = normalize_connection(
            Platform::WooCommerce,
            &request("https://shop.example.com/", Some(" ck_123 "), "cs_456"),
        )
        .unwrap();
        assert_eq!(base_url, "https://shop.example.com");
        assert_eq!(username.as_deref(), Some("ck_123"));
    }

    #[test]
    fn test_normalize_requires_username_for_wordpress() {
        let err = normalize_connection(
            Platform::WordPress,
            &request("https://blog.example.com", None, "abcd efgh"),
        )
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_normalize_shopify_domain() {
        let (shop, username) = normalize_connection(
            Platform::Shopify,
            &request("https://Acme-Demo.myshopify.com/", Some("ignored"), "shpat_x"),
        )
        .unwrap();
        assert_eq!(shop, "acme-demo.myshopify.com");
        assert!(username.is_none());
    }

    #[test]
    fn test_normalize_rejects_blank_secret() {
        assert!(
            normalize_connection(Platform::Shopify, &request("acme", None, "  ")).is_err()
        );
    }

    #[test]
    fn test_parse_platform() {
        assert_eq!(parse_platform("wordpress").unwrap(), Platform::WordPress);
        assert_eq!(
            parse_platform("magento").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
