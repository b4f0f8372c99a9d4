//! Platform clients built from a tenant's stored connection.

use secrecy::SecretString;

use merchdesk_core::{Platform, TenantId};

use crate::db::connections::{self, PlatformConnection};
use crate::error::AppError;
use crate::shopify::ShopifyClient;
use crate::state::AppState;
use crate::woocommerce::WooClient;
use crate::wordpress::WpClient;

async fn connection(
    state: &AppState,
    tenant_id: TenantId,
    platform: Platform,
) -> Result<PlatformConnection, AppError> {
    connections::get(state.pool(), tenant_id, platform)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("{platform} connection not configured")))
}

fn username(connection: &PlatformConnection) -> Result<&str, AppError> {
    connection.username.as_deref().ok_or_else(|| {
        AppError::Conflict(format!(
            "{} connection has no username",
            connection.platform
        ))
    })
}

pub(super) async fn woo_client(state: &AppState, tenant_id: TenantId) -> Result<WooClient, AppError> {
    let connection = connection(state, tenant_id, Platform::WooCommerce).await?;
    Ok(WooClient::new(
        state.http().clone(),
        &connection.base_url,
        username(&connection)?,
        SecretString::from(connection.secret.clone()),
    )?)
}

pub(super) async fn wp_client(state: &AppState, tenant_id: TenantId) -> Result<WpClient, AppError> {
    let connection = connection(state, tenant_id, Platform::WordPress).await?;
    Ok(WpClient::new(
        state.http().clone(),
        &connection.base_url,
        username(&connection)?,
        SecretString::from(connection.secret.clone()),
    )?)
}

pub(super) async fn shopify_client(
    state: &AppState,
    tenant_id: TenantId,
) -> Result<ShopifyClient, AppError> {
    let connection = connection(state, tenant_id, Platform::Shopify).await?;
    Ok(ShopifyClient::new(
        state.http().clone(),
        &connection.base_url,
        &state.config().shopify.api_version,
        SecretString::from(connection.secret),
    )?)
}
