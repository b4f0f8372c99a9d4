//! Shopify product management through the Admin REST API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use merchdesk_core::ShopifyProductId;

use crate::error::AppError;
use crate::middleware::auth::RequireTenant;
use crate::shopify::{SeoFields, ShopifyProduct, ShopifyProductInput};
use crate::state::AppState;
use crate::tables::{CursorPage, ShopifyProductRow};

use super::connect::shopify_client;

const DEFAULT_LIMIT: u32 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/shopify/products", get(list).post(create))
        .route(
            "/api/shopify/products/{id}",
            get(show).put(update).delete(delete),
        )
        .route(
            "/api/shopify/products/{id}/seo",
            get(show_seo).put(update_seo),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    /// `page_info` cursor from a previous page.
    pub cursor: Option<String>,
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn list(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CursorPage<ShopifyProductRow>>, AppError> {
    let client = shopify_client(&state, tenant.id).await?;
    let page = client
        .list_products(
            query.limit.unwrap_or(DEFAULT_LIMIT),
            query.cursor.as_deref(),
        )
        .await?;
    Ok(Json(CursorPage::from_shopify(page, ShopifyProductRow::from)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn create(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(input): Json<ShopifyProductInput>,
) -> Result<(StatusCode, Json<ShopifyProduct>), AppError> {
    if input.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("title is required".to_string()));
    }

    let client = shopify_client(&state, tenant.id).await?;
    let product = client.create_product(&input).await?;
    tracing::info!(product_id = %product.id, "Shopify product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn show(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<ShopifyProductId>,
) -> Result<Json<ShopifyProduct>, AppError> {
    let client = shopify_client(&state, tenant.id).await?;
    Ok(Json(client.get_product(id).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn update(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<ShopifyProductId>,
    Json(input): Json<ShopifyProductInput>,
) -> Result<Json<ShopifyProduct>, AppError> {
    let client = shopify_client(&state, tenant.id).await?;
    Ok(Json(client.update_product(id, &input).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn delete(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<ShopifyProductId>,
) -> Result<StatusCode, AppError> {
    let client = shopify_client(&state, tenant.id).await?;
    client.delete_product(id).await?;
    tracing::info!("Shopify product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn show_seo(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<ShopifyProductId>,
) -> Result<Json<SeoFields>, AppError> {
    let client = shopify_client(&state, tenant.id).await?;
    Ok(Json(client.get_product_seo(id).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn update_seo(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<ShopifyProductId>,
    Json(seo): Json<SeoFields>,
) -> Result<Json<SeoFields>, AppError> {
    if seo.title.is_none() && seo.description.is_none() {
        return Err(AppError::BadRequest("no SEO fields given".to_string()));
    }

    let client = shopify_client(&state, tenant.id).await?;
    Ok(Json(client.update_product_seo(id, &seo).await?))
}
