//! WooCommerce product management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use merchdesk_core::WooProductId;

use crate::error::AppError;
use crate::middleware::auth::RequireTenant;
use crate::seo::YoastFields;
use crate::state::AppState;
use crate::tables::{TablePage, WooProductRow};
use crate::woocommerce::{
    BatchRequest, BatchResponse, ListParams, ProductInput, WooCategory, WooProduct,
};

use super::connect::woo_client;

/// WooCommerce rejects batches above this size.
pub const MAX_BATCH_SIZE: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/woocommerce/products", get(list).post(create))
        .route("/api/woocommerce/products/batch", post(batch))
        .route(
            "/api/woocommerce/products/{id}",
            get(show).put(update).delete(delete),
        )
        .route(
            "/api/woocommerce/products/{id}/seo",
            get(show_seo).put(update_seo),
        )
        .route("/api/woocommerce/categories", get(categories))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn list(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<TablePage<WooProductRow>>, AppError> {
    let client = woo_client(&state, tenant.id).await?;
    let products = client.list_products(&params).await?;
    Ok(Json(TablePage::from_paged(products, WooProductRow::from)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn create(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<WooProduct>), AppError> {
    if input.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let client = woo_client(&state, tenant.id).await?;
    let product = client.create_product(&input).await?;
    tracing::info!(product_id = %product.id, "WooCommerce product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn show(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WooProductId>,
) -> Result<Json<WooProduct>, AppError> {
    let client = woo_client(&state, tenant.id).await?;
    Ok(Json(client.get_product(id).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn update(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WooProductId>,
    Json(mut input): Json<ProductInput>,
) -> Result<Json<WooProduct>, AppError> {
    // the id comes from the path
    input.id = None;
    let client = woo_client(&state, tenant.id).await?;
    Ok(Json(client.update_product(id, &input).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
    /// Skip the trash.
    #[serde(default)]
    pub force: bool,
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn delete(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WooProductId>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<WooProduct>, AppError> {
    let client = woo_client(&state, tenant.id).await?;
    let product = client.delete_product(id, params.force).await?;
    tracing::info!(force = params.force, "WooCommerce product deleted");
    Ok(Json(product))
}

/// Reject empty and oversized batches before calling the store.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when the batch is empty or larger than
/// [`MAX_BATCH_SIZE`].
pub fn validate_batch(batch: &BatchRequest) -> Result<(), AppError> {
    if batch.is_empty() {
        return Err(AppError::BadRequest("batch is empty".to_string()));
    }
    if batch.len() > MAX_BATCH_SIZE {
        return Err(AppError::BadRequest(format!(
            "batch has {} operations, limit is {MAX_BATCH_SIZE}",
            batch.len()
        )));
    }
    if batch.update.iter().any(|p| p.id.is_none()) {
        return Err(AppError::BadRequest(
            "every update needs an id".to_string(),
        ));
    }
    Ok(())
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, ops = batch.len()))]
async fn batch(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(batch): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    validate_batch(&batch)?;
    let client = woo_client(&state, tenant.id).await?;
    Ok(Json(client.batch_products(&batch).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn categories(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
) -> Result<Json<Vec<WooCategory>>, AppError> {
    let client = woo_client(&state, tenant.id).await?;
    Ok(Json(client.list_categories().await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn show_seo(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WooProductId>,
) -> Result<Json<YoastFields>, AppError> {
    let client = woo_client(&state, tenant.id).await?;
    let product = client.get_product(id).await?;
    Ok(Json(YoastFields::from_woo_meta_data(&product.meta_data)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, product_id = %id))]
async fn update_seo(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WooProductId>,
    Json(fields): Json<YoastFields>,
) -> Result<Json<YoastFields>, AppError> {
    if fields.is_empty() {
        return Err(AppError::BadRequest("no SEO fields given".to_string()));
    }

    let client = woo_client(&state, tenant.id).await?;
    let input = ProductInput {
        meta_data: Some(fields.to_woo_meta_data()),
        ..ProductInput::default()
    };
    let product = client.update_product(id, &input).await?;
    Ok(Json(YoastFields::from_woo_meta_data(&product.meta_data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: Option<i64>) -> ProductInput {
        ProductInput {
            id: id.map(WooProductId::new),
            regular_price: Some("9.99".to_string()),
            ..ProductInput::default()
        }
    }

    #[test]
    fn test_validate_batch_rejects_empty() {
        let err = validate_batch(&BatchRequest::default()).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validate_batch_limit() {
        let mut batch = BatchRequest {
            delete: (1..=100).map(WooProductId::new).collect(),
            ..BatchRequest::default()
        };
        assert!(validate_batch(&batch).is_ok());

        batch.update.push(update(Some(101)));
        assert!(validate_batch(&batch).is_err());
    }

    #[test]
    fn test_validate_batch_requires_update_ids() {
        let batch = BatchRequest {
            update: vec![update(Some(1)), update(None)],
            ..BatchRequest::default()
        };
        assert!(validate_batch(&batch).is_err());
    }
}
