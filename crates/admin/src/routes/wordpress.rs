//! WordPress posts, pages, Yoast fields and page-builder content.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use tracing::instrument;

use merchdesk_core::WpPostId;

use crate::builders::{self, ExtractedContent};
use crate::error::AppError;
use crate::middleware::auth::RequireTenant;
use crate::seo::YoastFields;
use crate::state::AppState;
use crate::tables::{TablePage, WpPostRow};
use crate::wordpress::{ContentKind, PostInput, WpListParams, WpMedia, WpPost};

use super::connect::wp_client;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/wordpress/posts", get(list_posts).post(create_post))
        .route("/api/wordpress/posts/{id}", get(show_post).put(update_post))
        .route("/api/wordpress/pages", get(list_pages))
        .route("/api/wordpress/pages/{id}", get(show_page).put(update_page))
        .route("/api/wordpress/media/{id}", get(show_media))
        .route("/api/wordpress/{kind}/{id}/seo", get(show_seo).put(update_seo))
        .route("/api/wordpress/{kind}/{id}/content", get(content))
}

fn parse_kind(raw: &str) -> Result<ContentKind, AppError> {
    raw.parse().map_err(AppError::BadRequest)
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn list_posts(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Query(params): Query<WpListParams>,
) -> Result<Json<TablePage<WpPostRow>>, AppError> {
    let client = wp_client(&state, tenant.id).await?;
    let posts = client.list_posts(&params).await?;
    Ok(Json(TablePage::from_paged(posts, WpPostRow::from)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn create_post(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(input): Json<PostInput>,
) -> Result<(StatusCode, Json<WpPost>), AppError> {
    if input.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("title is required".to_string()));
    }

    let client = wp_client(&state, tenant.id).await?;
    let post = client.create_post(&input).await?;
    tracing::info!(post_id = %post.id, "WordPress post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, post_id = %id))]
async fn show_post(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WpPostId>,
) -> Result<Json<WpPost>, AppError> {
    let client = wp_client(&state, tenant.id).await?;
    Ok(Json(client.get_post(id).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, post_id = %id))]
async fn update_post(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WpPostId>,
    Json(input): Json<PostInput>,
) -> Result<Json<WpPost>, AppError> {
    let client = wp_client(&state, tenant.id).await?;
    Ok(Json(client.update_post(id, &input).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn list_pages(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Query(params): Query<WpListParams>,
) -> Result<Json<TablePage<WpPostRow>>, AppError> {
    let client = wp_client(&state, tenant.id).await?;
    let pages = client.list_pages(&params).await?;
    Ok(Json(TablePage::from_paged(pages, WpPostRow::from)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, page_id = %id))]
async fn show_page(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WpPostId>,
) -> Result<Json<WpPost>, AppError> {
    let client = wp_client(&state, tenant.id).await?;
    Ok(Json(client.get_page(id).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, page_id = %id))]
async fn update_page(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<WpPostId>,
    Json(input): Json<PostInput>,
) -> Result<Json<WpPost>, AppError> {
    let client = wp_client(&state, tenant.id).await?;
    Ok(Json(client.update_page(id, &input).await?))
}

/// Attachment details, used to resolve builder image ids.
#[instrument(skip_all, fields(tenant_id = %tenant.id, media_id = id))]
async fn show_media(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<WpMedia>, AppError> {
    let client = wp_client(&state, tenant.id).await?;
    Ok(Json(client.get_media(id).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, kind = %kind, id = %id))]
async fn show_seo(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, WpPostId)>,
) -> Result<Json<YoastFields>, AppError> {
    let kind = parse_kind(&kind)?;
    let client = wp_client(&state, tenant.id).await?;
    let item = client.get_item(kind, id).await?;
    Ok(Json(YoastFields::from_wp_meta(&item.meta)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, kind = %kind, id = %id))]
async fn update_seo(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, WpPostId)>,
    Json(fields): Json<YoastFields>,
) -> Result<Json<YoastFields>, AppError> {
    let kind = parse_kind(&kind)?;
    if fields.is_empty() {
        return Err(AppError::BadRequest("no SEO fields given".to_string()));
    }

    let client = wp_client(&state, tenant.id).await?;
    let item = client.update_meta(kind, id, fields.to_wp_meta()).await?;
    Ok(Json(YoastFields::from_wp_meta(&item.meta)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, kind = %kind, id = %id))]
async fn content(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, WpPostId)>,
) -> Result<Json<ExtractedContent>, AppError> {
    let kind = parse_kind(&kind)?;
    let client = wp_client(&state, tenant.id).await?;
    let item = client.get_item(kind, id).await?;
    let extracted = builders::extract(&item.meta, item.content.source())?;
    Ok(Json(extracted))
}
