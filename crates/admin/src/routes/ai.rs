//! AI content generation.

use std::collections::BTreeMap;

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use tracing::instrument;

use crate::ai::{Description, DescriptionInput, SeoInput, SeoSuggestion, TranslateInput};
use crate::error::AppError;
use crate::middleware::auth::RequireTenant;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ai/seo", post(seo))
        .route("/api/ai/description", post(description))
        .route("/api/ai/translate", post(translate))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn seo(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(input): Json<SeoInput>,
) -> Result<Json<SeoSuggestion>, AppError> {
    Ok(Json(state.ai().generate_seo(&input).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn description(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(input): Json<DescriptionInput>,
) -> Result<Json<Description>, AppError> {
    Ok(Json(state.ai().generate_description(&input).await?))
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    /// Target language → translated text.
    pub translations: BTreeMap<String, String>,
}

#[instrument(skip_all, fields(tenant_id = %tenant.id, targets = input.targets.len()))]
async fn translate(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(input): Json<TranslateInput>,
) -> Result<Json<TranslateResponse>, AppError> {
    let translations = state.ai().translate(&input).await?;
    Ok(Json(TranslateResponse { translations }))
}
