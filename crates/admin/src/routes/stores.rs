//! Store provisioning jobs.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use merchdesk_core::{JobId, JobStatus};

use crate::db::jobs::{self, JobEvent, StoreJob};
use crate::error::AppError;
use crate::middleware::auth::RequireTenant;
use crate::provisioning::{CreateStoreRequest, DeliveryOutcome};
use crate::state::AppState;
use crate::tables::{StoreJobRow, TablePage};

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/stores", post(create))
        .route("/api/stores/jobs", get(list_jobs))
        .route("/api/stores/jobs/{id}", get(show_job))
        .route("/api/stores/jobs/{id}/events", get(job_events))
        .route("/api/stores/jobs/{id}/webhook", post(redeliver_webhook))
}

/// Start provisioning a development store. Responds once the job exists.
#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn create(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Json(request): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<StoreJob>), AppError> {
    let job = state.provisioning().create_store(tenant.id, request).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<JobStatus>,
}

impl JobsQuery {
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.per_page())
    }
}

#[instrument(skip_all, fields(tenant_id = %tenant.id))]
async fn list_jobs(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Query(query): Query<JobsQuery>,
) -> Result<Json<TablePage<StoreJobRow>>, AppError> {
    let (rows, total) = tokio::try_join!(
        jobs::list_jobs(
            state.pool(),
            tenant.id,
            query.status,
            i64::from(query.per_page()),
            query.offset(),
        ),
        jobs::count_jobs(state.pool(), tenant.id, query.status),
    )?;

    Ok(Json(TablePage::new(
        rows.into_iter().map(StoreJobRow::from).collect(),
        query.page(),
        query.per_page(),
        u64::try_from(total).unwrap_or(0),
    )))
}

async fn owned_job(state: &AppState, tenant: &RequireTenant, id: JobId) -> Result<StoreJob, AppError> {
    jobs::get_job(state.pool(), tenant.0.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {id}")))
}

#[instrument(skip_all, fields(job_id = %id))]
async fn show_job(
    tenant: RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Json<StoreJob>, AppError> {
    Ok(Json(owned_job(&state, &tenant, id).await?))
}

#[instrument(skip_all, fields(job_id = %id))]
async fn job_events(
    tenant: RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Json<Vec<JobEvent>>, AppError> {
    let job = owned_job(&state, &tenant, id).await?;
    Ok(Json(jobs::list_events(state.pool(), job.id).await?))
}

/// Send the job's webhook again, to the job URL or the tenant default.
#[instrument(skip_all, fields(job_id = %id))]
async fn redeliver_webhook(
    RequireTenant(tenant): RequireTenant,
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Json<DeliveryOutcome>, AppError> {
    state
        .provisioning()
        .redeliver_webhook(tenant.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::Conflict("no webhook URL configured".to_string()))
}
