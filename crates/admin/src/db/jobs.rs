//! Store creation jobs and their status history.
//!
//! Every status change is a compare-and-set on the current status and is
//! recorded in `store_job_events` in the same transaction.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use merchdesk_core::{JobId, JobStatus, TenantId};

use super::RepositoryError;

/// A store creation job.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StoreJob {
    pub id: JobId,
    pub tenant_id: TenantId,
    pub store_name: String,
    pub status: JobStatus,
    /// What to populate the store with (`PopulateSource` as JSON).
    pub populate: serde_json::Value,
    /// Per-job webhook override.
    pub webhook_url: Option<String>,
    pub store_domain: Option<String>,
    pub admin_url: Option<String>,
    /// `PopulateReport` as JSON, once population ran.
    pub report: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub webhook_attempts: i32,
    pub webhook_delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// One entry of a job's status history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct JobEvent {
    pub id: i64,
    pub job_id: JobId,
    pub from_status: Option<JobStatus>,
    pub to_status: JobStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a job.
pub struct CreateJob<'a> {
    pub tenant_id: TenantId,
    pub store_name: &'a str,
    pub populate: serde_json::Value,
    pub webhook_url: Option<&'a str>,
}

const JOB_COLUMNS: &str = "id, tenant_id, store_name, status, populate, webhook_url, \
    store_domain, admin_url, report, error_message, webhook_attempts, webhook_delivered_at, \
    created_at, updated_at, finished_at";

/// Create a job in `Pending` status.
///
/// # Errors
///
/// Returns error if the database insert fails.
pub async fn create_job(pool: &PgPool, params: CreateJob<'_>) -> Result<StoreJob, RepositoryError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "INSERT INTO store_jobs (id, tenant_id, store_name, populate, webhook_url)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {JOB_COLUMNS}"
    );
    let job = sqlx::query_as::<_, StoreJob>(&sql)
        .bind(JobId::generate())
        .bind(params.tenant_id)
        .bind(params.store_name)
        .bind(&params.populate)
        .bind(params.webhook_url)
        .fetch_one(&mut *tx)
        .await?;

    insert_event(&mut tx, job.id, None, JobStatus::Pending, None).await?;
    tx.commit().await?;

    Ok(job)
}

/// Get a job owned by `tenant_id`.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_job(
    pool: &PgPool,
    tenant_id: TenantId,
    job_id: JobId,
) -> Result<Option<StoreJob>, RepositoryError> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM store_jobs WHERE id = $1 AND tenant_id = $2");

    Ok(sqlx::query_as::<_, StoreJob>(&sql)
        .bind(job_id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?)
}

/// Get a job regardless of tenant (pipeline use only).
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn get_job_by_id(pool: &PgPool, job_id: JobId) -> Result<Option<StoreJob>, RepositoryError> {
    let sql = format!("SELECT {JOB_COLUMNS} FROM store_jobs WHERE id = $1");

    Ok(sqlx::query_as::<_, StoreJob>(&sql)
        .bind(job_id)
        .fetch_optional(pool)
        .await?)
}

/// List a tenant's jobs, newest first.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list_jobs(
    pool: &PgPool,
    tenant_id: TenantId,
    status: Option<JobStatus>,
    limit: i64,
    offset: i64,
) -> Result<Vec<StoreJob>, RepositoryError> {
    let sql = format!(
        "SELECT {JOB_COLUMNS} FROM store_jobs
         WHERE tenant_id = $1 AND ($2::job_status IS NULL OR status = $2)
         ORDER BY created_at DESC
         LIMIT $3 OFFSET $4"
    );

    Ok(sqlx::query_as::<_, StoreJob>(&sql)
        .bind(tenant_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?)
}

/// Count a tenant's jobs (same filter as [`list_jobs`]).
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn count_jobs(
    pool: &PgPool,
    tenant_id: TenantId,
    status: Option<JobStatus>,
) -> Result<i64, RepositoryError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM store_jobs
         WHERE tenant_id = $1 AND ($2::job_status IS NULL OR status = $2)",
    )
    .bind(tenant_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Move a job from `from` to `to`.
///
/// Returns `Ok(false)` without changing anything when the job is no longer
/// in `from` (another runner moved it first).
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the state machine forbids the
/// transition, or a database error.
pub async fn transition(
    pool: &PgPool,
    job_id: JobId,
    from: JobStatus,
    to: JobStatus,
    message: Option<&str>,
) -> Result<bool, RepositoryError> {
    if !from.can_transition_to(to) {
        return Err(RepositoryError::Conflict(format!(
            "invalid job transition {from} -> {to}"
        )));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r"
        UPDATE store_jobs
        SET status = $3,
            updated_at = NOW(),
            finished_at = CASE WHEN $3 IN ('completed', 'failed') THEN NOW() ELSE finished_at END
        WHERE id = $1 AND status = $2
        ",
    )
    .bind(job_id)
    .bind(from)
    .bind(to)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    insert_event(&mut tx, job_id, Some(from), to, message).await?;
    tx.commit().await?;

    Ok(true)
}

/// Fail a job from whatever non-terminal state it is in.
///
/// Returns the status the job was in, or `None` if it was already terminal.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the job does not exist.
pub async fn mark_failed(
    pool: &PgPool,
    job_id: JobId,
    error_message: &str,
) -> Result<Option<JobStatus>, RepositoryError> {
    let mut tx = pool.begin().await?;

    let current: Option<JobStatus> =
        sqlx::query_scalar("SELECT status FROM store_jobs WHERE id = $1 FOR UPDATE")
            .bind(job_id)
            .fetch_optional(&mut *tx)
            .await?;

    let Some(current) = current else {
        return Err(RepositoryError::NotFound);
    };

    if current.is_terminal() {
        tx.rollback().await?;
        return Ok(None);
    }

    sqlx::query(
        r"
        UPDATE store_jobs
        SET status = 'failed', error_message = $2, updated_at = NOW(), finished_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(job_id)
    .bind(error_message)
    .execute(&mut *tx)
    .await?;

    insert_event(
        &mut tx,
        job_id,
        Some(current),
        JobStatus::Failed,
        Some(error_message),
    )
    .await?;
    tx.commit().await?;

    Ok(Some(current))
}

/// Record the store created by the CLI.
///
/// # Errors
///
/// Returns error if the database update fails.
pub async fn record_store(
    pool: &PgPool,
    job_id: JobId,
    store_domain: &str,
    admin_url: Option<&str>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE store_jobs SET store_domain = $2, admin_url = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(job_id)
    .bind(store_domain)
    .bind(admin_url)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record the population report.
///
/// # Errors
///
/// Returns error if the database update fails.
pub async fn record_report(
    pool: &PgPool,
    job_id: JobId,
    report: &serde_json::Value,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE store_jobs SET report = $2, updated_at = NOW() WHERE id = $1")
        .bind(job_id)
        .bind(report)
        .execute(pool)
        .await?;

    Ok(())
}

/// Record a webhook delivery outcome.
///
/// # Errors
///
/// Returns error if the database update fails.
pub async fn record_webhook(
    pool: &PgPool,
    job_id: JobId,
    attempts: i32,
    delivered: bool,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE store_jobs
        SET webhook_attempts = webhook_attempts + $2,
            webhook_delivered_at = CASE WHEN $3 THEN NOW() ELSE webhook_delivered_at END
        WHERE id = $1
        ",
    )
    .bind(job_id)
    .bind(attempts)
    .bind(delivered)
    .execute(pool)
    .await?;

    Ok(())
}

/// Fail every unfinished job that has not progressed for `older_than`.
///
/// Covers `Pending` too, so jobs whose runner never started are not left
/// behind.
///
/// Returns the IDs of the jobs that were failed.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn expire_stale(
    pool: &PgPool,
    older_than: Duration,
    message: &str,
) -> Result<Vec<JobId>, RepositoryError> {
    let age = chrono::Duration::from_std(older_than)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid stale age: {e}")))?;
    let cutoff = Utc::now() - age;

    let ids: Vec<JobId> = sqlx::query_scalar(
        r"
        WITH stale AS (
            SELECT id, status
            FROM store_jobs
            WHERE status IN ('pending', 'creating_store', 'populating') AND updated_at < $1
            FOR UPDATE SKIP LOCKED
        ),
        failed AS (
            UPDATE store_jobs j
            SET status = 'failed', error_message = $2, updated_at = NOW(), finished_at = NOW()
            FROM stale
            WHERE j.id = stale.id
            RETURNING j.id, stale.status AS from_status
        )
        INSERT INTO store_job_events (job_id, from_status, to_status, message)
        SELECT id, from_status, 'failed'::job_status, $2 FROM failed
        RETURNING job_id
        ",
    )
    .bind(cutoff)
    .bind(message)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// List a job's status history, oldest first.
///
/// # Errors
///
/// Returns error if the database query fails.
pub async fn list_events(pool: &PgPool, job_id: JobId) -> Result<Vec<JobEvent>, RepositoryError> {
    Ok(sqlx::query_as::<_, JobEvent>(
        r"
        SELECT id, job_id, from_status, to_status, message, created_at
        FROM store_job_events
        WHERE job_id = $1
        ORDER BY id
        ",
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?)
}

async fn insert_event(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    job_id: JobId,
    from: Option<JobStatus>,
    to: JobStatus,
    message: Option<&str>,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO store_job_events (job_id, from_status, to_status, message) VALUES ($1, $2, $3, $4)",
    )
    .bind(job_id)
    .bind(from)
    .bind(to)
    .bind(message)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
