//! Store provisioning service.
//!
//! Orchestrates one job from request to webhook:
//! 1. `Pending → CreatingStore`: run the Shopify CLI, record the domain
//! 2. `CreatingStore → Populating`: resolve the template, populate the store
//! 3. `Populating → Completed`, or `Failed` on any error
//! 4. Deliver the signed webhook for the terminal state
//!
//! Every step is a compare-and-set on the job status; a job moved by someone
//! else (e.g. the stale sweep) stops the pipeline.

use std::sync::Arc;
use std::time::Duration;

use merchdesk_core::{JobId, JobStatus, TenantId};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::ai::{AiClient, AiError};
use crate::config::ProvisioningConfig;
use crate::db::RepositoryError;
use crate::db::jobs::{self, CreateJob, StoreJob};
use crate::db::tenants;
use crate::shopify::{ShopifyClient, ShopifyError};

use super::cli::{self, CliError};
use super::populate::populate_shopify_store;
use super::template::{MAX_GENERATED_PRODUCTS, StoreTemplate};
use super::webhook::{DeliveryOutcome, WebhookPayload, WebhookSender};

/// Error message recorded on jobs failed by the stale sweep.
pub const STALE_JOB_MESSAGE: &str = "timed out";

const STORE_NAME_MIN: usize = 3;
const STORE_NAME_MAX: usize = 60;

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("store provisioning is not configured")]
    NotConfigured,

    #[error("job not found")]
    NotFound,

    #[error("job is still {0}")]
    NotTerminal(JobStatus),

    /// The job left `expected` before this runner could advance it.
    #[error("job is no longer {expected}")]
    Superseded { expected: JobStatus },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Cli(#[from] CliError),

    #[error("store template generation failed: {0}")]
    Ai(#[from] AiError),

    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    #[error("store created but no access token")]
    MissingAccessToken,

    #[error("store population aborted: {0}")]
    PopulateAborted(String),

    #[error("store population failed: all {0} items failed")]
    AllItemsFailed(usize),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What a new store is populated with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PopulateSource {
    /// Leave the store empty.
    #[default]
    None,
    /// Use the given template.
    Template(StoreTemplate),
    /// Ask the AI provider for a catalog.
    Generate { niche: String, product_count: u32 },
}

/// Body of `POST /api/stores`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStoreRequest {
    pub store_name: String,
    /// Overrides the tenant's default webhook URL.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub populate: PopulateSource,
}

impl CreateStoreRequest {
    /// Check the request and trim the store name.
    ///
    /// # Errors
    ///
    /// Returns `ProvisioningError::InvalidRequest` describing the first
    /// problem found.
    pub fn validate(&mut self) -> Result<(), ProvisioningError> {
        let name = self.store_name.trim();
        let len = name.chars().count();
        if !(STORE_NAME_MIN..=STORE_NAME_MAX).contains(&len) {
            return Err(invalid(format!(
                "store_name must be {STORE_NAME_MIN} to {STORE_NAME_MAX} characters"
            )));
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '-')
        {
            return Err(invalid(
                "store_name may only contain letters, digits, spaces and hyphens",
            ));
        }
        self.store_name = name.to_string();

        if let Some(url) = &self.webhook_url {
            validate_webhook_url(url)?;
        }

        match &self.populate {
            PopulateSource::None => {}
            PopulateSource::Template(template) => {
                if template.is_empty() {
                    return Err(invalid("template has no products, collections or pages"));
                }
                template.validate().map_err(ProvisioningError::InvalidRequest)?;
            }
            PopulateSource::Generate {
                niche,
                product_count,
            } => {
                if niche.trim().is_empty() {
                    return Err(invalid("niche is required"));
                }
                if !(1..=MAX_GENERATED_PRODUCTS).contains(product_count) {
                    return Err(invalid(format!(
                        "product_count must be between 1 and {MAX_GENERATED_PRODUCTS}"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Accept absolute `http`/`https` URLs with a host.
///
/// # Errors
///
/// Returns `ProvisioningError::InvalidRequest` for anything else.
pub fn validate_webhook_url(raw: &str) -> Result<(), ProvisioningError> {
    let url = url::Url::parse(raw.trim())
        .map_err(|e| invalid(format!("webhook_url is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid("webhook_url must be an http or https URL"));
    }
    Ok(())
}

fn invalid(message: impl Into<String>) -> ProvisioningError {
    ProvisioningError::InvalidRequest(message.into())
}

/// Runs store creation jobs. Cheap to clone.
#[derive(Clone)]
pub struct ProvisioningService {
    inner: Arc<ProvisioningServiceInner>,
}

struct ProvisioningServiceInner {
    pool: PgPool,
    cli: Option<ProvisioningConfig>,
    ai: AiClient,
    http: reqwest::Client,
    api_version: String,
    webhooks: WebhookSender,
    stale_after: Duration,
}

impl std::fmt::Debug for ProvisioningService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningService")
            .field("enabled", &self.is_enabled())
            .field("api_version", &self.inner.api_version)
            .field("stale_after", &self.inner.stale_after)
            .finish_non_exhaustive()
    }
}

impl ProvisioningService {
    /// Create the service. `cli` is `None` when provisioning is disabled;
    /// webhook redelivery and the stale sweep still work.
    #[must_use]
    pub fn new(
        pool: PgPool,
        cli: Option<ProvisioningConfig>,
        ai: AiClient,
        http: reqwest::Client,
        api_version: String,
        webhooks: WebhookSender,
        stale_after: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ProvisioningServiceInner {
                pool,
                cli,
                ai,
                http,
                api_version,
                webhooks,
                stale_after,
            }),
        }
    }

    /// Whether the Shopify CLI is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.cli.is_some()
    }

    /// Validate the request, create a `Pending` job and start it in the
    /// background. Returns as soon as the job row exists.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` or `NotConfigured` before anything is
    /// stored, or a repository error if the insert fails.
    #[instrument(skip(self, request), fields(store_name = %request.store_name))]
    pub async fn create_store(
        &self,
        tenant_id: TenantId,
        mut request: CreateStoreRequest,
    ) -> Result<StoreJob, ProvisioningError> {
        request.validate()?;
        if !self.is_enabled() {
            return Err(ProvisioningError::NotConfigured);
        }

        let populate = serde_json::to_value(&request.populate)?;
        let job = jobs::create_job(
            &self.inner.pool,
            CreateJob {
                tenant_id,
                store_name: &request.store_name,
                populate,
                webhook_url: request.webhook_url.as_deref().map(str::trim),
            },
        )
        .await?;

        info!(job_id = %job.id, "Store job created");

        let service = self.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            service.run_job(job_id).await;
        });

        Ok(job)
    }

    /// Run a job to a terminal state and deliver its webhook.
    #[instrument(skip(self))]
    pub async fn run_job(&self, job_id: JobId) {
        match self.execute(job_id).await {
            Ok(()) => info!("Store job completed"),
            Err(ProvisioningError::Superseded { expected }) => {
                warn!(%expected, "Store job moved by another runner, stopping");
                return;
            }
            Err(e) => {
                error!(error = %e, "Store job failed");
                match jobs::mark_failed(&self.inner.pool, job_id, &e.to_string()).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        // whoever made it terminal already sent its webhook
                        debug!("Job already terminal");
                        return;
                    }
                    Err(e) => error!(error = %e, "Failed to mark job failed"),
                }
            }
        }

        if let Err(e) = notify(&self.inner.pool, &self.inner.webhooks, job_id).await {
            error!(error = %e, "Failed to deliver job webhook");
        }
    }

    async fn execute(&self, job_id: JobId) -> Result<(), ProvisioningError> {
        let pool = &self.inner.pool;
        let cli_config = self.inner.cli.as_ref().ok_or(ProvisioningError::NotConfigured)?;
        let job = jobs::get_job_by_id(pool, job_id)
            .await?
            .ok_or(ProvisioningError::NotFound)?;
        let populate: PopulateSource = serde_json::from_value(job.populate.clone())?;

        self.advance(job_id, JobStatus::Pending, JobStatus::CreatingStore, None)
            .await?;

        let store = cli::create_store(cli_config, &job.store_name).await?;
        info!(shop = %store.shop_domain, "Development store created");
        jobs::record_store(pool, job_id, &store.shop_domain, store.admin_url.as_deref()).await?;

        self.advance(
            job_id,
            JobStatus::CreatingStore,
            JobStatus::Populating,
            Some(&store.shop_domain),
        )
        .await?;

        let template = match populate {
            PopulateSource::None => None,
            PopulateSource::Template(template) => Some(template),
            PopulateSource::Generate {
                niche,
                product_count,
            } => Some(
                self.inner
                    .ai
                    .generate_store_template(&niche, product_count)
                    .await?,
            ),
        };

        let mut message = None;
        if let Some(template) = template {
            let token = store
                .access_token
                .ok_or(ProvisioningError::MissingAccessToken)?;
            let client = ShopifyClient::new(
                self.inner.http.clone(),
                &store.shop_domain,
                &self.inner.api_version,
                token,
            )?;

            let report = populate_shopify_store(&client, &template).await;
            jobs::record_report(pool, job_id, &serde_json::to_value(&report)?).await?;

            if let Some(reason) = report.aborted {
                return Err(ProvisioningError::PopulateAborted(reason));
            }
            if report.all_failed() {
                return Err(ProvisioningError::AllItemsFailed(report.errors.len()));
            }
            if !report.errors.is_empty() {
                message = Some(format!("{} item(s) failed", report.errors.len()));
            }
        }

        self.advance(
            job_id,
            JobStatus::Populating,
            JobStatus::Completed,
            message.as_deref(),
        )
        .await
    }

    async fn advance(
        &self,
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
        message: Option<&str>,
    ) -> Result<(), ProvisioningError> {
        if jobs::transition(&self.inner.pool, job_id, from, to, message).await? {
            debug!(%from, %to, "Job advanced");
            Ok(())
        } else {
            Err(ProvisioningError::Superseded { expected: from })
        }
    }

    /// Deliver the webhook of a finished job again.
    ///
    /// Returns `None` when neither the job nor the tenant has a webhook URL.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for another tenant's job, `NotTerminal` while the
    /// job is running.
    #[instrument(skip(self))]
    pub async fn redeliver_webhook(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
    ) -> Result<Option<DeliveryOutcome>, ProvisioningError> {
        let job = jobs::get_job(&self.inner.pool, tenant_id, job_id)
            .await?
            .ok_or(ProvisioningError::NotFound)?;
        deliver_job_webhook(&self.inner.pool, &self.inner.webhooks, &job).await
    }

    /// Fail jobs that stopped making progress and notify their webhooks.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the sweep query fails.
    pub async fn expire_stale_jobs(&self) -> Result<Vec<JobId>, ProvisioningError> {
        expire_stale_jobs(&self.inner.pool, &self.inner.webhooks, self.inner.stale_after).await
    }
}

/// Fail jobs that stayed `Pending`, `CreatingStore` or `Populating` longer than
/// `older_than`, then deliver a `store.failed` webhook for each.
///
/// # Errors
///
/// Returns a repository error if the sweep query fails. Webhook failures are
/// logged only.
#[instrument(skip(pool, webhooks))]
pub async fn expire_stale_jobs(
    pool: &PgPool,
    webhooks: &WebhookSender,
    older_than: Duration,
) -> Result<Vec<JobId>, ProvisioningError> {
    let expired = jobs::expire_stale(pool, older_than, STALE_JOB_MESSAGE).await?;
    if expired.is_empty() {
        return Ok(expired);
    }

    warn!(count = expired.len(), "Expired stale store jobs");
    for job_id in &expired {
        if let Err(e) = notify(pool, webhooks, *job_id).await {
            error!(job_id = %job_id, error = %e, "Failed to deliver job webhook");
        }
    }

    Ok(expired)
}

async fn notify(
    pool: &PgPool,
    webhooks: &WebhookSender,
    job_id: JobId,
) -> Result<Option<DeliveryOutcome>, ProvisioningError> {
    let job = jobs::get_job_by_id(pool, job_id)
        .await?
        .ok_or(ProvisioningError::NotFound)?;
    if !job.status.is_terminal() {
        return Ok(None);
    }
    deliver_job_webhook(pool, webhooks, &job).await
}

async fn deliver_job_webhook(
    pool: &PgPool,
    webhooks: &WebhookSender,
    job: &StoreJob,
) -> Result<Option<DeliveryOutcome>, ProvisioningError> {
    let payload =
        WebhookPayload::for_job(job).ok_or(ProvisioningError::NotTerminal(job.status))?;

    let url = match &job.webhook_url {
        Some(url) => Some(url.clone()),
        None => tenants::get(pool, job.tenant_id)
            .await?
            .and_then(|tenant| tenant.webhook_url),
    };
    let Some(url) = url else {
        debug!(job_id = %job.id, "No webhook URL, skipping delivery");
        return Ok(None);
    };

    let outcome = webhooks.deliver(&url, &payload).await;
    jobs::record_webhook(
        pool,
        job.id,
        i32::try_from(outcome.attempts).unwrap_or(i32::MAX),
        outcome.delivered,
    )
    .await?;

    Ok(Some(outcome))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request(value: serde_json::Value) -> CreateStoreRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_populate_source_defaults_to_none() {
        let req = request(json!({"store_name": "Acme Demo"}));
        assert_eq!(req.populate, PopulateSource::None);
        assert_eq!(
            serde_json::to_value(&req.populate).unwrap(),
            json!({"type": "none"})
        );
    }

    #[test]
    fn test_populate_source_tagged_forms() {
        let req = request(json!({
            "store_name": "Acme Demo",
            "populate": {"type": "generate", "niche": "coffee gear", "product_count": 5}
        }));
        assert_eq!(
            req.populate,
            PopulateSource::Generate {
                niche: "coffee gear".to_string(),
                product_count: 5
            }
        );

        let req = request(json!({
            "store_name": "Acme Demo",
            "populate": {"type": "template", "products": [{"title": "Mug", "price": "12.00"}]}
        }));
        let PopulateSource::Template(template) = req.populate else {
            panic!("expected template");
        };
        assert_eq!(template.products.len(), 1);
    }

    #[test]
    fn test_validate_trims_store_name() {
        let mut req = request(json!({"store_name": "  Acme Demo-2  "}));
        req.validate().unwrap();
        assert_eq!(req.store_name, "Acme Demo-2");
    }

    #[test]
    fn test_validate_rejects_bad_store_names() {
        let long = "a".repeat(61);
        for name in ["ab", "Acme_Demo", "Acme/Demo", long.as_str()] {
            let mut req = request(json!({ "store_name": name }));
            assert!(
                matches!(req.validate(), Err(ProvisioningError::InvalidRequest(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_webhook_url() {
        assert!(validate_webhook_url("https://hooks.example.com/merchdesk").is_ok());
        assert!(validate_webhook_url("http://localhost:8080/hook").is_ok());
        assert!(validate_webhook_url("ftp://example.com/hook").is_err());
        assert!(validate_webhook_url("not a url").is_err());
    }

    #[test]
    fn test_validate_generate_bounds() {
        let mut req = request(json!({
            "store_name": "Acme Demo",
            "populate": {"type": "generate", "niche": "tea", "product_count": 26}
        }));
        assert!(req.validate().is_err());

        let mut req = request(json!({
            "store_name": "Acme Demo",
            "populate": {"type": "generate", "niche": " ", "product_count": 3}
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_template() {
        let mut req = request(json!({
            "store_name": "Acme Demo",
            "populate": {"type": "template"}
        }));
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("template has no"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ProvisioningError::MissingAccessToken.to_string(),
            "store created but no access token"
        );
        assert_eq!(
            ProvisioningError::Superseded {
                expected: JobStatus::Pending
            }
            .to_string(),
            "job is no longer pending"
        );
    }
}
