//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::ai::{AiClient, AiError};
use crate::config::AdminConfig;
use crate::db::tenants::Tenant;
use crate::provisioning::{ProvisioningService, WebhookSender};

/// Outbound timeout for WooCommerce, WordPress and Shopify requests.
const PLATFORM_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TENANT_CACHE_CAPACITY: u64 = 10_000;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    http: reqwest::Client,
    ai: AiClient,
    provisioning: ProvisioningService,
    /// API key hash → tenant.
    tenants: Cache<String, Tenant>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the AI or HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .timeout(PLATFORM_REQUEST_TIMEOUT)
            .user_agent(concat!("merchdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let ai = AiClient::new(&config.ai)?;

        let webhooks = WebhookSender::new(http.clone(), config.webhooks.signing_secret.clone());
        let provisioning = ProvisioningService::new(
            pool.clone(),
            config.provisioning.clone(),
            ai.clone(),
            http.clone(),
            config.shopify.api_version.clone(),
            webhooks,
            config.job_stale_after,
        );

        let tenants = Cache::builder()
            .max_capacity(TENANT_CACHE_CAPACITY)
            .time_to_live(config.tenant_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                http,
                ai,
                provisioning,
                tenants,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Shared HTTP client for platform API calls.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    #[must_use]
    pub fn ai(&self) -> &AiClient {
        &self.inner.ai
    }

    #[must_use]
    pub fn provisioning(&self) -> &ProvisioningService {
        &self.inner.provisioning
    }

    /// Tenant lookup cache keyed by API key hash.
    #[must_use]
    pub fn tenant_cache(&self) -> &Cache<String, Tenant> {
        &self.inner.tenants
    }
}
