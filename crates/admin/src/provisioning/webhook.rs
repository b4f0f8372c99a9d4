//! Signed webhook delivery for finished store jobs.
//!
//! Receivers verify `X-Merchdesk-Signature` as
//! `sha256=hex(HMAC-SHA256(secret, "{X-Merchdesk-Timestamp}.{body}"))`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use merchdesk_core::{JobId, JobStatus, TenantId};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use tracing::instrument;

use crate::db::jobs::StoreJob;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-Merchdesk-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Merchdesk-Timestamp";

/// Backoff before each retry; the first attempt is immediate.
pub const RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook endpoint returned {0}")]
    Status(u16),

    #[error("webhook payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Body POSTed for a job that reached a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    /// `store.completed` or `store.failed`.
    pub event: &'static str,
    pub job_id: JobId,
    pub tenant_id: TenantId,
    pub status: JobStatus,
    pub store_name: String,
    pub store_domain: Option<String>,
    pub admin_url: Option<String>,
    pub error: Option<String>,
    pub report: Option<serde_json::Value>,
    pub occurred_at: DateTime<Utc>,
}

impl WebhookPayload {
    /// Payload for a terminal job; `None` while the job is still running.
    #[must_use]
    pub fn for_job(job: &StoreJob) -> Option<Self> {
        let event = match job.status {
            JobStatus::Completed => "store.completed",
            JobStatus::Failed => "store.failed",
            _ => return None,
        };

        Some(Self {
            event,
            job_id: job.id,
            tenant_id: job.tenant_id,
            status: job.status,
            store_name: job.store_name.clone(),
            store_domain: job.store_domain.clone(),
            admin_url: job.admin_url.clone(),
            error: job.error_message.clone(),
            report: job.report.clone(),
            occurred_at: job.finished_at.unwrap_or(job.updated_at),
        })
    }
}

/// Result of a delivery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub attempts: u32,
    pub delivered: bool,
    pub last_error: Option<String>,
}

/// `sha256=<hex>` signature of `"{timestamp}.{body}"`.
#[must_use]
pub fn sign(secret: &[u8], timestamp: i64, body: &[u8]) -> String {
    let mut message = format!("{timestamp}.").into_bytes();
    message.extend_from_slice(body);
    format!("sha256={}", hmac_hex(secret, &message))
}

fn hmac_hex(secret: &[u8], message: &[u8]) -> String {
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Delivers signed webhooks with retry.
#[derive(Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
    secret: SecretString,
    delays: Vec<Duration>,
}

impl std::fmt::Debug for WebhookSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSender")
            .field("secret", &"[REDACTED]")
            .field("delays", &self.delays)
            .finish_non_exhaustive()
    }
}

impl WebhookSender {
    #[must_use]
    pub fn new(client: reqwest::Client, secret: SecretString) -> Self {
        Self {
            client,
            secret,
            delays: RETRY_DELAYS.to_vec(),
        }
    }

    /// Replace the retry schedule.
    #[must_use]
    pub fn with_delays(mut self, delays: Vec<Duration>) -> Self {
        self.delays = delays;
        self
    }

    /// POST the payload, retrying on transport errors and non-2xx responses.
    ///
    /// Never fails: the outcome says whether any attempt succeeded.
    #[instrument(skip(self, payload), fields(job_id = %payload.job_id, event = payload.event))]
    pub async fn deliver(&self, url: &str, payload: &WebhookPayload) -> DeliveryOutcome {
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                let error = WebhookError::from(e);
                tracing::error!(error = %error, "Webhook not sent");
                return DeliveryOutcome {
                    attempts: 0,
                    delivered: false,
                    last_error: Some(error.to_string()),
                };
            }
        };

        let mut attempts = 0;
        let mut delays = self.delays.iter();

        let last_error = loop {
            attempts += 1;
            let error = match self.send(url, &body).await {
                Ok(()) => {
                    tracing::info!(attempts, "Webhook delivered");
                    return DeliveryOutcome {
                        attempts,
                        delivered: true,
                        last_error: None,
                    };
                }
                Err(e) => e,
            };
            tracing::warn!(attempts, error = %error, "Webhook attempt failed");

            let Some(delay) = delays.next() else {
                break error.to_string();
            };
            tokio::time::sleep(*delay).await;
        };

        tracing::error!(attempts, "Webhook delivery gave up");
        DeliveryOutcome {
            attempts,
            delivered: false,
            last_error: Some(last_error),
        }
    }

    async fn send(&self, url: &str, body: &[u8]) -> Result<(), WebhookError> {
        let timestamp = Utc::now().timestamp();
        let signature = sign(self.secret.expose_secret().as_bytes(), timestamp, body);

        let response = self
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(TIMESTAMP_HEADER, timestamp.to_string())
            .header(SIGNATURE_HEADER, signature)
            .body(body.to_vec())
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(WebhookError::Status(status.as_u16()))
        }
    }
}
