//! Store job maintenance.
//!
//! # Usage
//!
//! ```bash
//! md-cli jobs expire-stale
//! md-cli jobs expire-stale --minutes 90
//! ```
//!
//! # Environment Variables
//!
//! - `JOB_STALE_AFTER_MINUTES` - Default age when `--minutes` is not given (60)
//! - `WEBHOOK_SIGNING_SECRET` - When set, `store.failed` webhooks are sent
//!   for expired jobs

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, warn};

use merchdesk_admin::provisioning::{ProvisioningError, WebhookSender, expire_stale_jobs};

use super::{CliError, connect};

const DEFAULT_STALE_MINUTES: u64 = 60;

#[derive(Debug, Error)]
pub enum JobsError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// `--minutes`, else `JOB_STALE_AFTER_MINUTES`, else 60.
fn stale_minutes(flag: Option<u64>, env: Option<&str>) -> Result<u64, CliError> {
    let minutes = match (flag, env) {
        (Some(minutes), _) => minutes,
        (None, Some(raw)) => raw.trim().parse().map_err(|_| {
            CliError::InvalidEnvVar("JOB_STALE_AFTER_MINUTES", format!("not a number: {raw}"))
        })?,
        (None, None) => DEFAULT_STALE_MINUTES,
    };

    if minutes == 0 {
        return Err(CliError::InvalidEnvVar(
            "JOB_STALE_AFTER_MINUTES",
            "must be at least 1".to_string(),
        ));
    }
    Ok(minutes)
}

/// Fail unfinished jobs that have not progressed within the stale age.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the sweep fails.
pub async fn expire_stale(minutes: Option<u64>) -> Result<(), JobsError> {
    let pool = connect().await?;

    let env = std::env::var("JOB_STALE_AFTER_MINUTES").ok();
    let minutes = stale_minutes(minutes, env.as_deref())?;

    let webhooks = match std::env::var("WEBHOOK_SIGNING_SECRET") {
        Ok(secret) if !secret.is_empty() => {
            let client = reqwest::Client::builder()
                .user_agent(concat!("merchdesk-cli/", env!("CARGO_PKG_VERSION")))
                .build()?;
            Some(WebhookSender::new(client, SecretString::from(secret)))
        }
        _ => {
            warn!("WEBHOOK_SIGNING_SECRET not set, expired jobs will not be notified");
            None
        }
    };

    let older_than = Duration::from_secs(minutes.saturating_mul(60));
    info!(minutes, "Expiring stale store jobs");

    let expired = match &webhooks {
        Some(sender) => expire_stale_jobs(&pool, sender, older_than).await?,
        None => {
            merchdesk_admin::db::jobs::expire_stale(
                &pool,
                older_than,
                merchdesk_admin::provisioning::service::STALE_JOB_MESSAGE,
            )
            .await
            .map_err(CliError::from)?
        }
    };

    info!("Expired {} job(s)", expired.len());
    for job_id in &expired {
        info!("  {job_id}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_minutes_precedence() {
        assert_eq!(stale_minutes(Some(90), Some("30")).unwrap(), 90);
        assert_eq!(stale_minutes(None, Some(" 30 ")).unwrap(), 30);
        assert_eq!(stale_minutes(None, None).unwrap(), DEFAULT_STALE_MINUTES);
    }

    #[test]
    fn test_stale_minutes_rejects_bad_values() {
        assert!(stale_minutes(None, Some("soon")).is_err());
        assert!(stale_minutes(Some(0), None).is_err());
    }
}
