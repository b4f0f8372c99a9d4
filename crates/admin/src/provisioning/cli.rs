//! Shopify CLI invocation for development store creation.

use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::process::Command;
use tracing::instrument;

use crate::config::ProvisioningConfig;
use crate::shopify::normalize_shop_domain;

static MYSHOPIFY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z0-9][a-z0-9-]*\.myshopify\.com)\b").expect("Invalid regex")
});

const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum CliError {
    /// The binary could not be started.
    #[error("failed to start Shopify CLI: {0}")]
    Spawn(#[source] std::io::Error),

    /// Reading the process output failed.
    #[error("Shopify CLI I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// The process ran past the configured timeout and was killed.
    #[error("Shopify CLI timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Non-zero exit.
    #[error("Shopify CLI exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("code {c}")))]
    Failed { code: Option<i32>, stderr: String },

    /// Exit 0, but no store domain in the output.
    #[error("unrecognised Shopify CLI output: {0}")]
    Output(String),
}

/// A store reported by the CLI.
pub struct CreatedStore {
    /// `*.myshopify.com` domain.
    pub shop_domain: String,
    pub admin_url: Option<String>,
    /// Admin API token for populating the store, when the CLI returns one.
    pub access_token: Option<SecretString>,
}

impl std::fmt::Debug for CreatedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedStore")
            .field("shop_domain", &self.shop_domain)
            .field("admin_url", &self.admin_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Arguments passed to the CLI binary.
#[must_use]
pub fn cli_args(store_name: &str, organization: &str) -> Vec<String> {
    [
        "store",
        "create",
        "--name",
        store_name,
        "--organization",
        organization,
        "--store-type",
        "development",
        "--json",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Run `shopify store create` and parse its output.
///
/// The child is killed when the timeout elapses.
///
/// # Errors
///
/// Returns `CliError` if the process cannot be started, times out, exits
/// non-zero, or prints no store domain.
#[instrument(skip(config), fields(cli = %config.cli_path))]
pub async fn create_store(
    config: &ProvisioningConfig,
    store_name: &str,
) -> Result<CreatedStore, CliError> {
    let mut command = Command::new(&config.cli_path);
    command
        .args(cli_args(store_name, &config.partner_org_id))
        .env(
            "SHOPIFY_CLI_PARTNERS_TOKEN",
            config.partners_token.expose_secret(),
        )
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn().map_err(CliError::Spawn)?;

    let output = tokio::time::timeout(config.cli_timeout, child.wait_with_output())
        .await
        .map_err(|_| CliError::Timeout(config.cli_timeout))?
        .map_err(CliError::Io)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        return Err(CliError::Failed {
            code: output.status.code(),
            stderr: tail(&stderr, STDERR_TAIL_LINES),
        });
    }

    if !stderr.trim().is_empty() {
        tracing::debug!(stderr = %tail(&stderr, STDERR_TAIL_LINES), "Shopify CLI stderr");
    }

    parse_cli_output(&stdout)
}

/// Read the created store from CLI stdout.
///
/// Prefers the last JSON object (whole output, or one per line) naming a
/// domain; falls back to the last `*.myshopify.com` token in the text.
///
/// # Errors
///
/// Returns `CliError::Output` if no domain can be found.
pub fn parse_cli_output(stdout: &str) -> Result<CreatedStore, CliError> {
    let whole = serde_json::from_str::<Value>(stdout.trim()).ok();
    let objects = whole.into_iter().chain(
        stdout
            .lines()
            .rev()
            .map(str::trim)
            .filter(|line| line.starts_with('{'))
            .filter_map(|line| serde_json::from_str::<Value>(line).ok()),
    );

    for value in objects {
        let Some(object) = value.as_object() else {
            continue;
        };
        // some CLI versions nest the result under "store"
        let object = object
            .get("store")
            .and_then(Value::as_object)
            .unwrap_or(object);

        if let Some(domain) = field(object, &["shopDomain", "domain", "shop_domain"]) {
            let shop_domain =
                normalize_shop_domain(domain).map_err(|e| CliError::Output(e.to_string()))?;
            return Ok(CreatedStore {
                shop_domain,
                admin_url: field(object, &["adminUrl", "admin_url"]).map(str::to_string),
                access_token: field(object, &["accessToken", "access_token"])
                    .map(|t| SecretString::from(t.to_string())),
            });
        }
    }

    MYSHOPIFY_RE
        .captures_iter(stdout)
        .last()
        .map(|caps| CreatedStore {
            shop_domain: caps[1].to_ascii_lowercase(),
            admin_url: None,
            access_token: None,
        })
        .ok_or_else(|| CliError::Output(tail(stdout, 5)))
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim_end().lines().collect();
    all.iter()
        .skip(all.len().saturating_sub(lines))
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
}
