//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERCHDESK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `MERCHDESK_BASE_URL` - Public URL of the admin backend
//! - `AI_API_KEY` - Generative AI provider API key
//! - `WEBHOOK_SIGNING_SECRET` - HMAC secret for outgoing job webhooks
//!
//! ## Optional
//! - `MERCHDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `MERCHDESK_PORT` - Listen port (default: 3001)
//! - `AI_MODEL` - Model ID (default: claude-sonnet-4-20250514)
//! - `AI_API_URL` - Messages endpoint (default: Anthropic)
//! - `SHOPIFY_API_VERSION` - Shopify Admin REST API version (default: 2025-01)
//! - `JOB_STALE_AFTER_MINUTES` - Active jobs older than this are failed (default: 60)
//! - `TENANT_CACHE_TTL_SECS` - API key lookup cache TTL (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (Shopify store provisioning)
//! - `SHOPIFY_CLI_PATH` - Path to the Shopify CLI binary (default: shopify)
//! - `SHOPIFY_PARTNER_ORG_ID` - Partner organization that owns created stores
//! - `SHOPIFY_CLI_PARTNERS_TOKEN` - Partner CLI token passed to the child process
//! - `SHOPIFY_CLI_TIMEOUT_SECS` - CLI timeout (default: 300)
//!
//! ## Optional (TLS)
//! - `MERCHDESK_TLS_CERT` - PEM-encoded certificate chain
//! - `MERCHDESK_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_AI_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_AI_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_SHOPIFY_API_VERSION: &str = "2025-01";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin backend
    pub base_url: String,
    /// Generative AI configuration
    pub ai: AiConfig,
    /// Shopify REST settings shared by all tenants
    pub shopify: ShopifyConfig,
    /// Store provisioning (disabled when the partner credentials are absent)
    pub provisioning: Option<ProvisioningConfig>,
    /// Outgoing webhook signing
    pub webhooks: WebhookConfig,
    /// Active jobs older than this are considered stuck
    pub job_stale_after: Duration,
    /// TTL of the API key → tenant cache
    pub tenant_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Generative AI provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct AiConfig {
    /// Provider API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Messages endpoint URL
    pub api_url: String,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Shopify Admin REST settings.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// Shopify API version (e.g., 2025-01)
    pub api_version: String,
}

/// Shopify CLI settings for development store creation.
///
/// Implements `Debug` manually to redact the partner token.
#[derive(Clone)]
pub struct ProvisioningConfig {
    /// Shopify CLI executable
    pub cli_path: String,
    /// Partner organization ID
    pub partner_org_id: String,
    /// Partner CLI token (HIGH PRIVILEGE - can create stores)
    pub partners_token: SecretString,
    /// Maximum CLI run time
    pub cli_timeout: Duration,
}

impl std::fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningConfig")
            .field("cli_path", &self.cli_path)
            .field("partner_org_id", &self.partner_org_id)
            .field("partners_token", &"[REDACTED]")
            .field("cli_timeout", &self.cli_timeout)
            .finish()
    }
}

/// Outgoing webhook configuration.
///
/// Implements `Debug` manually to redact the signing secret.
#[derive(Clone)]
pub struct WebhookConfig {
    /// HMAC-SHA256 signing secret
    pub signing_secret: SecretString,
}

impl std::fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("MERCHDESK_TLS_CERT");
        let key_pem = get_optional_env("MERCHDESK_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "MERCHDESK_TLS_*".to_string(),
                "Both MERCHDESK_TLS_CERT and MERCHDESK_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("MERCHDESK_DATABASE_URL")?;
        let host = get_env_or_default("MERCHDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MERCHDESK_HOST".to_string(), e.to_string()))?;
        let port = parse_env("MERCHDESK_PORT", 3001_u16)?;
        let base_url = get_required_env("MERCHDESK_BASE_URL")?;

        let ai = AiConfig::from_env()?;
        let shopify = ShopifyConfig {
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
        };
        let provisioning = ProvisioningConfig::from_env()?;
        let webhooks = WebhookConfig {
            signing_secret: get_validated_secret("WEBHOOK_SIGNING_SECRET")?,
        };
        let job_stale_after = Duration::from_secs(parse_env("JOB_STALE_AFTER_MINUTES", 60_u64)? * 60);
        let tenant_cache_ttl = Duration::from_secs(parse_env("TENANT_CACHE_TTL_SECS", 60_u64)?);

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            ai,
            shopify,
            provisioning,
            webhooks,
            job_stale_after,
            tenant_cache_ttl,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the provisioning configuration, if store creation is enabled.
    #[must_use]
    pub const fn provisioning(&self) -> Option<&ProvisioningConfig> {
        self.provisioning.as_ref()
    }
}

impl AiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret("AI_API_KEY")?,
            model: get_env_or_default("AI_MODEL", DEFAULT_AI_MODEL),
            api_url: get_env_or_default("AI_API_URL", DEFAULT_AI_API_URL),
        })
    }
}

impl ProvisioningConfig {
    /// Load provisioning configuration from environment.
    ///
    /// Returns `None` if neither partner variable is set (store creation disabled).
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let org_id = get_optional_env("SHOPIFY_PARTNER_ORG_ID");
        let token = get_optional_env("SHOPIFY_CLI_PARTNERS_TOKEN");

        match (org_id, token) {
            (Some(partner_org_id), Some(token)) => {
                validate_secret_strength(&token, "SHOPIFY_CLI_PARTNERS_TOKEN")?;
                let timeout_secs = parse_env("SHOPIFY_CLI_TIMEOUT_SECS", 300_u64)?;
                Ok(Some(Self {
                    cli_path: get_env_or_default("SHOPIFY_CLI_PATH", "shopify"),
                    partner_org_id,
                    partners_token: SecretString::from(token),
                    cli_timeout: Duration::from_secs(timeout_secs),
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "SHOPIFY_PARTNER_*".to_string(),
                "Both SHOPIFY_PARTNER_ORG_ID and SHOPIFY_CLI_PARTNERS_TOKEN must be set together"
                    .to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
pub(crate) fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            ai: AiConfig {
                api_key: SecretString::from("sk-ant-test"),
                model: DEFAULT_AI_MODEL.to_string(),
                api_url: DEFAULT_AI_API_URL.to_string(),
            },
            shopify: ShopifyConfig {
                api_version: DEFAULT_SHOPIFY_API_VERSION.to_string(),
            },
            provisioning: None,
            webhooks: WebhookConfig {
                signing_secret: SecretString::from("whsec-test"),
            },
            job_stale_after: Duration::from_secs(3600),
            tenant_cache_ttl: Duration::from_secs(60),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3001);
    }

    #[test]
    fn test_provisioning_disabled_by_default() {
        assert!(test_config().provisioning().is_none());
    }

    #[test]
    fn test_ai_config_debug_redacts_secrets() {
        let config = AiConfig {
            api_key: SecretString::from("sk-ant-super-secret-key"),
            model: DEFAULT_AI_MODEL.to_string(),
            api_url: DEFAULT_AI_API_URL.to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains(DEFAULT_AI_MODEL));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk-ant-super-secret-key"));
    }

    #[test]
    fn test_provisioning_config_debug_redacts_token() {
        let config = ProvisioningConfig {
            cli_path: "shopify".to_string(),
            partner_org_id: "1234567".to_string(),
            partners_token: SecretString::from("atkn_super_secret_partner_token"),
            cli_timeout: Duration::from_secs(300),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("1234567"));
        assert!(!debug_output.contains("atkn_super_secret_partner_token"));
    }
}
