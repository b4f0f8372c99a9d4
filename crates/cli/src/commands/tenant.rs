//! Tenant management commands.
//!
//! # Usage
//!
//! ```bash
//! md-cli tenant create -n "Acme Retail"
//! md-cli tenant import tenants.yaml
//! md-cli tenant rotate-key --id 2f0c6a0e-6c1f-4a53-9d6b-1f2b8f0f1c2d
//! md-cli tenant list
//! ```
//!
//! # Import file
//!
//! ```yaml
//! tenants:
//!   - name: Acme Retail
//!     webhook_url: https://hooks.acme.test/merchdesk
//!     connections:
//!       - platform: woocommerce
//!         base_url: https://shop.acme.test
//!         username: ck_0123
//!         secret: cs_4567
//!       - platform: shopify
//!         base_url: acme-retail
//!         secret: shpat_89ab
//! ```
//!
//! Every imported tenant gets a fresh API key, printed once.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use merchdesk_admin::db::connections::{self, UpsertConnection};
use merchdesk_admin::db::tenants;
use merchdesk_admin::middleware::{generate_api_key, hash_api_key};
use merchdesk_admin::provisioning::service::validate_webhook_url;
use merchdesk_admin::routes::tenant::{ConnectionRequest, normalize_connection};
use merchdesk_core::{Platform, TenantId};

use super::{CliError, connect};

#[derive(Debug, Error)]
pub enum TenantError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error("Invalid tenant: {0}")]
    Invalid(String),

    #[error("Failed to read {0}: {1}")]
    Io(String, std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Validation(usize),
}

impl From<merchdesk_admin::db::RepositoryError> for TenantError {
    fn from(e: merchdesk_admin::db::RepositoryError) -> Self {
        Self::Cli(CliError::Repository(e))
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportFile {
    pub tenants: Vec<TenantSpec>,
}

#[derive(Debug, Deserialize)]
pub struct TenantSpec {
    pub name: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub connections: Vec<ConnectionSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectionSpec {
    pub platform: Platform,
    pub base_url: String,
    #[serde(default)]
    pub username: Option<String>,
    pub secret: String,
}

/// A tenant that passed validation, with normalised connection URLs.
#[derive(Debug, PartialEq, Eq)]
pub struct PreparedTenant {
    pub name: String,
    pub webhook_url: Option<String>,
    pub connections: Vec<PreparedConnection>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PreparedConnection {
    pub platform: Platform,
    pub base_url: String,
    pub username: Option<String>,
    pub secret: String,
}

fn check_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("tenant name is empty".to_string());
    }
    Ok(name.to_string())
}

fn check_webhook(url: Option<&str>) -> Result<Option<String>, String> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => validate_webhook_url(url)
            .map(|()| Some(url.to_string()))
            .map_err(|e| e.to_string()),
        None => Ok(None),
    }
}

/// Validate every tenant and connection, collecting all problems.
///
/// # Errors
///
/// Returns one message per problem, prefixed with the tenant name.
pub fn prepare(file: ImportFile) -> Result<Vec<PreparedTenant>, Vec<String>> {
    let mut errors = Vec::new();
    let mut prepared = Vec::with_capacity(file.tenants.len());

    for (index, spec) in file.tenants.into_iter().enumerate() {
        let label = if spec.name.trim().is_empty() {
            format!("tenant #{}", index + 1)
        } else {
            spec.name.trim().to_string()
        };

        let name = check_name(&spec.name).map_err(|e| errors.push(format!("{label}: {e}")));
        let webhook_url = check_webhook(spec.webhook_url.as_deref())
            .map_err(|e| errors.push(format!("{label}: {e}")));

        let mut seen = HashSet::new();
        let mut connections = Vec::with_capacity(spec.connections.len());
        for connection in spec.connections {
            if !seen.insert(connection.platform) {
                errors.push(format!(
                    "{label}: duplicate {} connection",
                    connection.platform
                ));
                continue;
            }
            let request = ConnectionRequest {
                base_url: connection.base_url,
                username: connection.username,
                secret: connection.secret,
            };
            match normalize_connection(connection.platform, &request) {
                Ok((base_url, username)) => connections.push(PreparedConnection {
                    platform: connection.platform,
                    base_url,
                    username,
                    secret: request.secret.trim().to_string(),
                }),
                Err(e) => errors.push(format!("{label}: {}: {e}", connection.platform)),
            }
        }

        if let (Ok(name), Ok(webhook_url)) = (name, webhook_url) {
            prepared.push(PreparedTenant {
                name,
                webhook_url,
                connections,
            });
        }
    }

    if errors.is_empty() {
        Ok(prepared)
    } else {
        Err(errors)
    }
}

#[allow(clippy::print_stdout)]
fn print_key(name: &str, id: TenantId, key: &str) {
    println!("{name} ({id})");
    println!("  API key: {key}");
}

/// Create a tenant and print its API key.
///
/// # Errors
///
/// Returns an error if the name or webhook URL is invalid or the insert fails.
pub async fn create(name: &str, webhook_url: Option<&str>) -> Result<TenantId, TenantError> {
    let name = check_name(name).map_err(TenantError::Invalid)?;
    let webhook_url = check_webhook(webhook_url).map_err(TenantError::Invalid)?;

    let pool = connect().await?;

    let key = generate_api_key();
    let tenant = tenants::create(&pool, &name, &hash_api_key(&key), webhook_url.as_deref()).await?;

    info!(tenant_id = %tenant.id, "Tenant created");
    print_key(&tenant.name, tenant.id, &key);
    tracing::warn!("The API key is shown only once. Store it now.");

    Ok(tenant.id)
}

/// Import tenants and connections from a YAML file.
///
/// The whole file is validated before anything is written.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn import(file_path: &str) -> Result<(), TenantError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading tenants from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TenantError::Io(file_path.to_string(), e))?;
    let file: ImportFile = serde_yaml::from_str(&content)?;
    info!(tenants = file.tenants.len(), "Parsed import file");

    let prepared = prepare(file).map_err(|errors| {
        error!("Import validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        TenantError::Validation(errors.len())
    })?;

    let pool = connect().await?;

    for spec in prepared {
        let key = generate_api_key();
        let tenant =
            tenants::create(&pool, &spec.name, &hash_api_key(&key), spec.webhook_url.as_deref())
                .await?;

        for connection in &spec.connections {
            connections::upsert(
                &pool,
                UpsertConnection {
                    tenant_id: tenant.id,
                    platform: connection.platform,
                    base_url: &connection.base_url,
                    username: connection.username.as_deref(),
                    secret: &connection.secret,
                },
            )
            .await?;
        }

        info!(
            tenant_id = %tenant.id,
            connections = spec.connections.len(),
            "Tenant imported"
        );
        print_key(&tenant.name, tenant.id, &key);
    }

    tracing::warn!("API keys are shown only once. Store them now.");
    Ok(())
}

/// Replace a tenant's API key and print the new one.
///
/// # Errors
///
/// Returns an error if the tenant does not exist.
pub async fn rotate_key(id: TenantId) -> Result<(), TenantError> {
    let pool = connect().await?;

    let tenant = tenants::get(&pool, id)
        .await?
        .ok_or_else(|| TenantError::Invalid(format!("no tenant with id {id}")))?;

    let key = generate_api_key();
    tenants::rotate_api_key(&pool, id, &hash_api_key(&key)).await?;

    info!(tenant_id = %id, "API key rotated; the old key no longer works");
    print_key(&tenant.name, tenant.id, &key);
    Ok(())
}

/// List tenants with their connected platforms.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub async fn list() -> Result<(), TenantError> {
    let pool = connect().await?;
    let all = tenants::list(&pool).await?;

    info!("Tenants: {}", all.len());
    for tenant in all {
        let platforms = connections::list_for_tenant(&pool, tenant.id)
            .await?
            .into_iter()
            .map(|c| c.platform.to_string())
            .collect::<Vec<_>>();
        info!(
            "  {} {} [{}]{}",
            tenant.id,
            tenant.name,
            platforms.join(", "),
            tenant
                .webhook_url
                .map(|url| format!(" webhook={url}"))
                .unwrap_or_default()
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ImportFile {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_prepare_normalises_connections() {
        let file = parse(
            r"
tenants:
  - name: ' Acme Retail '
    webhook_url: https://hooks.acme.test/merchdesk
    connections:
      - platform: woocommerce
        base_url: https://shop.acme.test/
        username: ck_0123
        secret: cs_4567
      - platform: shopify
        base_url: Acme-Retail
        secret: shpat_89ab
",
        );

        let prepared = prepare(file).unwrap();
        assert_eq!(prepared.len(), 1);
        let tenant = prepared.first().unwrap();
        assert_eq!(tenant.name, "Acme Retail");
        assert_eq!(
            tenant.webhook_url.as_deref(),
            Some("https://hooks.acme.test/merchdesk")
        );
        assert_eq!(
            tenant.connections,
            vec![
                PreparedConnection {
                    platform: Platform::WooCommerce,
                    base_url: "https://shop.acme.test".to_string(),
                    username: Some("ck_0123".to_string()),
                    secret: "cs_4567".to_string(),
                },
                PreparedConnection {
                    platform: Platform::Shopify,
                    base_url: "acme-retail.myshopify.com".to_string(),
                    username: None,
                    secret: "shpat_89ab".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_prepare_collects_every_error() {
        let file = parse(
            r"
tenants:
  - name: ''
  - name: Beta
    webhook_url: ftp://hooks.beta.test
    connections:
      - platform: wordpress
        base_url: https://blog.beta.test
        secret: abcd efgh
      - platform: wordpress
        base_url: https://blog.beta.test
        username: editor
        secret: abcd efgh
",
        );

        let errors = prepare(file).unwrap_err();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("tenant #1")));
        assert!(errors.iter().any(|e| e.contains("duplicate wordpress")));
    }

    #[test]
    fn test_unknown_platform_fails_to_parse() {
        let result: Result<ImportFile, _> = serde_yaml::from_str(
            "tenants:\n  - name: A\n    connections:\n      - platform: magento\n        base_url: x\n        secret: y\n",
        );
        assert!(result.is_err());
    }
}
