//! Shopify Admin REST API client.
//!
//! # Security
//!
//! Access tokens are per-shop and grant write access to the store. They
//! come from the tenant's stored connection or from a freshly provisioned
//! development store and are only ever held in a `SecretString`.
//!
//! # API Reference
//!
//! - Base URL: `https://{shop}/admin/api/{version}`
//! - Authentication: `X-Shopify-Access-Token` header
//! - Pagination: cursor based, `page_info` in the `Link` response header

mod client;
mod types;

pub use client::ShopifyClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Shopify rejected the input (422).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access token missing, revoked or lacking scope.
    #[error("Unauthorized: invalid access token")]
    Unauthorized,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Shop domain is not a valid hostname.
    #[error("Invalid shop domain: {0}")]
    InvalidDomain(String),
}

/// Normalise a shop domain.
///
/// Accepts `my-shop`, `my-shop.myshopify.com` or a full URL and returns the
/// bare lowercase hostname.
///
/// # Errors
///
/// Returns `ShopifyError::InvalidDomain` for anything that is not a hostname.
pub fn normalize_shop_domain(raw: &str) -> Result<String, ShopifyError> {
    let trimmed = raw.trim().to_ascii_lowercase();
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(&trimmed)
        .trim_end_matches('/');

    let valid = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !host.starts_with(['-', '.'])
        && !host.ends_with(['-', '.']);

    if !valid {
        return Err(ShopifyError::InvalidDomain(raw.to_string()));
    }

    if host.contains('.') {
        Ok(host.to_string())
    } else {
        Ok(format!("{host}.myshopify.com"))
    }
}

/// Extract the `page_info` cursors from a `Link` header.
///
/// Returns `(next, previous)`.
#[must_use]
pub fn parse_link_header(header: &str) -> (Option<String>, Option<String>) {
    let mut next = None;
    let mut previous = None;

    for part in header.split(',') {
        let mut pieces = part.split(';');
        let Some(target) = pieces.next() else {
            continue;
        };
        let target = target.trim().trim_start_matches('<').trim_end_matches('>');

        let rel = pieces
            .filter_map(|p| p.trim().strip_prefix("rel="))
            .map(|r| r.trim_matches('"'))
            .next();

        let page_info = url::Url::parse(target).ok().and_then(|u| {
            u.query_pairs()
                .find(|(k, _)| k == "page_info")
                .map(|(_, v)| v.into_owned())
        });

        match rel {
            Some("next") => next = page_info,
            Some("previous") => previous = page_info,
            _ => {}
        }
    }

    (next, previous)
}

/// Flatten a 422 `errors` value into one message.
///
/// Shopify returns either a string, a list of strings, or an object of
/// field name to list of messages.
pub(crate) fn flatten_errors(errors: &serde_json::Value) -> String {
    match errors {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(flatten_errors)
            .collect::<Vec<_>>()
            .join("; "),
        serde_json::Value::Object(fields) => fields
            .iter()
            .map(|(field, messages)| format!("{field} {}", flatten_errors(messages)))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_shop_domain() {
        assert_eq!(normalize_shop_domain("my-shop").unwrap(), "my-shop.myshopify.com");
        assert_eq!(
            normalize_shop_domain("https://My-Shop.myshopify.com/").unwrap(),
            "my-shop.myshopify.com"
        );
        assert!(normalize_shop_domain("").is_err());
        assert!(normalize_shop_domain("shop/admin?x=1").is_err());
        assert!(normalize_shop_domain("-shop").is_err());
    }

    #[test]
    fn test_parse_link_header_both_directions() {
        let header = r#"<https://shop.myshopify.com/admin/api/2025-01/products.json?limit=50&page_info=prevCursor>; rel="previous", <https://shop.myshopify.com/admin/api/2025-01/products.json?limit=50&page_info=nextCursor>; rel="next""#;
        let (next, previous) = parse_link_header(header);
        assert_eq!(next.as_deref(), Some("nextCursor"));
        assert_eq!(previous.as_deref(), Some("prevCursor"));
    }

    #[test]
    fn test_parse_link_header_next_only() {
        let header = r#"<https://shop.myshopify.com/admin/api/2025-01/products.json?page_info=abc&limit=10>; rel="next""#;
        assert_eq!(parse_link_header(header), (Some("abc".to_string()), None));
        assert_eq!(parse_link_header(""), (None, None));
    }

    #[test]
    fn test_flatten_errors() {
        let errors = serde_json::json!({"title": ["can't be blank"], "handle": ["is taken"]});
        let message = flatten_errors(&errors);
        assert!(message.contains("title can't be blank"));
        assert!(message.contains("handle is taken"));

        assert_eq!(flatten_errors(&serde_json::json!("Not Found")), "Not Found");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ShopifyError::RateLimited(2).to_string(),
            "Rate limited, retry after 2 seconds"
        );
    }
}
