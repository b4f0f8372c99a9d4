//! WordPress REST API client.
//!
//! # API Reference
//!
//! - Base URL: `{site}/wp-json/wp/v2`
//! - Authentication: HTTP basic auth with an application password
//! - Raw (unrendered) fields are requested with `context=edit`

mod types;

pub use types::*;

use std::sync::Arc;

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use merchdesk_core::WpPostId;

const API_PREFIX: &str = "/wp-json/wp/v2";

/// Errors that can occur when interacting with the WordPress API.
#[derive(Debug, Error)]
pub enum WpError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Rate limited by the site (or its host).
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Application password rejected.
    #[error("Unauthorized: invalid username or application password")]
    Unauthorized,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Site URL is not a valid http(s) URL.
    #[error("Invalid site URL: {0}")]
    InvalidUrl(String),
}

/// WordPress API client for one site.
#[derive(Clone)]
pub struct WpClient {
    inner: Arc<WpClientInner>,
}

struct WpClientInner {
    client: reqwest::Client,
    base_url: String,
    username: String,
    app_password: SecretString,
}

impl WpClient {
    /// Create a client for the site at `site_url`.
    ///
    /// # Errors
    ///
    /// Returns `WpError::InvalidUrl` if `site_url` is not an http(s) URL.
    pub fn new(
        client: reqwest::Client,
        site_url_raw: &str,
        username: &str,
        app_password: SecretString,
    ) -> Result<Self, WpError> {
        let site = site_url(site_url_raw).map_err(WpError::InvalidUrl)?;

        Ok(Self {
            inner: Arc::new(WpClientInner {
                client,
                base_url: format!("{site}{API_PREFIX}"),
                username: username.to_string(),
                app_password,
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// List posts.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    pub async fn list_posts(&self, params: &WpListParams) -> Result<Paged<WpPost>, WpError> {
        self.list(ContentKind::Posts, params).await
    }

    /// Get a post with raw content.
    ///
    /// # Errors
    ///
    /// Returns `WpError::NotFound` if the post does not exist.
    pub async fn get_post(&self, id: WpPostId) -> Result<WpPost, WpError> {
        self.get_item(ContentKind::Posts, id).await
    }

    /// Create a post.
    ///
    /// # Errors
    ///
    /// Returns error if WordPress rejects the post.
    #[instrument(skip(self, input), fields(site = %self.inner.base_url))]
    pub async fn create_post(&self, input: &PostInput) -> Result<WpPost, WpError> {
        let response = self
            .request(reqwest::Method::POST, "/posts")
            .json(input)
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    /// Update a post. Fields left as `None` are unchanged.
    ///
    /// # Errors
    ///
    /// Returns error if the post does not exist or the update is rejected.
    pub async fn update_post(&self, id: WpPostId, input: &PostInput) -> Result<WpPost, WpError> {
        self.update_item(ContentKind::Posts, id, input).await
    }

    /// List pages.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    pub async fn list_pages(&self, params: &WpListParams) -> Result<Paged<WpPost>, WpError> {
        self.list(ContentKind::Pages, params).await
    }

    /// Get a page with raw content.
    ///
    /// # Errors
    ///
    /// Returns `WpError::NotFound` if the page does not exist.
    pub async fn get_page(&self, id: WpPostId) -> Result<WpPost, WpError> {
        self.get_item(ContentKind::Pages, id).await
    }

    /// Update a page.
    ///
    /// # Errors
    ///
    /// Returns error if the page does not exist or the update is rejected.
    pub async fn update_page(&self, id: WpPostId, input: &PostInput) -> Result<WpPost, WpError> {
        self.update_item(ContentKind::Pages, id, input).await
    }

    /// Get a post or page by kind.
    ///
    /// # Errors
    ///
    /// Returns `WpError::NotFound` if it does not exist.
    #[instrument(skip(self), fields(site = %self.inner.base_url))]
    pub async fn get_item(&self, kind: ContentKind, id: WpPostId) -> Result<WpPost, WpError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/{kind}/{id}"))
            .query(&[("context", "edit")])
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    /// Get a media library item.
    ///
    /// # Errors
    ///
    /// Returns `WpError::NotFound` if the attachment does not exist.
    #[instrument(skip(self), fields(site = %self.inner.base_url))]
    pub async fn get_media(&self, id: i64) -> Result<WpMedia, WpError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/media/{id}"))
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    /// Write registered custom fields on a post or page.
    ///
    /// Only keys present in `meta` are touched.
    ///
    /// # Errors
    ///
    /// Returns error if the item does not exist or a key is not registered
    /// for REST access.
    #[instrument(skip(self, meta), fields(site = %self.inner.base_url, keys = meta.len()))]
    pub async fn update_meta(
        &self,
        kind: ContentKind,
        id: WpPostId,
        meta: serde_json::Map<String, serde_json::Value>,
    ) -> Result<WpPost, WpError> {
        let input = PostInput {
            meta: Some(meta),
            ..PostInput::default()
        };
        self.update_item(kind, id, &input).await
    }

    #[instrument(skip(self, params), fields(site = %self.inner.base_url))]
    async fn list(&self, kind: ContentKind, params: &WpListParams) -> Result<Paged<WpPost>, WpError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/{kind}"))
            .query(&params.to_query())
            .send()
            .await?;

        let response = check_status(response).await?;
        let (total, total_pages) = parse_totals(response.headers());
        let items: Vec<WpPost> = parse_json(response).await?;

        Ok(Paged {
            items,
            page: params.page(),
            per_page: params.per_page(),
            total,
            total_pages,
        })
    }

    #[instrument(skip(self, input), fields(site = %self.inner.base_url))]
    async fn update_item(
        &self,
        kind: ContentKind,
        id: WpPostId,
        input: &PostInput,
    ) -> Result<WpPost, WpError> {
        let response = self
            .request(reqwest::Method::POST, &format!("/{kind}/{id}"))
            .query(&[("context", "edit")])
            .json(input)
            .send()
            .await?;

        parse_json(check_status(response).await?).await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}{path}", self.inner.base_url))
            .basic_auth(
                &self.inner.username,
                Some(self.inner.app_password.expose_secret()),
            )
    }
}

impl std::fmt::Debug for WpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WpClient")
            .field("base_url", &self.inner.base_url)
            .field("username", &self.inner.username)
            .field("app_password", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Normalise a site URL: http(s) only, no trailing slash, no query.
///
/// WordPress may live in a subdirectory, so the path is kept.
pub(crate) fn site_url(raw: &str) -> Result<String, String> {
    let parsed = url::Url::parse(raw.trim()).map_err(|e| format!("{raw}: {e}"))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(format!("{raw}: expected an http(s) URL"));
    }

    let mut site = format!(
        "{}://{}",
        parsed.scheme(),
        parsed.host_str().unwrap_or_default()
    );
    if let Some(port) = parsed.port() {
        site.push_str(&format!(":{port}"));
    }
    site.push_str(parsed.path().trim_end_matches('/'));

    Ok(site)
}

/// Read `X-WP-Total` and `X-WP-TotalPages`; missing headers read as zero.
pub(crate) fn parse_totals(headers: &HeaderMap) -> (u64, u32) {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0)
    };

    let total = read("X-WP-Total");
    let total_pages = u32::try_from(read("X-WP-TotalPages")).unwrap_or(u32::MAX);
    (total, total_pages)
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WpError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(WpError::RateLimited(retry_after));
    }

    if status == 401 || status == 403 {
        return Err(WpError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    Err(error_from_body(status, &body))
}

fn error_from_body(status: u16, body: &str) -> WpError {
    match serde_json::from_str::<WpErrorBody>(body) {
        Ok(err) if status == 404 => WpError::NotFound(err.message),
        Ok(err) => WpError::Api {
            status,
            code: err.code,
            message: err.message,
        },
        Err(_) if status == 404 => WpError::NotFound("Resource not found".to_string()),
        Err(_) => WpError::Api {
            status,
            code: "unknown".to_string(),
            message: body.chars().take(500).collect(),
        },
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WpError> {
    response
        .json()
        .await
        .map_err(|e| WpError::Parse(format!("Failed to parse response: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_site_url_normalisation() {
        assert_eq!(
            site_url("https://blog.example.com/").unwrap(),
            "https://blog.example.com"
        );
        assert_eq!(
            site_url("http://example.com:8080/wordpress/?x=1").unwrap(),
            "http://example.com:8080/wordpress"
        );
        assert!(site_url("example.com").is_err());
        assert!(site_url("mailto:admin@example.com").is_err());
    }

    #[test]
    fn test_parse_totals() {
        let mut headers = HeaderMap::new();
        headers.insert("X-WP-Total", HeaderValue::from_static("137"));
        headers.insert("X-WP-TotalPages", HeaderValue::from_static("7"));
        assert_eq!(parse_totals(&headers), (137, 7));
        assert_eq!(parse_totals(&HeaderMap::new()), (0, 0));
    }

    #[test]
    fn test_error_from_body() {
        let body = r#"{"code":"rest_post_invalid_id","message":"Invalid post ID.","data":{"status":404}}"#;
        assert!(matches!(error_from_body(404, body), WpError::NotFound(_)));

        let body = r#"{"code":"rest_invalid_param","message":"Invalid parameter(s): meta"}"#;
        assert!(matches!(
            error_from_body(400, body),
            WpError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_client_base_url() {
        let client = WpClient::new(
            reqwest::Client::new(),
            "https://blog.example.com",
            "editor",
            SecretString::from("abcd efgh ijkl"),
        )
        .unwrap();
        assert_eq!(client.base_url(), "https://blog.example.com/wp-json/wp/v2");
        assert!(!format!("{client:?}").contains("abcd"));
    }
}
