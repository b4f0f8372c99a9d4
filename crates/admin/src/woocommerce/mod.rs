//! WooCommerce REST API client.
//!
//! # API Reference
//!
//! - Base URL: `{store}/wp-json/wc/v3`
//! - Authentication: HTTP basic auth with a consumer key and secret
//! - Pagination: `page`/`per_page` query, totals in `X-WP-Total` and
//!   `X-WP-TotalPages` response headers

mod types;

pub use types::*;

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use merchdesk_core::WooProductId;

use crate::wordpress::{Paged, parse_totals, site_url};

const API_PREFIX: &str = "/wp-json/wc/v3";

/// Errors that can occur when interacting with the WooCommerce API.
#[derive(Debug, Error)]
pub enum WooError {
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

    /// Rate limited by the store (or its host).
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Consumer key/secret rejected.
    #[error("Unauthorized: invalid consumer key or secret")]
    Unauthorized,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Store URL is not a valid http(s) URL.
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

/// WooCommerce API client for one store.
#[derive(Clone)]
pub struct WooClient {
    inner: Arc<WooClientInner>,
}

struct WooClientInner {
    client: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: SecretString,
}

impl WooClient {
    /// Create a client for the store at `store_url`.
    ///
    /// `client` is a shared `reqwest::Client`; cloning it is cheap.
    ///
    /// # Errors
    ///
    /// Returns `WooError::InvalidUrl` if `store_url` is not an http(s) URL.
    pub fn new(
        client: reqwest::Client,
        store_url: &str,
        consumer_key: &str,
        consumer_secret: SecretString,
    ) -> Result<Self, WooError> {
        let site = site_url(store_url).map_err(WooError::InvalidUrl)?;

        Ok(Self {
            inner: Arc::new(WooClientInner {
                client,
                base_url: format!("{site}{API_PREFIX}"),
                consumer_key: consumer_key.to_string(),
                consumer_secret,
            }),
        })
    }

    /// Base URL of the REST API, e.g. `https://shop.example/wp-json/wc/v3`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// List products, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(store = %self.inner.base_url))]
    pub async fn list_products(&self, params: &ListParams) -> Result<Paged<WooProduct>, WooError> {
        let response = self
            .request(reqwest::Method::GET, "/products")
            .query(&params.to_query())
            .send()
            .await?;

        let response = check_status(response).await?;
        let (total, total_pages) = parse_totals(response.headers());
        let items: Vec<WooProduct> = parse_json(response).await?;

        Ok(Paged {
            items,
            page: params.page(),
            per_page: params.per_page(),
            total,
            total_pages,
        })
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(store = %self.inner.base_url))]
    pub async fn get_product(&self, id: WooProductId) -> Result<WooProduct, WooError> {
        self.get(&format!("/products/{id}")).await
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns error if WooCommerce rejects the product.
    #[instrument(skip(self, input), fields(store = %self.inner.base_url))]
    pub async fn create_product(&self, input: &ProductInput) -> Result<WooProduct, WooError> {
        self.send_json(reqwest::Method::POST, "/products", input)
            .await
    }

    /// Update a product. Fields left as `None` are unchanged.
    ///
    /// # Errors
    ///
    /// Returns error if the product does not exist or the update is rejected.
    #[instrument(skip(self, input), fields(store = %self.inner.base_url))]
    pub async fn update_product(
        &self,
        id: WooProductId,
        input: &ProductInput,
    ) -> Result<WooProduct, WooError> {
        self.send_json(reqwest::Method::PUT, &format!("/products/{id}"), input)
            .await
    }

    /// Delete a product. Without `force` it is moved to the trash.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(store = %self.inner.base_url))]
    pub async fn delete_product(
        &self,
        id: WooProductId,
        force: bool,
    ) -> Result<WooProduct, WooError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/products/{id}"))
            .query(&[("force", force)])
            .send()
            .await?;

        let response = check_status(response).await?;
        parse_json(response).await
    }

    /// Create, update and delete products in one request.
    ///
    /// # Errors
    ///
    /// Returns error if the batch request as a whole fails. Per-item failures
    /// are reported inside the response.
    #[instrument(skip(self, batch), fields(store = %self.inner.base_url, ops = batch.len()))]
    pub async fn batch_products(&self, batch: &BatchRequest) -> Result<BatchResponse, WooError> {
        self.send_json(reqwest::Method::POST, "/products/batch", batch)
            .await
    }

    /// List product categories (first 100).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(store = %self.inner.base_url))]
    pub async fn list_categories(&self) -> Result<Vec<WooCategory>, WooError> {
        let response = self
            .request(reqwest::Method::GET, "/products/categories")
            .query(&[("per_page", ListParams::MAX_PER_PAGE)])
            .send()
            .await?;

        let response = check_status(response).await?;
        parse_json(response).await
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}{path}", self.inner.base_url))
            .basic_auth(
                &self.inner.consumer_key,
                Some(self.inner.consumer_secret.expose_secret()),
            )
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, WooError> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        let response = check_status(response).await?;
        parse_json(response).await
    }

    async fn send_json<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, WooError> {
        let response = self.request(method, path).json(body).send().await?;
        let response = check_status(response).await?;
        parse_json(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WooError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(parse_error(response).await)
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WooError> {
    response
        .json()
        .await
        .map_err(|e| WooError::Parse(format!("Failed to parse response: {e}")))
}

/// Map an error response to a `WooError`.
async fn parse_error(response: reqwest::Response) -> WooError {
    let status = response.status().as_u16();

    if status == 429 {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return WooError::RateLimited(retry_after);
    }

    if status == 401 || status == 403 {
        return WooError::Unauthorized;
    }

    let body = response.text().await.unwrap_or_default();
    error_from_body(status, &body)
}

fn error_from_body(status: u16, body: &str) -> WooError {
    match serde_json::from_str::<WooErrorBody>(body) {
        Ok(err) if status == 404 => WooError::NotFound(err.message),
        Ok(err) => WooError::Api {
            status,
            code: err.code,
            message: err.message,
        },
        Err(_) if status == 404 => WooError::NotFound("Resource not found".to_string()),
        Err(_) => WooError::Api {
            status,
            code: "unknown".to_string(),
            message: body.chars().take(500).collect(),
        },
    }
}

impl std::fmt::Debug for WooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooClient")
            .field("base_url", &self.inner.base_url)
            .field("consumer_secret", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
