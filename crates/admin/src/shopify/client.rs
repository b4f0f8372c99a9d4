//! Shopify Admin REST client for one shop.

use std::sync::Arc;

use reqwest::header::LINK;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use merchdesk_core::ShopifyProductId;

use super::types::{
    Collect, CollectEnvelope, CursorPage, CustomCollection, CustomCollectionEnvelope,
    MetafieldsEnvelope, NewCollect, NewCollection, NewPage, Page, PageEnvelope, ProductEnvelope,
    ProductsEnvelope, SeoFields, ShopifyProduct, ShopifyProductInput,
};
use super::{ShopifyError, flatten_errors, normalize_shop_domain, parse_link_header};

/// Largest page size the REST API accepts.
pub const MAX_PAGE_SIZE: u32 = 250;

const SEO_NAMESPACE: &str = "global";
const SEO_TITLE_KEY: &str = "title_tag";
const SEO_DESCRIPTION_KEY: &str = "description_tag";

/// Shopify Admin REST client.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    shop: String,
    base_url: String,
    access_token: SecretString,
}

impl ShopifyClient {
    /// Create a client for `shop` (see [`normalize_shop_domain`]).
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::InvalidDomain` if `shop` is not a hostname.
    pub fn new(
        client: reqwest::Client,
        shop: &str,
        api_version: &str,
        access_token: SecretString,
    ) -> Result<Self, ShopifyError> {
        let shop = normalize_shop_domain(shop)?;
        let base_url = format!("https://{shop}/admin/api/{api_version}");

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                shop,
                base_url,
                access_token,
            }),
        })
    }

    /// Point the client at another API root, such as a local mock shop.
    #[cfg(test)]
    pub(crate) fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ShopifyClientInner {
                client: self.inner.client.clone(),
                shop: self.inner.shop.clone(),
                base_url: base_url.into(),
                access_token: self.inner.access_token.clone(),
            }),
        }
    }

    /// The normalised shop domain.
    #[must_use]
    pub fn shop(&self) -> &str {
        &self.inner.shop
    }

    /// List products.
    ///
    /// When `page_info` is set Shopify ignores every other filter, so only
    /// `limit` is sent alongside it.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn list_products(
        &self,
        limit: u32,
        page_info: Option<&str>,
    ) -> Result<CursorPage<ShopifyProduct>, ShopifyError> {
        let mut query = vec![("limit", limit.clamp(1, MAX_PAGE_SIZE).to_string())];
        if let Some(cursor) = page_info.filter(|c| !c.is_empty()) {
            query.push(("page_info", cursor.to_string()));
        }

        let response = self
            .request(reqwest::Method::GET, "/products.json")
            .query(&query)
            .send()
            .await?;
        let response = check_status(response).await?;

        let (next_page_info, previous_page_info) = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .map(parse_link_header)
            .unwrap_or_default();

        let body: ProductsEnvelope = parse_json(response).await?;

        Ok(CursorPage {
            items: body.products,
            next_page_info,
            previous_page_info,
        })
    }

    /// Get a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn get_product(&self, id: ShopifyProductId) -> Result<ShopifyProduct, ShopifyError> {
        let body: ProductEnvelope<ShopifyProduct> =
            self.get(&format!("/products/{id}.json")).await?;
        Ok(body.product)
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Validation` if Shopify rejects the input.
    #[instrument(skip(self, input), fields(shop = %self.inner.shop))]
    pub async fn create_product(
        &self,
        input: &ShopifyProductInput,
    ) -> Result<ShopifyProduct, ShopifyError> {
        let body: ProductEnvelope<ShopifyProduct> = self
            .send_json(
                reqwest::Method::POST,
                "/products.json",
                &ProductEnvelope { product: input },
            )
            .await?;
        Ok(body.product)
    }

    /// Update a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` or `ShopifyError::Validation`.
    #[instrument(skip(self, input), fields(shop = %self.inner.shop))]
    pub async fn update_product(
        &self,
        id: ShopifyProductId,
        input: &ShopifyProductInput,
    ) -> Result<ShopifyProduct, ShopifyError> {
        let body: ProductEnvelope<ShopifyProduct> = self
            .send_json(
                reqwest::Method::PUT,
                &format!("/products/{id}.json"),
                &ProductEnvelope { product: input },
            )
            .await?;
        Ok(body.product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn delete_product(&self, id: ShopifyProductId) -> Result<(), ShopifyError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/products/{id}.json"))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Read the SEO title and description metafields of a product.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn get_product_seo(&self, id: ShopifyProductId) -> Result<SeoFields, ShopifyError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/products/{id}/metafields.json"),
            )
            .query(&[("namespace", SEO_NAMESPACE)])
            .send()
            .await?;
        let body: MetafieldsEnvelope = parse_json(check_status(response).await?).await?;

        let mut seo = SeoFields::default();
        for field in body.metafields {
            if field.namespace != SEO_NAMESPACE {
                continue;
            }
            let value = field
                .value
                .as_str()
                .map(str::to_string)
                .filter(|v| !v.is_empty());
            match field.key.as_str() {
                SEO_TITLE_KEY => seo.title = value,
                SEO_DESCRIPTION_KEY => seo.description = value,
                _ => {}
            }
        }

        Ok(seo)
    }

    /// Write the SEO title and/or description of a product.
    ///
    /// Uses the product's `metafields_global_*` shorthand, which creates or
    /// replaces the underlying metafields. `None` fields are untouched.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` or `ShopifyError::Validation`.
    #[instrument(skip(self, seo), fields(shop = %self.inner.shop))]
    pub async fn update_product_seo(
        &self,
        id: ShopifyProductId,
        seo: &SeoFields,
    ) -> Result<SeoFields, ShopifyError> {
        let mut product = serde_json::Map::new();
        product.insert("id".to_string(), serde_json::json!(id));
        if let Some(title) = &seo.title {
            product.insert(
                "metafields_global_title_tag".to_string(),
                serde_json::json!(title),
            );
        }
        if let Some(description) = &seo.description {
            product.insert(
                "metafields_global_description_tag".to_string(),
                serde_json::json!(description),
            );
        }

        let _: serde_json::Value = self
            .send_json(
                reqwest::Method::PUT,
                &format!("/products/{id}.json"),
                &serde_json::json!({ "product": product }),
            )
            .await?;

        self.get_product_seo(id).await
    }

    /// Create a manual (custom) collection.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Validation` if Shopify rejects the input.
    #[instrument(skip(self, body_html), fields(shop = %self.inner.shop))]
    pub async fn create_custom_collection(
        &self,
        title: &str,
        body_html: Option<&str>,
    ) -> Result<CustomCollection, ShopifyError> {
        let body: CustomCollectionEnvelope<CustomCollection> = self
            .send_json(
                reqwest::Method::POST,
                "/custom_collections.json",
                &CustomCollectionEnvelope {
                    custom_collection: NewCollection { title, body_html },
                },
            )
            .await?;
        Ok(body.custom_collection)
    }

    /// Add a product to a custom collection.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Validation` if the product is already in the
    /// collection or either id is unknown.
    #[instrument(skip(self), fields(shop = %self.inner.shop))]
    pub async fn add_product_to_collection(
        &self,
        collection_id: i64,
        product_id: ShopifyProductId,
    ) -> Result<Collect, ShopifyError> {
        let body: CollectEnvelope<Collect> = self
            .send_json(
                reqwest::Method::POST,
                "/collects.json",
                &CollectEnvelope {
                    collect: NewCollect {
                        collection_id,
                        product_id,
                    },
                },
            )
            .await?;
        Ok(body.collect)
    }

    /// Create an online store page.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Validation` if Shopify rejects the input.
    #[instrument(skip(self, body_html), fields(shop = %self.inner.shop))]
    pub async fn create_page(&self, title: &str, body_html: &str) -> Result<Page, ShopifyError> {
        let body: PageEnvelope<Page> = self
            .send_json(
                reqwest::Method::POST,
                "/pages.json",
                &PageEnvelope {
                    page: NewPage { title, body_html },
                },
            )
            .await?;
        Ok(body.page)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}{path}", self.inner.base_url))
            .header(
                "X-Shopify-Access-Token",
                self.inner.access_token.expose_secret(),
            )
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ShopifyError> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        parse_json(check_status(response).await?).await
    }

    async fn send_json<T: DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, ShopifyError> {
        let response = self.request(method, path).json(body).send().await?;
        parse_json(check_status(response).await?).await
    }
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("shop", &self.inner.shop)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ShopifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        429 => {
            // Shopify sends fractional seconds, e.g. "2.0"
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<f64>().ok())
                .map_or(2, |secs| secs.ceil().max(1.0) as u64);
            Err(ShopifyError::RateLimited(retry_after))
        }
        401 | 403 => Err(ShopifyError::Unauthorized),
        404 => Err(ShopifyError::NotFound("Resource not found".to_string())),
        code => {
            let body = response.text().await.unwrap_or_default();
            let errors = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("errors").map(flatten_errors));

            if code == 422 {
                Err(ShopifyError::Validation(errors.unwrap_or(body)))
            } else {
                Err(ShopifyError::Api {
                    status: code,
                    message: errors.unwrap_or_else(|| body.chars().take(500).collect()),
                })
            }
        }
    }
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ShopifyError> {
    response
        .json()
        .await
        .map_err(|e| ShopifyError::Parse(format!("Failed to parse response: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_client_normalises_shop() {
        let client = ShopifyClient::new(
            reqwest::Client::new(),
            "demo-store",
            "2025-01",
            SecretString::from("shpat_test"),
        )
        .unwrap();
        assert_eq!(client.shop(), "demo-store.myshopify.com");
        assert_eq!(
            client.inner.base_url,
            "https://demo-store.myshopify.com/admin/api/2025-01"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = ShopifyClient::new(
            reqwest::Client::new(),
            "demo-store.myshopify.com",
            "2025-01",
            SecretString::from("shpat_secret_value"),
        )
        .unwrap();
        assert!(!format!("{client:?}").contains("shpat_secret_value"));
    }

    #[test]
    fn test_client_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<ShopifyClient>();
    }
}
