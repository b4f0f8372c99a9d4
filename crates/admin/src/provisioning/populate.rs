//! Populating a freshly created store from a template.
//!
//! Runs products, then collections (with their collects), then pages, one
//! request at a time. Item failures are recorded and skipped; an
//! authorization failure stops the run since nothing after it can succeed.

use std::collections::HashMap;
use std::time::Duration;

use merchdesk_core::ShopifyProductId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::seo::slugify;
use crate::shopify::{ShopifyClient, ShopifyError};

use super::template::StoreTemplate;

/// Longest `Retry-After` honoured before giving up on an item.
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Product,
    Collection,
    Collect,
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub kind: ItemKind,
    /// Title or handle of the item.
    pub item: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulateReport {
    pub products_created: u32,
    pub collections_created: u32,
    pub pages_created: u32,
    pub errors: Vec<ItemError>,
    /// Why population stopped early, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl PopulateReport {
    #[must_use]
    pub const fn items_created(&self) -> u32 {
        self.products_created + self.collections_created + self.pages_created
    }

    /// At least one item was attempted and none was created.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.items_created() == 0 && !self.errors.is_empty()
    }

    fn record(&mut self, kind: ItemKind, item: &str, error: &ShopifyError) {
        tracing::warn!(?kind, item, error = %error, "Store population item failed");
        self.errors.push(ItemError {
            kind,
            item: item.to_string(),
            message: error.to_string(),
        });
    }
}

/// Create the template's items in the store.
#[instrument(skip(client, template), fields(shop = %client.shop(), items = template.item_count()))]
pub async fn populate_shopify_store(
    client: &ShopifyClient,
    template: &StoreTemplate,
) -> PopulateReport {
    let mut report = PopulateReport::default();
    let mut products: HashMap<String, ShopifyProductId> = HashMap::new();

    for product in &template.products {
        let input = product.to_shopify_input();
        match with_rate_limit_retry(|| client.create_product(&input)).await {
            Ok(created) => {
                report.products_created += 1;
                products.insert(product.handle(), created.id);
                if !created.handle.is_empty() {
                    products.insert(created.handle, created.id);
                }
            }
            Err(ShopifyError::Unauthorized) => return aborted(report),
            Err(e) => report.record(ItemKind::Product, &product.title, &e),
        }
    }

    for collection in &template.collections {
        let created = match with_rate_limit_retry(|| {
            client.create_custom_collection(&collection.title, collection.body_html.as_deref())
        })
        .await
        {
            Ok(created) => created,
            Err(ShopifyError::Unauthorized) => return aborted(report),
            Err(e) => {
                report.record(ItemKind::Collection, &collection.title, &e);
                continue;
            }
        };
        report.collections_created += 1;

        for handle in &collection.products {
            // products that failed to create were already reported
            let Some(&product_id) = products.get(&slugify(handle)) else {
                continue;
            };
            match with_rate_limit_retry(|| client.add_product_to_collection(created.id, product_id))
                .await
            {
                Ok(_) => {}
                Err(ShopifyError::Unauthorized) => return aborted(report),
                Err(e) => report.record(
                    ItemKind::Collect,
                    &format!("{} / {handle}", collection.title),
                    &e,
                ),
            }
        }
    }

    for page in &template.pages {
        match with_rate_limit_retry(|| client.create_page(&page.title, &page.body_html)).await {
            Ok(_) => report.pages_created += 1,
            Err(ShopifyError::Unauthorized) => return aborted(report),
            Err(e) => report.record(ItemKind::Page, &page.title, &e),
        }
    }

    tracing::info!(
        products = report.products_created,
        collections = report.collections_created,
        pages = report.pages_created,
        errors = report.errors.len(),
        "Store population finished"
    );

    report
}

fn aborted(mut report: PopulateReport) -> PopulateReport {
    tracing::error!("Shopify rejected the store access token, population aborted");
    report.aborted = Some(ShopifyError::Unauthorized.to_string());
    report
}

/// Run a request, retrying once after a short `429` wait.
async fn with_rate_limit_retry<T, F, Fut>(mut request: F) -> Result<T, ShopifyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ShopifyError>>,
{
    match request().await {
        Err(ShopifyError::RateLimited(secs)) if Duration::from_secs(secs) <= MAX_RATE_LIMIT_WAIT => {
            tracing::debug!(secs, "Shopify rate limited, retrying");
            tokio::time::sleep(Duration::from_secs(secs.max(1))).await;
            request().await
        }
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, HeaderValue, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use secrecy::SecretString;
    use serde_json::{Value, json};

    use super::*;
    use crate::provisioning::template::{TemplateCollection, TemplatePage, TemplateProduct};

    #[derive(Clone, Default)]
    struct MockShop {
        next_id: Arc<AtomicI64>,
        product_requests: Arc<AtomicU32>,
        rate_limit_next_product: Arc<AtomicBool>,
        reject_collections: bool,
        collects: Arc<Mutex<Vec<(i64, i64)>>>,
        pages: Arc<AtomicU32>,
    }

    impl MockShop {
        fn id(&self) -> i64 {
            100 + self.next_id.fetch_add(1, Ordering::SeqCst)
        }
    }

    async fn create_product(
        State(shop): State<MockShop>,
        Json(body): Json<Value>,
    ) -> (StatusCode, HeaderMap, Json<Value>) {
        shop.product_requests.fetch_add(1, Ordering::SeqCst);
        let mut headers = HeaderMap::new();

        if shop.rate_limit_next_product.swap(false, Ordering::SeqCst) {
            headers.insert("Retry-After", HeaderValue::from_static("1.0"));
            return (
                StatusCode::TOO_MANY_REQUESTS,
                headers,
                Json(json!({"errors": "Exceeded 2 calls per second"})),
            );
        }

        let product = &body["product"];
        if product["title"] == "Broken Kettle" {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                headers,
                Json(json!({"errors": {"price": ["is invalid"]}})),
            );
        }

        let created = json!({"product": {
            "id": shop.id(),
            "title": product["title"],
            "handle": product["handle"],
        }});
        (StatusCode::CREATED, headers, Json(created))
    }

    async fn create_collection(
        State(shop): State<MockShop>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if shop.reject_collections {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"errors": "[API] Invalid API key or access token"})),
            );
        }
        let created = json!({"custom_collection": {
            "id": shop.id(),
            "title": body["custom_collection"]["title"],
        }});
        (StatusCode::CREATED, Json(created))
    }

    async fn create_collect(
        State(shop): State<MockShop>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let collection_id = body["collect"]["collection_id"].as_i64().unwrap();
        let product_id = body["collect"]["product_id"].as_i64().unwrap();
        shop.collects.lock().unwrap().push((collection_id, product_id));
        let created = json!({"collect": {
            "id": shop.id(),
            "collection_id": collection_id,
            "product_id": product_id,
        }});
        (StatusCode::CREATED, Json(created))
    }

    async fn create_page(
        State(shop): State<MockShop>,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        shop.pages.fetch_add(1, Ordering::SeqCst);
        let created = json!({"page": {"id": shop.id(), "title": body["page"]["title"]}});
        (StatusCode::CREATED, Json(created))
    }

    async fn spawn_shop(shop: MockShop) -> ShopifyClient {
        let app = Router::new()
            .route("/products.json", post(create_product))
            .route("/custom_collections.json", post(create_collection))
            .route("/collects.json", post(create_collect))
            .route("/pages.json", post(create_page))
            .with_state(shop);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        ShopifyClient::new(
            reqwest::Client::new(),
            "acme-demo",
            "2025-01",
            SecretString::from("shpat_test"),
        )
        .unwrap()
        .with_base_url(format!("http://{addr}"))
    }

    fn product(title: &str) -> TemplateProduct {
        TemplateProduct {
            title: title.to_string(),
            handle: None,
            body_html: String::new(),
            vendor: None,
            product_type: None,
            tags: Vec::new(),
            price: "12".to_string(),
            sku: None,
            image_url: None,
        }
    }

    fn template() -> StoreTemplate {
        StoreTemplate {
            products: vec![
                product("Enamel Mug"),
                product("Broken Kettle"),
                product("Tea Pot"),
            ],
            collections: vec![TemplateCollection {
                title: "Kitchen".to_string(),
                body_html: None,
                products: vec![
                    "enamel-mug".to_string(),
                    "broken-kettle".to_string(),
                    "TEA POT".to_string(),
                ],
            }],
            pages: vec![TemplatePage {
                title: "About us".to_string(),
                body_html: "<p>Hello</p>".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_populate_records_failures_and_continues() {
        let shop = MockShop::default();
        let client = spawn_shop(shop.clone()).await;

        let report = populate_shopify_store(&client, &template()).await;

        assert_eq!(report.products_created, 2);
        assert_eq!(report.collections_created, 1);
        assert_eq!(report.pages_created, 1);
        assert!(report.aborted.is_none());
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ItemKind::Product);
        assert_eq!(report.errors[0].item, "Broken Kettle");
        assert!(report.errors[0].message.contains("price"));

        // mug = 100, tea pot = 101, collection = 102; the failed product is skipped
        assert_eq!(*shop.collects.lock().unwrap(), vec![(102, 100), (102, 101)]);
        assert!(!report.all_failed());
    }

    #[tokio::test]
    async fn test_populate_aborts_on_unauthorized() {
        let shop = MockShop {
            reject_collections: true,
            ..MockShop::default()
        };
        let client = spawn_shop(shop.clone()).await;

        let report = populate_shopify_store(&client, &template()).await;

        assert_eq!(report.products_created, 2);
        assert_eq!(report.collections_created, 0);
        assert_eq!(report.pages_created, 0);
        assert_eq!(
            report.aborted.as_deref(),
            Some(ShopifyError::Unauthorized.to_string().as_str())
        );
        assert!(shop.collects.lock().unwrap().is_empty());
        assert_eq!(shop.pages.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_populate_retries_rate_limited_product() {
        let shop = MockShop::default();
        shop.rate_limit_next_product.store(true, Ordering::SeqCst);
        let client = spawn_shop(shop.clone()).await;

        let template = StoreTemplate {
            products: vec![product("Enamel Mug")],
            ..StoreTemplate::default()
        };
        let report = populate_shopify_store(&client, &template).await;

        assert_eq!(report.products_created, 1);
        assert!(report.errors.is_empty());
        assert_eq!(shop.product_requests.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_report_outcomes() {
        let mut report = PopulateReport::default();
        assert!(!report.all_failed());

        report.record(
            ItemKind::Product,
            "Mug",
            &ShopifyError::Validation("price: is invalid".to_string()),
        );
        assert!(report.all_failed());

        report.pages_created = 1;
        assert!(!report.all_failed());
        assert_eq!(report.items_created(), 1);
    }

    #[test]
    fn test_report_serialization() {
        let report = PopulateReport {
            products_created: 2,
            ..PopulateReport::default()
        };
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["products_created"], 2);
        assert!(value.get("aborted").is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_retried_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<u32, ShopifyError> = with_rate_limit_retry(|| async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(ShopifyError::RateLimited(1))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.ok(), Some(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_long_rate_limit_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), ShopifyError> = with_rate_limit_retry(|| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ShopifyError::RateLimited(120))
        })
        .await;
        assert!(matches!(result, Err(ShopifyError::RateLimited(120))));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
