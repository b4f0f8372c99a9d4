//! WooCommerce REST v3 resource types.
//!
//! WooCommerce returns prices as strings and omits most fields on partial
//! objects, so nearly everything here is `#[serde(default)]`.

use serde::{Deserialize, Serialize};

use merchdesk_core::{WooCategoryId, WooProductId};

/// A product as returned by `GET /products`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WooProduct {
    pub id: WooProductId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub permalink: String,
    /// `draft`, `pending`, `private` or `publish`.
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub product_type: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
    #[serde(default)]
    pub images: Vec<WooImage>,
    #[serde(default)]
    pub meta_data: Vec<MetaData>,
    #[serde(default)]
    pub date_modified: Option<String>,
}

/// Category reference embedded in a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: WooCategoryId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,
}

/// Product image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WooImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// Custom field on a product. Yoast stores its fields here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl MetaData {
    /// New meta entry without an id (WooCommerce matches on key).
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WooCategory {
    pub id: WooCategoryId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub parent: i64,
    #[serde(default)]
    pub count: i64,
}

/// Body for creating or updating a product. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    /// Only used inside batch updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WooProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<WooImage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Vec<MetaData>>,
}

/// `POST /products/batch` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub create: Vec<ProductInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<ProductInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<WooProductId>,
}

impl BatchRequest {
    /// Total number of operations in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `POST /products/batch` response.
///
/// Items that failed come back as objects with an `error` key, so they are
/// kept as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub create: Vec<serde_json::Value>,
    #[serde(default)]
    pub update: Vec<serde_json::Value>,
    #[serde(default)]
    pub delete: Vec<serde_json::Value>,
}

/// Query parameters for `GET /products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<WooCategoryId>,
}

impl ListParams {
    /// Maximum page size WooCommerce accepts.
    pub const MAX_PER_PAGE: u32 = 100;
    pub const DEFAULT_PER_PAGE: u32 = 20;

    /// Page number, 1-based.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size clamped to `1..=100`.
    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", self.page().to_string()),
            ("per_page", self.per_page().to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query.push(("search", search.trim().to_string()));
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            query.push(("status", status.to_string()));
        }
        if let Some(category) = self.category {
            query.push(("category", category.to_string()));
        }
        query
    }
}

/// WooCommerce error body: `{"code": "...", "message": "...", "data": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct WooErrorBody {
    pub code: String,
    pub message: String,
}
