//! Shopify Admin REST resource types.

use serde::{Deserialize, Serialize};

use merchdesk_core::ShopifyProductId;

/// A product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyProduct {
    pub id: ShopifyProductId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub handle: String,
    /// `active`, `draft` or `archived`.
    #[serde(default)]
    pub status: String,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<ShopifyImage>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopifyImage {
    #[serde(default)]
    pub id: Option<i64>,
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Body for creating or updating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopifyProductInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageInput>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantInput {
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInput {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// SEO title and description, stored by Shopify as `global` metafields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoFields {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metafield {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub namespace: String,
    pub key: String,
    pub value: serde_json::Value,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomCollection {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collect {
    pub id: i64,
    pub collection_id: i64,
    pub product_id: ShopifyProductId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub body_html: Option<String>,
}

/// One page of a cursor-paginated collection.
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    /// `page_info` for the next page, from the `Link` header.
    pub next_page_info: Option<String>,
    pub previous_page_info: Option<String>,
}

// Shopify wraps every REST body in a single-key object.

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProductEnvelope<T> {
    pub product: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    pub products: Vec<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetafieldsEnvelope {
    pub metafields: Vec<Metafield>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CustomCollectionEnvelope<T> {
    pub custom_collection: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CollectEnvelope<T> {
    pub collect: T,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PageEnvelope<T> {
    pub page: T,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewCollection<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewCollect {
    pub collection_id: i64,
    pub product_id: ShopifyProductId,
}

#[derive(Debug, Serialize)]
pub(crate) struct NewPage<'a> {
    pub title: &'a str,
    pub body_html: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_envelope_deserializes() {
        let json = r#"{"product": {"id": 632910392, "title": "IPod Nano", "handle": "ipod-nano",
            "variants": [{"id": 1, "title": "Pink", "price": "199.00", "sku": "IPOD2008PINK"}]}}"#;
        let envelope: ProductEnvelope<ShopifyProduct> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.product.id.as_i64(), 632_910_392);
        assert_eq!(envelope.product.variants[0].price, "199.00");
    }

    #[test]
    fn test_product_input_serializes_only_set_fields() {
        let input = ShopifyProductInput {
            title: Some("Mug".to_string()),
            variants: Some(vec![VariantInput {
                price: "12.00".to_string(),
                ..VariantInput::default()
            }]),
            ..ShopifyProductInput::default()
        };
        let json = serde_json::to_value(ProductEnvelope { product: &input }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"product": {"title": "Mug", "variants": [{"price": "12.00"}]}})
        );
    }
}
