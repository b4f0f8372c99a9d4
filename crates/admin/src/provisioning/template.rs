//! Store templates: the products, collections and pages a new store is
//! populated with.

use std::collections::HashSet;

use merchdesk_core::{CurrencyCode, Price};
use serde::{Deserialize, Deserializer, Serialize};

use crate::seo::slugify;
use crate::shopify::{ImageInput, ShopifyProductInput, VariantInput};

/// Upper bound on products per template.
pub const MAX_TEMPLATE_PRODUCTS: usize = 100;
/// Upper bound on products the AI generator is asked for.
pub const MAX_GENERATED_PRODUCTS: u32 = 25;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTemplate {
    #[serde(default)]
    pub products: Vec<TemplateProduct>,
    #[serde(default)]
    pub collections: Vec<TemplateCollection>,
    #[serde(default)]
    pub pages: Vec<TemplatePage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateProduct {
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub body_html: String,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Decimal string; generated templates sometimes carry a JSON number.
    #[serde(deserialize_with = "price_string")]
    pub price: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCollection {
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    /// Product handles.
    #[serde(default)]
    pub products: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatePage {
    pub title: String,
    #[serde(default)]
    pub body_html: String,
}

fn price_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

impl TemplateProduct {
    /// The explicit handle, or one derived from the title.
    #[must_use]
    pub fn handle(&self) -> String {
        self.handle
            .as_deref()
            .map(slugify)
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| slugify(&self.title))
    }

    /// Shopify product payload with a single default variant.
    #[must_use]
    pub fn to_shopify_input(&self) -> ShopifyProductInput {
        let price = Price::parse(&self.price, CurrencyCode::default())
            .ok()
            .flatten()
            .map_or_else(|| self.price.trim().to_string(), |p| p.to_platform_string());

        ShopifyProductInput {
            title: Some(self.title.clone()),
            body_html: Some(self.body_html.clone()),
            vendor: self.vendor.clone(),
            product_type: self.product_type.clone(),
            handle: Some(self.handle()),
            status: Some("active".to_string()),
            tags: (!self.tags.is_empty()).then(|| self.tags.join(", ")),
            variants: Some(vec![VariantInput {
                price,
                sku: self.sku.clone(),
                option1: None,
            }]),
            images: self.image_url.as_ref().map(|src| {
                vec![ImageInput {
                    src: src.clone(),
                    alt: Some(self.title.clone()),
                }]
            }),
        }
    }
}

impl StoreTemplate {
    /// Number of items population will attempt.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.products.len() + self.collections.len() + self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Check the template before a job is queued.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending item.
    pub fn validate(&self) -> Result<(), String> {
        if self.products.len() > MAX_TEMPLATE_PRODUCTS {
            return Err(format!(
                "template has {} products, maximum is {MAX_TEMPLATE_PRODUCTS}",
                self.products.len()
            ));
        }

        let mut handles = HashSet::new();
        for (i, product) in self.products.iter().enumerate() {
            if product.title.trim().is_empty() {
                return Err(format!("products[{i}]: title is required"));
            }
            match Price::parse(&product.price, CurrencyCode::default()) {
                Ok(Some(_)) => {}
                Ok(None) => return Err(format!("products[{i}]: price is required")),
                Err(e) => return Err(format!("products[{i}]: {e}")),
            }
            let handle = product.handle();
            if handle.is_empty() {
                return Err(format!("products[{i}]: cannot derive a handle from the title"));
            }
            if !handles.insert(handle.clone()) {
                return Err(format!("products[{i}]: duplicate handle '{handle}'"));
            }
            if let Some(url) = &product.image_url {
                if !(url.starts_with("https://") || url.starts_with("http://")) {
                    return Err(format!("products[{i}]: image_url must be an http(s) URL"));
                }
            }
        }

        for (i, collection) in self.collections.iter().enumerate() {
            if collection.title.trim().is_empty() {
                return Err(format!("collections[{i}]: title is required"));
            }
            if let Some(missing) = collection
                .products
                .iter()
                .find(|h| !handles.contains(&slugify(h)))
            {
                return Err(format!(
                    "collections[{i}]: unknown product handle '{missing}'"
                ));
            }
        }

        for (i, page) in self.pages.iter().enumerate() {
            if page.title.trim().is_empty() {
                return Err(format!("pages[{i}]: title is required"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn template() -> StoreTemplate {
        serde_json::from_value(serde_json::json!({
            "products": [
                {"title": "Ceramic Mug", "price": "18", "tags": ["kitchen", "gift"],
                 "image_url": "https://cdn.example.com/mug.jpg"},
                {"title": "Linen Apron", "handle": "apron", "price": 32.5, "sku": "AP-1"}
            ],
            "collections": [
                {"title": "Kitchen", "products": ["ceramic-mug", "apron"]}
            ],
            "pages": [{"title": "About", "body_html": "<p>Small batch.</p>"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_numeric_price() {
        let template = template();
        assert_eq!(template.products[1].price, "32.5");
        assert_eq!(template.item_count(), 4);
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_handle_falls_back_to_title() {
        let template = template();
        assert_eq!(template.products[0].handle(), "ceramic-mug");
        assert_eq!(template.products[1].handle(), "apron");
    }

    #[test]
    fn test_to_shopify_input() {
        let input = template().products[0].to_shopify_input();
        assert_eq!(input.handle.as_deref(), Some("ceramic-mug"));
        assert_eq!(input.tags.as_deref(), Some("kitchen, gift"));
        let variants = input.variants.unwrap();
        assert_eq!(variants[0].price, "18.00");
        assert_eq!(input.images.unwrap()[0].src, "https://cdn.example.com/mug.jpg");
    }

    #[test]
    fn test_validate_rejects_bad_items() {
        let mut bad_price = template();
        bad_price.products[0].price = "free".to_string();
        assert!(bad_price.validate().unwrap_err().starts_with("products[0]"));

        let mut duplicate = template();
        duplicate.products[1].handle = Some("Ceramic Mug".to_string());
        assert!(duplicate.validate().unwrap_err().contains("duplicate handle"));

        let mut unknown = template();
        unknown.collections[0].products.push("teapot".to_string());
        assert!(unknown.validate().unwrap_err().contains("'teapot'"));

        let mut missing_title = template();
        missing_title.pages[0].title = " ".to_string();
        assert_eq!(missing_title.validate().unwrap_err(), "pages[0]: title is required");
    }
}
