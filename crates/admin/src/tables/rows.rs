//! Row shapes for each table, keyed to the columns in [`super::config`].

use chrono::{DateTime, Utc};
use merchdesk_core::{JobId, JobStatus, ShopifyProductId, WooProductId, WpPostId};
use serde::Serialize;

use crate::db::jobs::StoreJob;
use crate::seo::YoastFields;
use crate::shopify::ShopifyProduct;
use crate::woocommerce::WooProduct;
use crate::wordpress::WpPost;

#[derive(Debug, Clone, Serialize)]
pub struct WooProductRow {
    pub id: WooProductId,
    pub image: Option<String>,
    pub name: String,
    pub sku: String,
    pub price: String,
    /// Quantity when stock is managed, otherwise the stock status.
    pub stock: String,
    pub status: String,
    pub categories: String,
    pub modified: Option<String>,
    pub permalink: String,
}

impl From<WooProduct> for WooProductRow {
    fn from(product: WooProduct) -> Self {
        let stock = product
            .stock_quantity
            .map_or_else(|| product.stock_status.clone(), |q| q.to_string());
        let categories = product
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            id: product.id,
            image: product.images.into_iter().next().map(|i| i.src),
            name: product.name,
            sku: product.sku,
            price: product.price,
            stock,
            status: product.status,
            categories,
            modified: product.date_modified,
            permalink: product.permalink,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WpPostRow {
    pub id: WpPostId,
    pub title: String,
    pub status: String,
    pub slug: String,
    pub seo_title: Option<String>,
    pub focus_keyword: Option<String>,
    pub date: Option<String>,
    pub modified: Option<String>,
    pub link: String,
}

impl From<WpPost> for WpPostRow {
    fn from(post: WpPost) -> Self {
        let yoast = YoastFields::from_wp_meta(&post.meta);
        Self {
            id: post.id,
            title: crate::builders::html::decode_entities(&post.title.rendered),
            status: post.status,
            slug: post.slug,
            seo_title: yoast.title,
            focus_keyword: yoast.focus_keyword,
            date: post.date,
            modified: post.modified,
            link: post.link,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShopifyProductRow {
    pub id: ShopifyProductId,
    pub image: Option<String>,
    pub title: String,
    pub handle: String,
    pub vendor: String,
    pub product_type: String,
    /// Price of the first variant.
    pub price: Option<String>,
    /// Summed over variants that track inventory.
    pub inventory: Option<i64>,
    pub status: String,
}

impl From<ShopifyProduct> for ShopifyProductRow {
    fn from(product: ShopifyProduct) -> Self {
        let inventory = product
            .variants
            .iter()
            .filter_map(|v| v.inventory_quantity)
            .reduce(|a, b| a + b);

        Self {
            id: product.id,
            image: product.images.into_iter().next().map(|i| i.src),
            price: product.variants.first().map(|v| v.price.clone()),
            title: product.title,
            handle: product.handle,
            vendor: product.vendor,
            product_type: product.product_type,
            inventory,
            status: product.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreJobRow {
    pub id: JobId,
    pub store_name: String,
    pub status: JobStatus,
    pub store_domain: Option<String>,
    pub admin_url: Option<String>,
    pub products_created: Option<u64>,
    pub error_message: Option<String>,
    pub webhook_delivered: bool,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<StoreJob> for StoreJobRow {
    fn from(job: StoreJob) -> Self {
        Self {
            id: job.id,
            products_created: job
                .report
                .as_ref()
                .and_then(|r| r.get("products_created"))
                .and_then(serde_json::Value::as_u64),
            store_name: job.store_name,
            status: job.status,
            store_domain: job.store_domain,
            admin_url: job.admin_url,
            error_message: job.error_message,
            webhook_delivered: job.webhook_delivered_at.is_some(),
            created_at: job.created_at,
            finished_at: job.finished_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_woo_product_row() {
        let product: WooProduct = serde_json::from_value(json!({
            "id": 12,
            "name": "Ceramic Mug",
            "sku": "MUG-1",
            "price": "18.00",
            "status": "publish",
            "stock_status": "instock",
            "stock_quantity": null,
            "categories": [{"id": 3, "name": "Kitchen"}, {"id": 4, "name": "Gifts"}],
            "images": [{"id": 1, "src": "https://cdn.example.com/mug.jpg", "alt": ""}]
        }))
        .unwrap();

        let row = WooProductRow::from(product);
        assert_eq!(row.stock, "instock");
        assert_eq!(row.categories, "Kitchen, Gifts");
        assert_eq!(row.image.as_deref(), Some("https://cdn.example.com/mug.jpg"));
    }

    #[test]
    fn test_wp_post_row_reads_yoast() {
        let post: WpPost = serde_json::from_value(json!({
            "id": 5,
            "status": "publish",
            "slug": "hello",
            "title": {"rendered": "Tips &amp; Tricks"},
            "meta": {"_yoast_wpseo_title": "Tips and tricks | Blog", "_yoast_wpseo_focuskw": ""}
        }))
        .unwrap();

        let row = WpPostRow::from(post);
        assert_eq!(row.title, "Tips & Tricks");
        assert_eq!(row.seo_title.as_deref(), Some("Tips and tricks | Blog"));
        assert_eq!(row.focus_keyword, None);
    }

    #[test]
    fn test_shopify_product_row_sums_inventory() {
        let product: ShopifyProduct = serde_json::from_value(json!({
            "id": 99,
            "title": "Tee",
            "status": "active",
            "variants": [
                {"id": 1, "price": "20.00", "inventory_quantity": 3},
                {"id": 2, "price": "22.00", "inventory_quantity": 4},
                {"id": 3, "price": "22.00"}
            ]
        }))
        .unwrap();

        let row = ShopifyProductRow::from(product);
        assert_eq!(row.price.as_deref(), Some("20.00"));
        assert_eq!(row.inventory, Some(7));
    }
}
