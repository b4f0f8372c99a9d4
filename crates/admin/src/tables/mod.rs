//! Data-table support for the React admin.
//!
//! - [`config`] - column/filter definitions served at `GET /api/tables/{table_id}`
//! - [`page`] - offset and cursor page envelopes
//! - [`rows`] - row shapes built from platform records

pub mod config;
pub mod page;
pub mod rows;

pub use config::DataTableConfig;
pub use page::{CursorPage, TablePage};
pub use rows::{ShopifyProductRow, StoreJobRow, WooProductRow, WpPostRow};

/// Ids accepted by [`table_config`].
pub const TABLE_IDS: &[&str] = &["woo_products", "wp_posts", "shopify_products", "store_jobs"];

/// Configuration of a table by id.
#[must_use]
pub fn table_config(table_id: &str) -> Option<DataTableConfig> {
    match table_id {
        "woo_products" => Some(config::woo_products()),
        "wp_posts" => Some(config::wp_posts()),
        "shopify_products" => Some(config::shopify_products()),
        "store_jobs" => Some(config::store_jobs()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_id_resolves() {
        for id in TABLE_IDS {
            let config = table_config(id).expect("known table");
            assert_eq!(config.table_id, *id);
            assert!(!config.default_columns().is_empty());
        }
        assert!(table_config("customers").is_none());
    }

    #[test]
    fn test_shopify_products_uses_cursor_pagination() {
        let config = config::shopify_products();
        assert_eq!(config.pagination, config::Pagination::Cursor);
        assert_eq!(config.max_per_page, 250);
    }
}
