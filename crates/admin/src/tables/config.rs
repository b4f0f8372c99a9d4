//! Column, filter and bulk action definitions for the React data tables.

use serde::Serialize;

/// How the UI renders a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Number,
    Money,
    DateTime,
    Status,
    Image,
    Link,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableColumn {
    /// Row field rendered in this column.
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
    pub sortable: bool,
    pub default_visible: bool,
}

impl TableColumn {
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self {
            key,
            label,
            kind,
            sortable: false,
            default_visible: true,
        }
    }

    #[must_use]
    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.default_visible = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Select,
    Number,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOption {
    pub value: &'static str,
    pub label: &'static str,
}

impl FilterOption {
    #[must_use]
    pub const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

/// A filter, sent back by the UI as the query parameter `key`.
#[derive(Debug, Clone, Serialize)]
pub struct TableFilter {
    pub key: &'static str,
    pub label: &'static str,
    pub filter_type: FilterType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    #[must_use]
    pub const fn number(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Number,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub const fn select(key: &'static str, label: &'static str, options: Vec<FilterOption>) -> Self {
        Self {
            key,
            label,
            filter_type: FilterType::Select,
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkAction {
    pub key: &'static str,
    pub label: &'static str,
    pub destructive: bool,
}

impl BulkAction {
    #[must_use]
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            destructive: false,
        }
    }

    #[must_use]
    pub const fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// How the table pages through its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pagination {
    /// `page` / `per_page` with totals.
    Offset,
    /// Opaque `cursor` tokens, no totals.
    Cursor,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataTableConfig {
    pub table_id: &'static str,
    /// Endpoint the rows are fetched from.
    pub endpoint: &'static str,
    pub pagination: Pagination,
    pub max_per_page: u32,
    pub columns: Vec<TableColumn>,
    pub filters: Vec<TableFilter>,
    pub bulk_actions: Vec<BulkAction>,
    pub search_placeholder: Option<&'static str>,
    pub empty_title: &'static str,
}

impl DataTableConfig {
    #[must_use]
    pub const fn new(table_id: &'static str, endpoint: &'static str) -> Self {
        Self {
            table_id,
            endpoint,
            pagination: Pagination::Offset,
            max_per_page: 100,
            columns: Vec::new(),
            filters: Vec::new(),
            bulk_actions: Vec::new(),
            search_placeholder: None,
            empty_title: "No items found",
        }
    }

    #[must_use]
    pub const fn cursor(mut self, max_per_page: u32) -> Self {
        self.pagination = Pagination::Cursor;
        self.max_per_page = max_per_page;
        self
    }

    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn bulk_action(mut self, action: BulkAction) -> Self {
        self.bulk_actions.push(action);
        self
    }

    #[must_use]
    pub const fn search(mut self, placeholder: &'static str) -> Self {
        self.search_placeholder = Some(placeholder);
        self
    }

    #[must_use]
    pub const fn empty(mut self, title: &'static str) -> Self {
        self.empty_title = title;
        self
    }

    /// Keys of the columns shown by default.
    #[must_use]
    pub fn default_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.default_visible)
            .map(|c| c.key)
            .collect()
    }
}

#[must_use]
pub fn woo_products() -> DataTableConfig {
    DataTableConfig::new("woo_products", "/api/woocommerce/products")
        .column(TableColumn::new("image", "", ColumnKind::Image))
        .column(TableColumn::new("name", "Product", ColumnKind::Link).sortable())
        .column(TableColumn::new("sku", "SKU", ColumnKind::Text))
        .column(TableColumn::new("price", "Price", ColumnKind::Money).sortable())
        .column(TableColumn::new("stock", "Stock", ColumnKind::Number))
        .column(TableColumn::new("status", "Status", ColumnKind::Status))
        .column(TableColumn::new("categories", "Categories", ColumnKind::Text).hidden())
        .column(TableColumn::new("modified", "Modified", ColumnKind::DateTime).sortable().hidden())
        .filter(TableFilter::select(
            "status",
            "Status",
            vec![
                FilterOption::new("publish", "Published"),
                FilterOption::new("draft", "Draft"),
                FilterOption::new("pending", "Pending review"),
                FilterOption::new("private", "Private"),
            ],
        ))
        .filter(TableFilter::number("category", "Category ID"))
        .bulk_action(BulkAction::new("publish", "Publish"))
        .bulk_action(BulkAction::new("draft", "Move to draft"))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .search("Search products...")
        .empty("No products found")
}

#[must_use]
pub fn wp_posts() -> DataTableConfig {
    DataTableConfig::new("wp_posts", "/api/wordpress/posts")
        .column(TableColumn::new("title", "Title", ColumnKind::Link).sortable())
        .column(TableColumn::new("status", "Status", ColumnKind::Status))
        .column(TableColumn::new("slug", "Slug", ColumnKind::Text).hidden())
        .column(TableColumn::new("seo_title", "SEO title", ColumnKind::Text))
        .column(TableColumn::new("focus_keyword", "Focus keyword", ColumnKind::Text))
        .column(TableColumn::new("date", "Published", ColumnKind::DateTime).sortable())
        .column(TableColumn::new("modified", "Modified", ColumnKind::DateTime).hidden())
        .filter(TableFilter::select(
            "status",
            "Status",
            vec![
                FilterOption::new("publish", "Published"),
                FilterOption::new("draft", "Draft"),
                FilterOption::new("future", "Scheduled"),
                FilterOption::new("private", "Private"),
            ],
        ))
        .search("Search posts...")
        .empty("No posts found")
}

#[must_use]
pub fn shopify_products() -> DataTableConfig {
    DataTableConfig::new("shopify_products", "/api/shopify/products")
        .cursor(250)
        .column(TableColumn::new("image", "", ColumnKind::Image))
        .column(TableColumn::new("title", "Product", ColumnKind::Link))
        .column(TableColumn::new("vendor", "Vendor", ColumnKind::Text))
        .column(TableColumn::new("product_type", "Type", ColumnKind::Text).hidden())
        .column(TableColumn::new("price", "Price", ColumnKind::Money))
        .column(TableColumn::new("inventory", "Inventory", ColumnKind::Number))
        .column(TableColumn::new("status", "Status", ColumnKind::Status))
        .bulk_action(BulkAction::new("generate_seo", "Generate SEO"))
        .bulk_action(BulkAction::new("delete", "Delete").destructive())
        .empty("No products found")
}

#[must_use]
pub fn store_jobs() -> DataTableConfig {
    DataTableConfig::new("store_jobs", "/api/stores/jobs")
        .column(TableColumn::new("store_name", "Store", ColumnKind::Text))
        .column(TableColumn::new("status", "Status", ColumnKind::Status))
        .column(TableColumn::new("store_domain", "Domain", ColumnKind::Link))
        .column(TableColumn::new("products_created", "Products", ColumnKind::Number))
        .column(TableColumn::new("error_message", "Error", ColumnKind::Text).hidden())
        .column(TableColumn::new("webhook_delivered", "Webhook", ColumnKind::Status).hidden())
        .column(TableColumn::new("created_at", "Created", ColumnKind::DateTime).sortable())
        .column(TableColumn::new("finished_at", "Finished", ColumnKind::DateTime))
        .filter(TableFilter::select(
            "status",
            "Status",
            vec![
                FilterOption::new("pending", "Pending"),
                FilterOption::new("creating_store", "Creating store"),
                FilterOption::new("populating", "Populating"),
                FilterOption::new("completed", "Completed"),
                FilterOption::new("failed", "Failed"),
            ],
        ))
        .empty("No stores created yet")
}

