//! Page envelopes returned to the data tables.

use serde::Serialize;

use crate::shopify;
use crate::wordpress::Paged;

/// Offset-paginated rows with totals.
#[derive(Debug, Clone, Serialize)]
pub struct TablePage<T> {
    pub rows: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> TablePage<T> {
    /// Build from rows and a known total; `page` is 1-based.
    #[must_use]
    pub fn new(rows: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            u32::try_from(total.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
        };
        Self::with_pages(rows, page, per_page, total, total_pages)
    }

    /// Convert a WordPress/WooCommerce page, keeping its header totals.
    #[must_use]
    pub fn from_paged<U>(paged: Paged<U>, row: impl FnMut(U) -> T) -> Self {
        let rows = paged.items.into_iter().map(row).collect();
        Self::with_pages(rows, paged.page, paged.per_page, paged.total, paged.total_pages)
    }

    fn with_pages(rows: Vec<T>, page: u32, per_page: u32, total: u64, total_pages: u32) -> Self {
        let page = page.max(1);
        Self {
            rows,
            page,
            per_page,
            total,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

/// Cursor-paginated rows (Shopify `page_info`).
#[derive(Debug, Clone, Serialize)]
pub struct CursorPage<T> {
    pub rows: Vec<T>,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
}

impl<T> CursorPage<T> {
    #[must_use]
    pub fn from_shopify<U>(page: shopify::CursorPage<U>, row: impl FnMut(U) -> T) -> Self {
        Self {
            rows: page.items.into_iter().map(row).collect(),
            next_cursor: page.next_page_info,
            previous_cursor: page.previous_page_info,
        }
    }
}
