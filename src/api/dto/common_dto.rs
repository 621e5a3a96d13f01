//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Page, PageResult};

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl PaginationMeta {
    /// Describes `result` as page `page`.
    #[must_use]
    pub fn new<T>(page: Page, result: &PageResult<T>) -> Self {
        Self {
            page: page.page,
            per_page: page.per_page,
            total: result.total,
            total_pages: result.total_pages(page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_counts_partial_last_page() {
        let result = PageResult {
            items: vec![1, 2],
            total: 42,
        };
        let meta = PaginationMeta::new(Page::new(3, 20), &result);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.page, 3);
    }

    #[test]
    fn empty_result_has_no_pages() {
        let result: PageResult<u8> = PageResult {
            items: Vec::new(),
            total: 0,
        };
        assert_eq!(PaginationMeta::new(Page::new(1, 20), &result).total_pages, 0);
    }
}
