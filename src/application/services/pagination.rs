//! # Pagination
//!
//! Page/limit paging for listing searches.
//!
//! Pages are 1-based. The limit defaults to the configured page size and is
//! clamped to the configured maximum.

use crate::infrastructure::persistence::query::Window;
use serde::{Deserialize, Serialize};

/// Paging input as given by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// 1-based page number; defaults to 1.
    pub page: Option<u32>,
    /// Items per page; defaults to the configured page size.
    pub limit: Option<u32>,
}

impl PageParams {
    /// Creates explicit paging input.
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Resolves defaults and clamps the limit to `1..=max_limit`.
    #[must_use]
    pub fn resolve(self, default_limit: u32, max_limit: u32) -> ResolvedPage {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        ResolvedPage { page, limit }
    }
}

/// Paging input after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPage {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
}

impl ResolvedPage {
    /// Storage window for this page.
    #[must_use]
    pub fn window(&self) -> Window {
        let offset = (self.page.saturating_sub(1) as usize).saturating_mul(self.limit as usize);
        Window::new(offset, self.limit as usize)
    }
}

/// Paging metadata returned with every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Page returned.
    pub page: u32,
    /// Items per page.
    pub limit: u32,
    /// Total matches across all pages.
    pub total: u64,
    /// Number of pages.
    pub total_pages: u64,
    /// Whether a later page has items.
    pub has_next: bool,
    /// Whether this is past the first page.
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Computes metadata for `page` out of `total` matches.
    #[must_use]
    pub fn new(page: ResolvedPage, returned: usize, total: u64) -> Self {
        let limit = u64::from(page.limit.max(1));
        let skipped = u64::from(page.page.saturating_sub(1)).saturating_mul(limit);
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: total.div_ceil(limit),
            has_next: skipped.saturating_add(returned as u64) < total,
            has_prev: page.page > 1,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on this page, newest first.
    pub items: Vec<T>,
    /// Paging metadata.
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    /// Wraps a page of items.
    #[must_use]
    pub fn new(items: Vec<T>, page: ResolvedPage, total: u64) -> Self {
        let pagination = PaginationMeta::new(page, items.len(), total);
        Self { items, pagination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        assert_eq!(
            PageParams::default().resolve(20, 100),
            ResolvedPage { page: 1, limit: 20 }
        );
        assert_eq!(
            PageParams::new(0, 500).resolve(20, 100),
            ResolvedPage { page: 1, limit: 100 }
        );
        assert_eq!(PageParams::new(2, 0).resolve(20, 100).limit, 1);
    }

    #[test]
    fn zero_page_built_by_hand_is_treated_as_first() {
        let page = ResolvedPage { page: 0, limit: 0 };
        assert_eq!(page.window(), Window::new(0, 0));
        let meta = PaginationMeta::new(page, 0, 3);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_prev);
    }
    #[test]
    fn window_offsets_by_page() {
        let page = PageParams::new(3, 10).resolve(20, 100);
        assert_eq!(page.window(), Window::new(20, 10));
    }

    #[test]
    fn metadata_for_middle_page() {
        let page = PageParams::new(2, 10).resolve(20, 100);
        let meta = PaginationMeta::new(page, 10, 35);
        assert_eq!(meta.total_pages, 4);
        assert!(meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn metadata_for_last_page() {
        let page = PageParams::new(4, 10).resolve(20, 100);
        let meta = PaginationMeta::new(page, 5, 35);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn empty_result() {
        let page = PageParams::default().resolve(20, 100);
        let result: Page<u8> = Page::new(Vec::new(), page, 0);
        assert_eq!(result.pagination.total_pages, 0);
        assert!(!result.pagination.has_next);
        assert!(!result.pagination.has_prev);
    }
}
