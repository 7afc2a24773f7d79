//! Page-number pagination over ordered result sets.
//!
//! Pages are 1-indexed. A page outside `1..=pages` is not an error: it yields
//! an empty item list with well-formed metadata, and the underlying fetch is
//! skipped entirely.

use std::future::Future;

use serde::Serialize;

/// Default number of items per page.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// The page a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub per_page: u32,
}

impl PageWindow {
    /// A window of `per_page` items (minimum 1) at the given page number.
    pub fn new(page: i64, per_page: u32) -> Self {
        Self {
            page,
            per_page: per_page.max(1),
        }
    }

    /// Rows to skip before this page. Only meaningful for in-range pages.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(i64::from(self.per_page))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    /// Total page count for a collection of `total` items.
    pub fn pages_for(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.per_page))
    }

    /// Whether this page can contain any items for a collection of `total`.
    pub fn in_range(&self, total: u64) -> bool {
        self.page >= 1 && (self.page as u64) <= self.pages_for(total)
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: u32,
    pub total: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Assemble a page from already fetched items.
    pub fn new(items: Vec<T>, window: PageWindow, total: u64) -> Self {
        let pages = window.pages_for(total);
        Self {
            items,
            page: window.page,
            per_page: window.per_page,
            total,
            pages,
            has_next: window.page < pages as i64,
            has_prev: window.page > 1,
        }
    }

    /// Candidate page number for a "next" link.
    pub fn next_page(&self) -> Option<i64> {
        self.has_next.then(|| self.page + 1)
    }

    /// Candidate page number for a "previous" link.
    pub fn prev_page(&self) -> Option<i64> {
        self.has_prev.then(|| self.page - 1)
    }

    /// Project every item, keeping the metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// Build a page, calling `fetch(limit, offset)` only when the window is in range.
pub async fn paginate<T, E, F, Fut>(window: PageWindow, total: u64, fetch: F) -> Result<Page<T>, E>
where
    F: FnOnce(i64, i64) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let items = if window.in_range(total) {
        fetch(window.limit(), window.offset()).await?
    } else {
        Vec::new()
    };

    Ok(Page::new(items, window, total))
}
