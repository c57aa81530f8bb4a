//! Page-number arithmetic for search results and blog listings.

use serde::Serialize;

/// Number of pages shown on either side of the current page.
const WINDOW: u64 = 2;

/// Default page size for dataset searches.
pub const DEFAULT_SEARCH_SIZE: u64 = 10;

/// One entry of a pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PageItem {
    /// A link to the given (1-based) page.
    Page(u64),
    /// An elided run of pages, rendered as `...`.
    Gap,
}

impl PageItem {
    /// Returns the page number, or `None` for a gap.
    pub fn number(self) -> Option<u64> {
        match self {
            PageItem::Page(n) => Some(n),
            PageItem::Gap => None,
        }
    }
}

/// Builds the pagination bar for page `current` of `last`.
///
/// Always contains the first and last page and every page within two of
/// `current`. A gap of exactly one page is filled with that page; longer gaps
/// become [`PageItem::Gap`].
pub fn pagination(current: u64, last: u64) -> Vec<PageItem> {
    if last == 0 {
        return Vec::new();
    }
    if last == 1 {
        return vec![PageItem::Page(1)];
    }

    let mut range = vec![1];
    let low = current.saturating_sub(WINDOW).max(2);
    let high = current.saturating_add(WINDOW).min(last - 1);
    range.extend(low..=high);
    range.push(last);

    let mut items = Vec::with_capacity(range.len() + 2);
    let mut previous: Option<u64> = None;
    for page in range {
        if let Some(prev) = previous {
            if page - prev == 2 {
                items.push(PageItem::Page(prev + 1));
            } else if page - prev != 1 {
                items.push(PageItem::Gap);
            }
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}

/// Pagination state handed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    /// 1-based current page.
    pub current_page: u64,
    /// Total number of pages (0 when there are no results).
    pub total_pages: u64,
    /// Items per page.
    pub size: u64,
    /// The pagination bar.
    pub pages: Vec<PageItem>,
}

impl Paging {
    /// Paging for offset-based queries (`from` / `size`), as used by search.
    ///
    /// A `size` of zero falls back to [`DEFAULT_SEARCH_SIZE`].
    pub fn from_offset(from: u64, size: u64, total: u64) -> Self {
        let size = if size == 0 { DEFAULT_SEARCH_SIZE } else { size };
        let current_page = (from / size).saturating_add(1);
        let total_pages = total.div_ceil(size);
        Self {
            current_page,
            total_pages,
            size,
            pages: pagination(current_page, total_pages),
        }
    }

    /// Paging for page-numbered queries (`page` / `number`), as used by the blog.
    pub fn from_page(page: u64, per_page: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        let current_page = page.max(1);
        let total_pages = total.div_ceil(per_page);
        Self {
            current_page,
            total_pages,
            size: per_page,
            pages: pagination(current_page, total_pages),
        }
    }

    /// The `from` offset at which `page` starts.
    pub fn offset_of(&self, page: u64) -> u64 {
        page.saturating_sub(1).saturating_mul(self.size)
    }
}
