//! Offset pagination.

use serde::Serialize;

/// Default page size.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A validated page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, at least 1.
    pub page: u32,
    /// Items per page, 1 through [`MAX_PAGE_LIMIT`].
    pub limit: u32,
}

impl PageRequest {
    /// Builds a request, defaulting to page 1 of [`DEFAULT_PAGE_LIMIT`] and
    /// clamping out-of-range values.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::PageRequest;
    ///
    /// let page = PageRequest::new(Some(0), Some(500));
    /// assert_eq!((page.page, page.limit), (1, 100));
    /// ```
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Cuts one page out of the full result set.
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let skip = (self.page as usize - 1).saturating_mul(self.limit as usize);
        Page {
            items: items.into_iter().skip(skip).take(self.limit as usize).collect(),
            page: self.page,
            limit: self.limit,
            total,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the size of the whole set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Items across all pages.
    pub total: usize,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` items.
    pub fn total_pages(&self) -> u32 {
        self.total.div_ceil(self.limit.max(1) as usize) as u32
    }

    /// Transforms the items, keeping the paging data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
        }
    }
}
