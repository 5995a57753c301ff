//! Page windows over list views, with wrap-around stepping.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// Rows per page used by every dashboard table unless configured otherwise.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 6;

/// Tracks the current page of one list view.
///
/// Pages are 1-based. The paginator never holds the items themselves, so the
/// underlying list may change between calls; the current page is not clamped
/// when it does, and an out-of-range page simply shows an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    items_per_page: NonZeroUsize,
    current_page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_ITEMS_PER_PAGE)
    }
}

impl Paginator {
    pub fn new(items_per_page: NonZeroUsize) -> Self {
        Self {
            items_per_page,
            current_page: 1,
        }
    }

    /// Like [`Paginator::new`], falling back to the default size for zero.
    pub fn with_page_size(items_per_page: usize) -> Self {
        let size = NonZeroUsize::new(items_per_page)
            .or_else(|| NonZeroUsize::new(DEFAULT_ITEMS_PER_PAGE))
            .unwrap_or(NonZeroUsize::MIN);
        Self::new(size)
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page.get()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Number of pages for `len` items. Never less than one.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.items_per_page.get()).max(1)
    }

    /// Jumps straight to `page`. No bounds checking.
    pub fn handle_page_change(&mut self, page: usize) {
        self.current_page = page;
    }

    /// Steps back one page, wrapping from the first page to the last.
    pub fn previous(&mut self, total_pages: usize) {
        self.current_page = if self.current_page <= 1 {
            total_pages.max(1)
        } else {
            self.current_page - 1
        };
    }

    /// Steps forward one page, wrapping from the last page to the first.
    pub fn next(&mut self, total_pages: usize) {
        self.current_page = if self.current_page >= total_pages {
            1
        } else {
            self.current_page + 1
        };
    }

    /// The slice of `items` visible on the current page.
    pub fn current_items<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let Some(offset) = self.current_page.checked_sub(1) else {
            return &[];
        };
        let per_page = self.items_per_page.get();
        let start = offset.saturating_mul(per_page).min(items.len());
        let end = start.saturating_add(per_page).min(items.len());
        &items[start..end]
    }

    /// An owned copy of the current window along with paging metadata.
    pub fn page<T: Clone>(&self, items: &[T]) -> Page<T> {
        Page {
            current_page: self.current_page,
            total_pages: self.total_pages(items.len()),
            items_per_page: self.items_per_page.get(),
            total_items: items.len(),
            items: self.current_items(items).to_vec(),
        }
    }
}

/// A window of a list view as handed to the display layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub current_page: usize,
    pub total_pages: usize,
    pub items_per_page: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
