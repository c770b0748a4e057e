//! Page-number pagination over newest-first listings.

use std::num::NonZeroU32;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Splits an ordered collection into fixed-size, 1-based pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    per_page: NonZeroU32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN.saturating_add(DEFAULT_PAGE_SIZE - 1))
    }
}

impl Paginator {
    pub fn new(per_page: NonZeroU32) -> Self {
        Self { per_page }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.get()
    }

    /// Page count for `total` items. An empty collection still has one page.
    pub fn num_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.per_page())).max(1)
    }

    /// Resolve the raw `page` query value against a collection of `total` items.
    ///
    /// Missing or non-integer input selects the first page; out-of-range input
    /// is clamped to the first or last page.
    pub fn window(&self, total: u64, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages(total);
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(value)) if value < 1 => 1,
            Some(Ok(value)) => (value as u64).min(num_pages),
            Some(Err(_)) | None => 1,
        };

        PageWindow {
            number,
            num_pages,
            total,
            per_page: self.per_page(),
        }
    }

    /// Paginate an in-memory sequence that is already in display order.
    pub fn paginate<T: Clone>(&self, items: &[T], requested: Option<&str>) -> Page<T> {
        let window = self.window(items.len() as u64, requested);
        let start = (window.offset() as usize).min(items.len());
        let end = (start + window.limit() as usize).min(items.len());
        Page::new(items[start..end].to_vec(), window)
    }
}

/// Position of one page inside a paginated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub per_page: u32,
}

impl PageWindow {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn next_number(&self) -> Option<u64> {
        self.has_next().then_some(self.number + 1)
    }

    pub fn previous_number(&self) -> Option<u64> {
        self.has_previous().then_some(self.number - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self { items, window }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            window: self.window,
        }
    }
}
