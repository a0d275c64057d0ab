//! Skip / max paging shared by listings and queries.

use serde::Serialize;

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    /// Number of matches across all pages.
    pub total_count: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            has_more: self.has_more,
            total_count: self.total_count,
        }
    }
}

/// Counts matches as they are offered and tells the caller which ones fall
/// inside the requested window.
#[derive(Debug, Clone)]
pub struct Paginator {
    skip: usize,
    max: Option<usize>,
    seen: usize,
}

impl Paginator {
    /// Negative `skip` means 0, negative `max` means unbounded.
    pub fn new(skip: i64, max: i64) -> Self {
        Self {
            skip: usize::try_from(skip).unwrap_or(0),
            max: usize::try_from(max).ok(),
            seen: 0,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0, -1)
    }

    /// Count one match; true if it belongs on the page.
    pub fn offer(&mut self) -> bool {
        let index = self.seen;
        self.seen += 1;
        if index < self.skip {
            return false;
        }
        match self.max {
            Some(max) => index - self.skip < max,
            None => true,
        }
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Close the page. `items` are the accepted matches that were kept.
    pub fn finish<T>(self, items: Vec<T>) -> Page<T> {
        let has_more = self.skip.saturating_add(items.len()) < self.seen;
        Page {
            items,
            has_more,
            total_count: self.seen,
        }
    }

    pub fn paginate<T>(mut self, items: impl IntoIterator<Item = T>) -> Page<T> {
        let mut page = Vec::new();
        for item in items {
            if self.offer() {
                page.push(item);
            }
        }
        self.finish(page)
    }
}
