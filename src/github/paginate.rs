//! Page-number pagination over list endpoints.

use crate::error::Result;

/// Largest page size the GitHub API accepts.
pub const MAX_PER_PAGE: usize = 100;

/// Collects every page of a list endpoint.
///
/// A page shorter than `per_page` (including an empty one) is the last page.
/// With a limit, the result is truncated to exactly that many records and no
/// page past the one that satisfied the limit is requested.
pub struct Paginator<'a> {
    per_page: usize,
    limit: Option<usize>,
    on_full_page: Option<Box<dyn FnMut(usize) + 'a>>,
}

impl<'a> Paginator<'a> {
    /// Create a paginator requesting `per_page` records per page.
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            limit: None,
            on_full_page: None,
        }
    }

    /// Stop after this many records.
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Called with the running total every time a full page is consumed.
    pub fn on_full_page(mut self, f: impl FnMut(usize) + 'a) -> Self {
        self.on_full_page = Some(Box::new(f));
        self
    }

    /// Run the fetch loop. `fetch_page` receives 1-based page numbers.
    ///
    /// The first error aborts the loop and is returned as-is.
    pub fn fetch<T, F>(mut self, mut fetch_page: F) -> Result<Vec<T>>
    where
        F: FnMut(u32) -> Result<Vec<T>>,
    {
        let mut records = Vec::new();
        if self.limit == Some(0) {
            return Ok(records);
        }

        let mut page = 1u32;
        loop {
            let items = fetch_page(page)?;
            let count = items.len();
            records.extend(items);

            if let Some(limit) = self.limit
                && records.len() >= limit
            {
                records.truncate(limit);
                break;
            }

            if count < self.per_page {
                break;
            }

            tracing::info!(page, fetched = records.len(), "fetched full page");
            if let Some(f) = self.on_full_page.as_mut() {
                f(records.len());
            }
            page += 1;
        }

        Ok(records)
    }
}

/// Query parameters for one page of a list endpoint.
pub(crate) fn page_params(per_page: usize, page: u32) -> Vec<(&'static str, String)> {
    vec![("per_page", per_page.to_string()), ("page", page.to_string())]
}
