use std::borrow::Cow;

/// One page of a filtered collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Active page after clamping, 1-based
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub match_count: usize,
}

impl<T> Page<T> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// 1-based position of the first row on this page, for numbering.
    pub fn first_index(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size + 1
    }
}

/// Case-insensitive substring match against any of the fields.
/// An empty term matches everything.
pub fn matches_term<S: AsRef<str>>(fields: &[S], term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    fields
        .iter()
        .any(|field| field.as_ref().to_lowercase().contains(&needle))
}

pub fn total_pages(match_count: usize, page_size: usize) -> usize {
    match_count.div_ceil(page_size.max(1))
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Filter `items` by `term` over the fields `search` yields, keep their
/// original order, then cut out page `page` of size `page_size`.
pub fn visible_rows<T, F>(items: &[T], search: F, term: &str, page: usize, page_size: usize) -> Page<T>
where
    T: Clone,
    F: Fn(&T) -> Vec<Cow<'_, str>>,
{
    let page_size = page_size.max(1);
    let matched: Vec<&T> = items
        .iter()
        .filter(|item| matches_term(&search(*item), term))
        .collect();

    let match_count = matched.len();
    let total_pages = total_pages(match_count, page_size);
    let page = clamp_page(page, total_pages);

    let rows = matched
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();

    Page {
        rows,
        page,
        page_size,
        total_pages,
        match_count,
    }
}

/// Search text, page size and active page of one list screen.
///
/// Changing the search text or the page size always returns to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    search: String,
    page: usize,
    page_size: usize,
}

impl ListView {
    pub fn new(page_size: usize) -> Self {
        Self {
            search: String::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    /// Start pre-filtered, e.g. from a search typed on another screen.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.set_search(term);
        self
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.page = 1;
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Unclamped; the next derivation clamps it.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self, total_pages: usize) {
        self.page = clamp_page(self.page + 1, total_pages);
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Back to the first page, search and size kept.
    pub(crate) fn reset_page(&mut self) {
        self.page = 1;
    }

    pub(crate) fn clamp_to(&mut self, total_pages: usize) {
        self.page = clamp_page(self.page, total_pages);
    }
}

impl Default for ListView {
    fn default() -> Self {
        Self::new(10)
    }
}
