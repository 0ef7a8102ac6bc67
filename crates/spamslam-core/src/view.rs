//! Derived view of the inventory: filter, sort, paginate.

use std::cmp::Ordering;

use crate::inventory::DomainRecord;

/// Companies shown per page.
pub const PAGE_SIZE: usize = 9;

/// Ordering of the company grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Most messages first.
    #[default]
    Frequency,
    /// Most recently seen first; unknown dates last.
    Recency,
    /// By domain, case-insensitive.
    Alphabetical,
}

impl SortMode {
    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "frequency" | "freq" | "by-frequency" => Some(Self::Frequency),
            "recency" | "recent" | "by-recency" => Some(Self::Recency),
            "alphabetical" | "alpha" => Some(Self::Alphabetical),
            _ => None,
        }
    }

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Frequency => "frequency",
            Self::Recency => "recency",
            Self::Alphabetical => "alphabetical",
        }
    }

    fn compare(self, a: &DomainRecord, b: &DomainRecord) -> Ordering {
        match self {
            Self::Frequency => b.message_count().cmp(&a.message_count()),
            Self::Recency => b.last_seen().cmp(&a.last_seen()),
            Self::Alphabetical => locale_cmp(a.domain(), b.domain()),
        }
    }
}

/// A sort mode name that is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort mode '{0}' (expected frequency, recency or alphabetical)")]
pub struct UnknownSortMode(pub String);

impl std::str::FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UnknownSortMode(s.to_string()))
    }
}

/// Compares case-insensitively, with lowercase before uppercase when the
/// letters are otherwise equal.
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Transient UI state driving the projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    query: String,
    sort: SortMode,
    page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort: SortMode::default(),
            page: 1,
        }
    }
}

impl ViewState {
    /// The search text as entered.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current sort mode.
    #[must_use]
    pub const fn sort(&self) -> SortMode {
        self.sort
    }

    /// Current page, 1-based. Only guaranteed in range after a projection.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Sets the search text and returns to the first page.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    /// Sets the sort mode and returns to the first page.
    pub const fn set_sort(&mut self, sort: SortMode) {
        self.sort = sort;
        self.page = 1;
    }

    /// Moves to a page. Out-of-range values are clamped at projection time.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    fn needle(&self) -> String {
        self.query.trim().to_lowercase()
    }
}

/// One page of the projected inventory.
#[derive(Debug, Clone)]
pub struct Page<'a> {
    /// Records on this page, in display order.
    pub items: Vec<&'a DomainRecord>,
    /// Current page number, 1-based.
    pub number: usize,
    /// Total pages; at least 1.
    pub total_pages: usize,
    /// Records that passed the filter, across all pages.
    pub filtered_count: usize,
}

/// A pager button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageButton {
    /// Page number shown on the button.
    pub number: usize,
    /// Whether this is the current page.
    pub active: bool,
}

/// State of the select-all box for the visible page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    /// Nothing on the page is selected (or the page is empty).
    Unchecked,
    /// Some, but not all, records on the page are selected.
    Indeterminate,
    /// Every record on the page is selected.
    Checked,
}

impl Page<'_> {
    /// True when no record is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// One button per page number, current page marked active.
    #[must_use]
    pub fn page_buttons(&self) -> Vec<PageButton> {
        (1..=self.total_pages)
            .map(|number| PageButton {
                number,
                active: number == self.number,
            })
            .collect()
    }

    /// Domains visible on this page.
    #[must_use]
    pub fn visible_domains(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|record| record.domain().to_string())
            .collect()
    }

    /// Select-all tri-state derived from the visible records.
    #[must_use]
    pub fn select_all_state(&self) -> SelectAllState {
        let selected = self.items.iter().filter(|r| r.is_selected()).count();
        if selected == 0 {
            SelectAllState::Unchecked
        } else if selected == self.items.len() {
            SelectAllState::Checked
        } else {
            SelectAllState::Indeterminate
        }
    }
}

/// Projects `records` through `state`, clamping the state's page into
/// range.
pub fn project<'a>(records: &'a [DomainRecord], state: &mut ViewState) -> Page<'a> {
    let needle = state.needle();
    let mut filtered: Vec<&DomainRecord> = records
        .iter()
        .filter(|record| record.matches(&needle))
        .collect();

    // `sort_by` is stable, so ties keep creation order.
    let sort = state.sort;
    filtered.sort_by(|a, b| sort.compare(a, b));

    let total_pages = filtered.len().div_ceil(PAGE_SIZE).max(1);
    state.page = state.page.clamp(1, total_pages);

    let start = (state.page - 1) * PAGE_SIZE;
    let filtered_count = filtered.len();
    let items = filtered.into_iter().skip(start).take(PAGE_SIZE).collect();

    Page {
        items,
        number: state.page,
        total_pages,
        filtered_count,
    }
}
