//! Dashboard query state.

use crate::apply;
use crate::filter::{LocationFilter, RevealFilter, SubmissionFilter};
use crate::page::{clamp_page, paginate, Page, DEFAULT_PAGE_SIZE};
use crate::sort::{SortColumn, SortSpec};
use chrono::{NaiveDate, TimeZone};
use phishguard_types::{SubmissionRecord, Variant};
use serde::{Deserialize, Serialize};

/// Filter, sort and page selection behind the submissions table.
///
/// Changing any filter criterion returns to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    filter: SubmissionFilter,
    sort: SortSpec,
    page: usize,
    page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter: SubmissionFilter::default(),
            sort: SortSpec::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self.page = 1;
        self
    }

    pub fn filter(&self) -> &SubmissionFilter {
        &self.filter
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    /// The requested page. See [`view`](Self::view) for the displayed one.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    // ── Filters ──────────────────────────────────────────────────

    /// Replaces the whole filter.
    pub fn set_filter(&mut self, filter: SubmissionFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_email_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        self.filter.email_query = (!query.is_empty()).then_some(query);
        self.page = 1;
    }

    pub fn set_variant(&mut self, variant: Option<Variant>) {
        self.filter.variant = variant;
        self.page = 1;
    }

    pub fn set_location(&mut self, location: LocationFilter) {
        self.filter.location = location;
        self.page = 1;
    }

    pub fn set_revealed(&mut self, revealed: RevealFilter) {
        self.filter.revealed = revealed;
        self.page = 1;
    }

    pub fn set_date_range(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        self.filter.start_date = start;
        self.filter.end_date = end;
        self.page = 1;
    }

    /// Clears every criterion.
    pub fn clear_filters(&mut self) {
        self.set_filter(SubmissionFilter::default());
    }

    // ── Sort and paging ──────────────────────────────────────────

    /// Header click on `column`.
    pub fn toggle_sort(&mut self, column: SortColumn) {
        self.sort = self.sort.toggled(column);
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn next_page(&mut self) {
        self.page = self.page.saturating_add(1);
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Filters, sorts and pages `records`. The displayed page is the
    /// requested one clamped to the available pages.
    pub fn view<'a, Tz: TimeZone>(
        &self,
        records: &'a [SubmissionRecord],
        tz: &Tz,
    ) -> Page<&'a SubmissionRecord> {
        let rows = apply(records, &self.filter, &self.sort, tz);
        let total_pages = crate::page::total_pages(rows.len(), self.page_size);
        paginate(&rows, clamp_page(self.page, total_pages), self.page_size)
    }
}
