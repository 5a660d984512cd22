//! Query engine for PhishGuard submissions.
//!
//! Pure functions over a snapshot of the canonical collection: filter,
//! stable sort and 1-based pagination, plus the dashboard's [`ViewState`].
//! Results depend only on the records, the query and the time zone used to
//! interpret calendar-day bounds.

mod filter;
mod page;
mod sort;
mod view;

pub use filter::{
    filter_records, unique_locations, BoundFilter, LocationFilter, RevealFilter, SubmissionFilter,
};
pub use page::{clamp_page, paginate, total_pages, Page, DEFAULT_PAGE_SIZE};
pub use sort::{SortColumn, SortDirection, SortSpec};
pub use view::ViewState;

use chrono::TimeZone;
use phishguard_types::SubmissionRecord;

/// Filters then stably sorts `records`.
pub fn apply<'a, Tz: TimeZone>(
    records: &'a [SubmissionRecord],
    filter: &SubmissionFilter,
    sort: &SortSpec,
    tz: &Tz,
) -> Vec<&'a SubmissionRecord> {
    let mut rows = filter_records(records, filter, tz);
    sort.sort(&mut rows);
    rows
}
