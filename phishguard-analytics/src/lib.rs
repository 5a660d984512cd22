//! Aggregation engine for PhishGuard submissions.
//!
//! Pure functions over the full canonical collection. Anything involving
//! "today" takes `now` explicitly, so results are reproducible and the
//! time zone is the caller's choice.

mod counts;
mod location;
mod series;
mod summary;

pub use counts::{percentage, VariantCounts};
pub use location::{location_breakdown, variant_distribution, LocationCount, VariantShare};
pub use series::{
    cumulative_series, daily_series, day_buckets, DayBucket, DAILY_WINDOW_DAYS,
    TIMELINE_WINDOW_DAYS,
};
pub use summary::{summary_stats, SummaryStats, WEEK_DAYS};
