//! Record filters.
//!
//! Every criterion is optional and they combine with AND. Date bounds are
//! local calendar days, converted to instants in the caller's time zone.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use phishguard_types::timestamp::{end_of_day, start_of_day};
use phishguard_types::{SubmissionRecord, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Location criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "tag")]
pub enum LocationFilter {
    #[default]
    Any,
    /// Exact tag match.
    Tag(String),
    /// Records with an absent or empty tag.
    Unspecified,
}

impl LocationFilter {
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        match self {
            LocationFilter::Any => true,
            LocationFilter::Tag(tag) => record.location_tag.as_deref() == Some(tag.as_str()),
            LocationFilter::Unspecified => record.location().is_none(),
        }
    }
}

/// Reveal-state criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealFilter {
    #[default]
    All,
    Revealed,
    Unrevealed,
}

impl RevealFilter {
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        match self {
            RevealFilter::All => true,
            RevealFilter::Revealed => record.revealed,
            RevealFilter::Unrevealed => !record.revealed,
        }
    }
}

/// Dashboard filter. The default matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionFilter {
    /// Case-insensitive substring of the email.
    pub email_query: Option<String>,
    pub variant: Option<Variant>,
    pub location: LocationFilter,
    pub revealed: RevealFilter,
    /// First local day included.
    pub start_date: Option<NaiveDate>,
    /// Last local day included.
    pub end_date: Option<NaiveDate>,
}

impl SubmissionFilter {
    /// Returns true if no criterion is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Resolves the filter against a time zone for repeated matching.
    pub fn bind<Tz: TimeZone>(&self, tz: &Tz) -> BoundFilter<'_> {
        let needle = self
            .email_query
            .as_deref()
            .filter(|query| !query.is_empty())
            .map(str::to_lowercase);
        BoundFilter {
            filter: self,
            needle,
            start: self
                .start_date
                .map(|date| start_of_day(tz, date).with_timezone(&Utc)),
            end: self
                .end_date
                .map(|date| end_of_day(tz, date).with_timezone(&Utc)),
        }
    }

    /// Matches a single record. Prefer [`bind`](Self::bind) in loops.
    pub fn matches<Tz: TimeZone>(&self, record: &SubmissionRecord, tz: &Tz) -> bool {
        self.bind(tz).matches(record)
    }
}

/// A filter with its date bounds and search needle precomputed.
#[derive(Debug, Clone)]
pub struct BoundFilter<'a> {
    filter: &'a SubmissionFilter,
    needle: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl BoundFilter<'_> {
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        self.needle
            .as_deref()
            .is_none_or(|needle| record.email.to_lowercase().contains(needle))
            && self.filter.variant.is_none_or(|variant| record.variant == variant)
            && self.filter.location.matches(record)
            && self.filter.revealed.matches(record)
            && self.start.is_none_or(|start| record.timestamp >= start)
            && self.end.is_none_or(|end| record.timestamp <= end)
    }
}

/// Records passing `filter`, in their original order.
pub fn filter_records<'a, Tz: TimeZone>(
    records: &'a [SubmissionRecord],
    filter: &SubmissionFilter,
    tz: &Tz,
) -> Vec<&'a SubmissionRecord> {
    let bound = filter.bind(tz);
    records.iter().filter(|record| bound.matches(record)).collect()
}

/// Sorted distinct non-empty location tags.
pub fn unique_locations(records: &[SubmissionRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(SubmissionRecord::location)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
