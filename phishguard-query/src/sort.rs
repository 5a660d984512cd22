//! Column sorting.
//!
//! Each column has one typed comparator. Descending order reverses the
//! comparator, not the output, so equal keys keep their input order in both
//! directions.

use phishguard_types::SubmissionRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Email,
    Variant,
    Location,
    Timestamp,
    Revealed,
}

impl SortColumn {
    /// Compares two records on this column, ascending.
    pub fn compare(&self, a: &SubmissionRecord, b: &SubmissionRecord) -> Ordering {
        match self {
            SortColumn::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
            SortColumn::Variant => a.variant.cmp(&b.variant),
            SortColumn::Location => location_key(a).cmp(location_key(b)),
            SortColumn::Timestamp => a.timestamp.cmp(&b.timestamp),
            SortColumn::Revealed => a.revealed.cmp(&b.revealed),
        }
    }
}

fn location_key(record: &SubmissionRecord) -> &str {
    record.location_tag.as_deref().unwrap_or("")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// A column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        Self {
            column: SortColumn::Timestamp,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    pub const fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn compare(&self, a: &SubmissionRecord, b: &SubmissionRecord) -> Ordering {
        let ordering = self.column.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    /// Header click: the active column flips direction, any other column
    /// becomes active in descending order.
    #[must_use]
    pub fn toggled(self, column: SortColumn) -> Self {
        if self.column == column {
            Self::new(column, self.direction.reversed())
        } else {
            Self::new(column, SortDirection::Descending)
        }
    }

    /// Stable in-place sort.
    pub fn sort(&self, records: &mut [&SubmissionRecord]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}
