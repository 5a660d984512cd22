//! Grouping by location and by variant.

use crate::counts::{percentage, VariantCounts};
use phishguard_types::{SubmissionRecord, Variant};
use serde::Serialize;
use std::collections::HashMap;

/// Submissions captured at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    /// The tag, or "Unknown" for records without one.
    pub location: String,
    pub counts: VariantCounts,
}

impl LocationCount {
    pub fn total(&self) -> usize {
        self.counts.total()
    }
}

/// Per-location variant counts, busiest location first. Ties keep the
/// order in which locations first appear in `records`.
pub fn location_breakdown(records: &[SubmissionRecord]) -> Vec<LocationCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<LocationCount> = Vec::new();

    for record in records {
        let label = record.location_label();
        let slot = *index.entry(label).or_insert_with(|| {
            rows.push(LocationCount {
                location: label.to_string(),
                counts: VariantCounts::default(),
            });
            rows.len() - 1
        });
        rows[slot].counts.add(record.variant);
    }

    rows.sort_by(|a, b| b.total().cmp(&a.total()));
    rows
}

/// One slice of the variant distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantShare {
    pub variant: Variant,
    /// Chart label ("Variant A").
    pub label: &'static str,
    pub count: usize,
    pub percent: f64,
}

/// Both variants with their counts and shares, A first.
pub fn variant_distribution(records: &[SubmissionRecord]) -> [VariantShare; 2] {
    let counts: VariantCounts = records.iter().map(|r| r.variant).collect();
    let total = counts.total();
    Variant::ALL.map(|variant| VariantShare {
        variant,
        label: variant.label(),
        count: counts.get(variant),
        percent: percentage(counts.get(variant), total),
    })
}
