//! Headline numbers for the dashboard cards.

use crate::counts::{percentage, VariantCounts};
use crate::location::location_breakdown;
use chrono::{DateTime, TimeZone, Utc};
use phishguard_types::timestamp::{local_midnight, midnight_days_ago};
use phishguard_types::{SubmissionRecord, Variant};
use serde::Serialize;

/// Days covered by `week_count`, counted back from today's midnight.
pub const WEEK_DAYS: u64 = 7;

/// Summary statistics over a full collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total: usize,
    pub counts: VariantCounts,
    pub variant_a_percent: f64,
    pub variant_b_percent: f64,
    /// Submissions since local midnight today.
    pub today_count: usize,
    /// Submissions since local midnight seven days before today.
    pub week_count: usize,
    pub revealed: usize,
    pub unrevealed: usize,
    /// Busiest location, `None` for an empty collection.
    pub top_location: Option<String>,
    /// Distinct locations, "Unknown" included.
    pub unique_locations: usize,
}

impl SummaryStats {
    pub fn percent(&self, variant: Variant) -> f64 {
        match variant {
            Variant::A => self.variant_a_percent,
            Variant::B => self.variant_b_percent,
        }
    }

    /// Card label: one decimal, or "0" for an empty collection.
    pub fn percent_label(&self, variant: Variant) -> String {
        if self.total == 0 {
            "0".to_string()
        } else {
            format!("{:.1}", self.percent(variant))
        }
    }
}

/// Computes the summary cards for `records` as of `now`.
pub fn summary_stats<Tz: TimeZone>(
    records: &[SubmissionRecord],
    now: &DateTime<Tz>,
) -> SummaryStats {
    let today = local_midnight(now).with_timezone(&Utc);
    let week = midnight_days_ago(now, WEEK_DAYS).with_timezone(&Utc);

    let total = records.len();
    let counts: VariantCounts = records.iter().map(|r| r.variant).collect();
    let today_count = records.iter().filter(|r| r.timestamp >= today).count();
    let week_count = records.iter().filter(|r| r.timestamp >= week).count();
    let revealed = records.iter().filter(|r| r.revealed).count();

    let locations = location_breakdown(records);

    SummaryStats {
        total,
        counts,
        variant_a_percent: percentage(counts.variant_a, total),
        variant_b_percent: percentage(counts.variant_b, total),
        today_count,
        week_count,
        revealed,
        unrevealed: total - revealed,
        top_location: locations.first().map(|row| row.location.clone()),
        unique_locations: locations.len(),
    }
}
