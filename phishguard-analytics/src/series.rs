//! Day-bucketed chart series.
//!
//! Buckets are aligned to local midnight: bucket `d` covers
//! `[start_of_day(d), start_of_day(d + 1))`. The last bucket is the day
//! containing `now`.

use crate::counts::VariantCounts;
use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use phishguard_types::timestamp::{next_day, start_of_day};
use phishguard_types::SubmissionRecord;
use serde::Serialize;

/// Trailing days shown by the daily bar chart.
pub const DAILY_WINDOW_DAYS: usize = 7;

/// Trailing days shown by the cumulative timeline.
pub const TIMELINE_WINDOW_DAYS: usize = 14;

/// One local calendar day of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    /// The local day this bucket covers.
    pub date: NaiveDate,
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end (the next local midnight).
    pub end: DateTime<Utc>,
    pub counts: VariantCounts,
}

impl DayBucket {
    pub fn total(&self) -> usize {
        self.counts.total()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Empty buckets for the `days` local days ending with today, oldest first.
pub fn day_buckets<Tz: TimeZone>(days: usize, now: &DateTime<Tz>) -> Vec<DayBucket> {
    let tz = now.timezone();
    let today = now.date_naive();
    (0..days)
        .rev()
        .map(|back| {
            let date = today
                .checked_sub_days(Days::new(back as u64))
                .unwrap_or(NaiveDate::MIN);
            DayBucket {
                date,
                start: start_of_day(&tz, date).with_timezone(&Utc),
                end: start_of_day(&tz, next_day(date)).with_timezone(&Utc),
                counts: VariantCounts::default(),
            }
        })
        .collect()
}

fn bucket_index(buckets: &[DayBucket], instant: DateTime<Utc>) -> Option<usize> {
    let (first, last) = (buckets.first()?, buckets.last()?);
    if instant < first.start || instant >= last.end {
        return None;
    }
    buckets
        .partition_point(|bucket| bucket.start <= instant)
        .checked_sub(1)
}

/// Per-variant submissions for each of the trailing `days` local days.
pub fn daily_series<Tz: TimeZone>(
    records: &[SubmissionRecord],
    days: usize,
    now: &DateTime<Tz>,
) -> Vec<DayBucket> {
    let mut buckets = day_buckets(days, now);
    for record in records {
        if let Some(index) = bucket_index(&buckets, record.timestamp) {
            buckets[index].counts.add(record.variant);
        }
    }
    buckets
}

/// Running per-variant totals over the trailing `days` local days,
/// counted from the start of the window. Always returns `days` buckets.
pub fn cumulative_series<Tz: TimeZone>(
    records: &[SubmissionRecord],
    days: usize,
    now: &DateTime<Tz>,
) -> Vec<DayBucket> {
    let mut buckets = daily_series(records, days, now);
    let mut running = VariantCounts::default();
    for bucket in &mut buckets {
        running = running.plus(bucket.counts);
        bucket.counts = running;
    }
    buckets
}
