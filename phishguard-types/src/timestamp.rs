//! Local calendar-day boundaries.
//!
//! Records carry UTC instants, but "today", "this week" and date-range
//! filters are all defined on the operator's local calendar. Every helper
//! is generic over the time zone so callers can pin it.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone};

/// The first instant of `date` in `tz`.
///
/// When midnight does not exist locally (a DST gap at 00:00) the naive
/// midnight is interpreted as UTC instead.
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// The last representable instant of `date` in `tz` (inclusive bound).
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    start_of_day(tz, next_day(date)) - TimeDelta::nanoseconds(1)
}

/// Local midnight that starts the day containing `now`.
pub fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    start_of_day(&now.timezone(), now.date_naive())
}

/// Local midnight `days` calendar days before the day containing `now`.
pub fn midnight_days_ago<Tz: TimeZone>(now: &DateTime<Tz>, days: u64) -> DateTime<Tz> {
    let date = now
        .date_naive()
        .checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN);
    start_of_day(&now.timezone(), date)
}

/// The calendar day after `date`, saturating at the end of the range.
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(NaiveDate::MAX)
}
