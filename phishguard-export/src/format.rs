//! Export formats, file naming and size estimates.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Comma-separated values with a header row.
    Delimited,
    /// Pretty-printed JSON array of records.
    Structured,
    /// Comma-joined email addresses.
    EmailList,
}

impl ExportFormat {
    /// Rough bytes per record, used for the preview estimate.
    pub const fn bytes_per_record(&self) -> u64 {
        match self {
            ExportFormat::Delimited => 200,
            ExportFormat::Structured => 400,
            ExportFormat::EmailList => 30,
        }
    }

    pub const fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Delimited => "text/csv;charset=utf-8;",
            ExportFormat::Structured => "application/json",
            ExportFormat::EmailList => "text/plain",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Delimited => "csv",
            ExportFormat::Structured => "json",
            ExportFormat::EmailList => "txt",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Delimited => "CSV",
            ExportFormat::Structured => "JSON",
            ExportFormat::EmailList => "email list",
        })
    }
}

/// Which records an email list includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailScope {
    /// Only records not yet revealed.
    #[default]
    Unrevealed,
    All,
}

impl EmailScope {
    /// Filename segment.
    pub const fn suffix(&self) -> &'static str {
        match self {
            EmailScope::Unrevealed => "unrevealed",
            EmailScope::All => "all",
        }
    }
}

/// `YYYY-MM-DD-HHMM` in the zone of `at`.
pub fn filename_stamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    at.format("%Y-%m-%d-%H%M").to_string()
}

/// The download name for an export taken at `at`.
pub fn export_filename<Tz: TimeZone>(
    format: ExportFormat,
    scope: EmailScope,
    at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: fmt::Display,
{
    let stamp = filename_stamp(at);
    match format {
        ExportFormat::Delimited => format!("phishguard-submissions-{stamp}.csv"),
        ExportFormat::Structured => format!("phishguard-data-{stamp}.json"),
        ExportFormat::EmailList => format!("phishguard-emails-{}-{stamp}.txt", scope.suffix()),
    }
}

/// Preview of an export before it is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportInfo {
    pub record_count: usize,
    pub estimated_bytes: u64,
    /// Human-readable estimate ("12 KB").
    pub estimated_size: String,
}

/// Estimates the size of exporting `record_count` records as `format`.
pub fn export_info(record_count: usize, format: ExportFormat) -> ExportInfo {
    let estimated_bytes = record_count as u64 * format.bytes_per_record();
    ExportInfo {
        record_count,
        estimated_bytes,
        estimated_size: format_bytes(estimated_bytes),
    }
}

const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// Formats a byte count with base-1024 units, rounded to a whole number.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut unit = 0;
    let mut scale = 1u64;
    while unit + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }
    format!("{} {}", (bytes as f64 / scale as f64).round(), UNITS[unit])
}
