//! Export service for PhishGuard submissions.
//!
//! Turns a (usually filtered) sequence of records into one of three
//! artifacts and hands it to a [`FileSink`] or a [`Clipboard`]:
//!
//! - **Delimited**: CSV with a fixed header row
//! - **Structured**: pretty-printed JSON, camelCase fields
//! - **Email list**: `", "`-joined addresses, unrevealed only by default
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use phishguard_export::{export_delimited, MemorySink};
//!
//! let sink = MemorySink::new();
//! let records: Vec<phishguard_types::SubmissionRecord> = Vec::new();
//! let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 5, 0).unwrap();
//! let exported = export_delimited(&sink, &records, &at).unwrap();
//! assert_eq!(exported.filename, "phishguard-submissions-2025-03-14-0905.csv");
//! ```

mod clipboard;
mod encode;
mod error;
mod format;
mod sink;

pub use clipboard::{copy_email_list, Clipboard, MemoryClipboard};
pub use encode::{email_list, to_delimited, to_structured, DELIMITED_HEADER};
pub use error::{ExportError, ExportResult};
pub use format::{
    export_filename, export_info, filename_stamp, format_bytes, EmailScope, ExportFormat,
    ExportInfo,
};
pub use sink::{DirectorySink, Download, FileSink, MemorySink};

use chrono::{DateTime, TimeZone};
use phishguard_types::SubmissionRecord;
use std::fmt;
use tracing::info;

/// What a finished export delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exported {
    pub format: ExportFormat,
    pub filename: String,
    /// Records (or addresses) included.
    pub count: usize,
}

fn deliver(
    sink: &dyn FileSink,
    format: ExportFormat,
    filename: String,
    content: &str,
    count: usize,
) -> Exported {
    sink.download(content, &filename, format.mime_type());
    info!("Exported {} records to {} as {}", count, format, filename);
    Exported {
        format,
        filename,
        count,
    }
}

/// Exports records as CSV, named for the moment `at`.
pub fn export_delimited<'a, Tz: TimeZone>(
    sink: &dyn FileSink,
    records: impl IntoIterator<Item = &'a SubmissionRecord>,
    at: &DateTime<Tz>,
) -> ExportResult<Exported>
where
    Tz::Offset: fmt::Display,
{
    let records: Vec<&SubmissionRecord> = records.into_iter().collect();
    let content = to_delimited(records.iter().copied())?;
    let filename = export_filename(ExportFormat::Delimited, EmailScope::default(), at);
    Ok(deliver(sink, ExportFormat::Delimited, filename, &content, records.len()))
}

/// Exports records as JSON, named for the moment `at`.
pub fn export_structured<'a, Tz: TimeZone>(
    sink: &dyn FileSink,
    records: impl IntoIterator<Item = &'a SubmissionRecord>,
    at: &DateTime<Tz>,
) -> ExportResult<Exported>
where
    Tz::Offset: fmt::Display,
{
    let records: Vec<&SubmissionRecord> = records.into_iter().collect();
    let content = to_structured(records.iter().copied())?;
    let filename = export_filename(ExportFormat::Structured, EmailScope::default(), at);
    Ok(deliver(sink, ExportFormat::Structured, filename, &content, records.len()))
}

/// Exports the email list in `scope`, named for the moment `at`.
pub fn export_email_list<'a, Tz: TimeZone>(
    sink: &dyn FileSink,
    records: impl IntoIterator<Item = &'a SubmissionRecord>,
    scope: EmailScope,
    at: &DateTime<Tz>,
) -> Exported
where
    Tz::Offset: fmt::Display,
{
    let in_scope: Vec<&SubmissionRecord> = records
        .into_iter()
        .filter(|record| scope == EmailScope::All || !record.revealed)
        .collect();
    let content = email_list(in_scope.iter().copied(), EmailScope::All);
    let filename = export_filename(ExportFormat::EmailList, scope, at);
    deliver(sink, ExportFormat::EmailList, filename, &content, in_scope.len())
}
