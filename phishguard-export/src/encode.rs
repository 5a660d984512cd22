//! Content builders for each export format.

use crate::error::{ExportError, ExportResult};
use crate::format::EmailScope;
use chrono::SecondsFormat;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use phishguard_types::SubmissionRecord;
use std::io;

/// Column titles of the delimited export.
pub const DELIMITED_HEADER: [&str; 7] = [
    "Email",
    "Variant",
    "Location",
    "Timestamp",
    "IP Address",
    "User Agent",
    "Revealed",
];

/// Renders records as comma-separated text with a header row.
///
/// Fields holding a comma, quote or line break are quoted with inner
/// quotes doubled. Rows are separated by `\n`; there is no trailing
/// newline.
pub fn to_delimited<'a>(
    records: impl IntoIterator<Item = &'a SubmissionRecord>,
) -> ExportResult<String> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(DELIMITED_HEADER)?;
    for record in records {
        let timestamp = record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        writer.write_record([
            record.email.as_str(),
            record.variant.as_str(),
            record.location_tag.as_deref().unwrap_or(""),
            timestamp.as_str(),
            record.ip_address.as_deref().unwrap_or(""),
            record.user_agent.as_deref().unwrap_or(""),
            if record.revealed { "Yes" } else { "No" },
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        ExportError::Io(io::Error::new(e.error().kind(), e.error().to_string()))
    })?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| ExportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Renders records as a pretty-printed JSON array (camelCase fields).
pub fn to_structured<'a>(
    records: impl IntoIterator<Item = &'a SubmissionRecord>,
) -> ExportResult<String> {
    let records: Vec<&SubmissionRecord> = records.into_iter().collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Joins the emails in scope with `", "`.
pub fn email_list<'a>(
    records: impl IntoIterator<Item = &'a SubmissionRecord>,
    scope: EmailScope,
) -> String {
    records
        .into_iter()
        .filter(|record| scope == EmailScope::All || !record.revealed)
        .map(|record| record.email.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
