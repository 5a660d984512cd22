use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use phishguard_export::{
    copy_email_list, export_delimited, export_email_list, export_filename, export_info,
    export_structured, format_bytes, Clipboard, DirectorySink, EmailScope, ExportFormat,
    FileSink, MemoryClipboard, MemorySink,
};
use phishguard_types::{SubmissionId, SubmissionRecord, Variant};
use pretty_assertions::assert_eq;

fn make_record(email: &str, revealed: bool) -> SubmissionRecord {
    SubmissionRecord {
        id: SubmissionId::new(),
        email: email.to_string(),
        variant: Variant::A,
        location_tag: None,
        ip_address: None,
        user_agent: None,
        timestamp: Utc.with_ymd_and_hms(2025, 6, 2, 18, 0, 0).unwrap(),
        revealed,
    }
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 7, 4, 59).unwrap()
}

// ── Size estimates ───────────────────────────────────────────────

#[test]
fn format_bytes_units() {
    assert_eq!(format_bytes(0), "0 B");
    assert_eq!(format_bytes(600), "600 B");
    assert_eq!(format_bytes(1024), "1 KB");
    assert_eq!(format_bytes(4000), "4 KB");
    assert_eq!(format_bytes(200 * 1024 * 1024), "200 MB");
    assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3 GB");
    assert_eq!(format_bytes(5000 * 1024 * 1024 * 1024), "5000 GB");
}

#[test]
fn export_info_estimates() {
    let csv = export_info(20, ExportFormat::Delimited);
    assert_eq!(csv.estimated_bytes, 4000);
    assert_eq!(csv.estimated_size, "4 KB");

    assert_eq!(export_info(20, ExportFormat::Structured).estimated_size, "8 KB");
    assert_eq!(export_info(20, ExportFormat::EmailList).estimated_size, "600 B");
    assert_eq!(export_info(0, ExportFormat::Structured).estimated_size, "0 B");
}

// ── File names ───────────────────────────────────────────────────

#[test]
fn filenames_use_local_stamp() {
    assert_eq!(
        export_filename(ExportFormat::Delimited, EmailScope::All, &at()),
        "phishguard-submissions-2025-06-02-0704.csv"
    );
    assert_eq!(
        export_filename(ExportFormat::Structured, EmailScope::All, &at()),
        "phishguard-data-2025-06-02-0704.json"
    );
    assert_eq!(
        export_filename(ExportFormat::EmailList, EmailScope::Unrevealed, &at()),
        "phishguard-emails-unrevealed-2025-06-02-0704.txt"
    );

    let tz = FixedOffset::west_opt(8 * 3600).unwrap();
    assert_eq!(
        export_filename(ExportFormat::EmailList, EmailScope::All, &at().with_timezone(&tz)),
        "phishguard-emails-all-2025-06-01-2304.txt"
    );
}

#[test]
fn mime_types() {
    assert_eq!(ExportFormat::Delimited.mime_type(), "text/csv;charset=utf-8;");
    assert_eq!(ExportFormat::Structured.mime_type(), "application/json");
    assert_eq!(ExportFormat::EmailList.mime_type(), "text/plain");
}

// ── Delivery ─────────────────────────────────────────────────────

#[test]
fn exports_reach_the_sink() {
    let sink = MemorySink::new();
    let records = vec![make_record("a@corp.com", false), make_record("b@corp.com", true)];

    let csv = export_delimited(&sink, &records, &at()).unwrap();
    let json = export_structured(&sink, &records, &at()).unwrap();
    let emails = export_email_list(&sink, &records, EmailScope::Unrevealed, &at());

    assert_eq!(csv.count, 2);
    assert_eq!(json.count, 2);
    assert_eq!(emails.count, 1);

    let downloads = sink.downloads();
    assert_eq!(downloads.len(), 3);
    assert_eq!(downloads[0].filename, csv.filename);
    assert_eq!(downloads[0].mime_type, "text/csv;charset=utf-8;");
    assert!(downloads[0].content.starts_with("Email,Variant"));
    assert_eq!(downloads[1].mime_type, "application/json");
    assert_eq!(downloads[2].content, "a@corp.com");
    assert_eq!(downloads[2].filename, "phishguard-emails-unrevealed-2025-06-02-0704.txt");
}

#[test]
fn directory_sink_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let sink = DirectorySink::new(dir.path().join("exports"));

    sink.download("hello", "out.txt", "text/plain");

    let written = std::fs::read_to_string(dir.path().join("exports").join("out.txt")).unwrap();
    assert_eq!(written, "hello");
}

#[test]
fn directory_sink_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    // The target "directory" is a file, so the write fails and is only logged.
    let sink = DirectorySink::new(&blocker);
    sink.download("hello", "out.txt", "text/plain");
    assert!(!blocker.join("out.txt").exists());
}

// ── Clipboard ────────────────────────────────────────────────────

#[tokio::test]
async fn copy_email_list_writes_clipboard() {
    let clipboard = MemoryClipboard::new();
    let records = vec![make_record("a@corp.com", false), make_record("b@corp.com", false)];

    assert!(copy_email_list(&clipboard, &records, EmailScope::Unrevealed).await);
    assert_eq!(clipboard.contents().as_deref(), Some("a@corp.com, b@corp.com"));
}

#[tokio::test]
async fn copy_failure_returns_false() {
    let clipboard = MemoryClipboard::new();
    clipboard.fail_writes("permission denied");
    let records = vec![make_record("a@corp.com", false)];

    assert!(!copy_email_list(&clipboard, &records, EmailScope::All).await);
    assert_eq!(clipboard.contents(), None);
    assert!(clipboard.write_text("x").await.is_err());
}
