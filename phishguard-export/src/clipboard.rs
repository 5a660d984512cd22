//! Clipboard delivery.

use crate::encode::email_list;
use crate::error::{ExportError, ExportResult};
use crate::format::EmailScope;
use async_trait::async_trait;
use phishguard_types::SubmissionRecord;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error};

/// A system clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> ExportResult<()>;
}

/// Copies the email list to `clipboard`. Returns false (after logging)
/// when the write fails.
pub async fn copy_email_list<'a>(
    clipboard: &dyn Clipboard,
    records: impl IntoIterator<Item = &'a SubmissionRecord>,
    scope: EmailScope,
) -> bool {
    let text = email_list(records, scope);
    match clipboard.write_text(&text).await {
        Ok(()) => {
            debug!("Copied {} bytes of email addresses to the clipboard", text.len());
            true
        }
        Err(e) => {
            error!("Failed to copy to clipboard: {}", e);
            false
        }
    }
}

#[derive(Debug, Default)]
struct ClipboardState {
    contents: Option<String>,
    failure: Option<String>,
}

/// An in-process clipboard.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    state: Mutex<ClipboardState>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last text written.
    pub fn contents(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contents
            .clone()
    }

    /// Makes every later write fail with `message`.
    pub fn fail_writes(&self, message: impl Into<String>) {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).failure = Some(message.into());
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> ExportResult<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(message) = &state.failure {
            return Err(ExportError::Clipboard(message.clone()));
        }
        state.contents = Some(text.to_string());
        Ok(())
    }
}
