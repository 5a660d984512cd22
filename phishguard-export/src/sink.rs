//! File delivery.
//!
//! A download is fire-and-forget: sinks log their own failures and never
//! report them to the caller.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Somewhere a finished export is handed to the operator.
pub trait FileSink: Send + Sync {
    fn download(&self, content: &str, filename: &str, mime_type: &str);
}

/// Writes downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FileSink for DirectorySink {
    fn download(&self, content: &str, filename: &str, mime_type: &str) {
        let path = self.dir.join(filename);
        match fs::create_dir_all(&self.dir).and_then(|()| fs::write(&path, content)) {
            Ok(()) => debug!("Wrote {} ({}, {} bytes)", path.display(), mime_type, content.len()),
            Err(e) => warn!("Failed to write export {}: {}", path.display(), e),
        }
    }
}

/// A delivered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub mime_type: String,
    pub content: String,
}

/// Keeps downloads in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    downloads: Mutex<Vec<Download>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downloads(&self) -> Vec<Download> {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FileSink for MemorySink {
    fn download(&self, content: &str, filename: &str, mime_type: &str) {
        self.downloads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Download {
                filename: filename.to_string(),
                mime_type: mime_type.to_string(),
                content: content.to_string(),
            });
    }
}
