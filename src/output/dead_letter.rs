//! Append-only log of permanently failed tasks
//!
//! Each entry is one JSON object per line. The log is written by this crate
//! and read by operators; nothing here reads it back.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeadLetterError {
    #[error("Failed to append to dead-letter log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize dead-letter entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One failed (target, selector) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub url: String,
    pub css_selector: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub error: String,
}

impl DeadLetterEntry {
    /// Creates an entry stamped with the current time
    pub fn new(url: impl Into<String>, css_selector: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            css_selector: css_selector.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            error: error.into(),
        }
    }
}

/// Dead-letter file shared by all workers of a process
#[derive(Debug)]
pub struct DeadLetterLog {
    path: PathBuf,
    guard: Mutex<()>,
}

impl DeadLetterLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `entry` as a single line
    pub fn append(&self, entry: &DeadLetterEntry) -> Result<(), DeadLetterError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        // Poisoning only means another append panicked; the file is still usable
        let _guard = self.guard.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;

        tracing::info!(url = %entry.url, log = %self.path.display(), "Recorded dead letter");
        Ok(())
    }

    fn io_error(&self, source: io::Error) -> DeadLetterError {
        DeadLetterError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
