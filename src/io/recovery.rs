//! Recovery log: remote writes that never reached the store.
//!
//! One JSON record per line in `<cache dir>/.recovery.log`. The local cache
//! already holds each change; an entry keeps enough to redo it by hand.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which kind of remote write failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryCategory {
    Create,
    Write,
    Delete,
}

impl RecoveryCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryCategory::Create => "create",
            RecoveryCategory::Write => "write",
            RecoveryCategory::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    /// Store path the write targeted
    pub path: String,
    pub error: String,
    /// The record or partial that was sent
    #[serde(default)]
    pub payload: Value,
}

impl RecoveryEntry {
    pub fn now(
        category: RecoveryCategory,
        path: impl Into<String>,
        error: impl Into<String>,
        payload: Value,
    ) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            path: path.into(),
            error: error.into(),
            payload,
        }
    }
}

pub fn recovery_log_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(".recovery.log")
}

/// Append an entry. A log that cannot be written only produces a warning.
pub fn log_recovery(cache_dir: &Path, entry: &RecoveryEntry) {
    let path = recovery_log_path(cache_dir);
    let appended = serde_json::to_string(entry)
        .map_err(io::Error::from)
        .and_then(|line| {
            let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
            writeln!(file, "{}", line)
        });
    if let Err(e) = appended {
        tracing::warn!(path = %path.display(), error = %e, "could not append to recovery log");
    }
}

/// All entries, newest first. Missing log is empty; unreadable lines are skipped.
pub fn read_recovery_entries(cache_dir: &Path) -> Vec<RecoveryEntry> {
    let Ok(content) = fs::read_to_string(recovery_log_path(cache_dir)) else {
        return Vec::new();
    };
    let mut entries: Vec<RecoveryEntry> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable recovery log line");
                None
            }
        })
        .collect();
    entries.reverse();
    entries
}

/// Delete the log, returning how many entries it held.
pub fn clear_recovery(cache_dir: &Path) -> io::Result<usize> {
    let count = read_recovery_entries(cache_dir).len();
    match fs::remove_file(recovery_log_path(cache_dir)) {
        Ok(()) => Ok(count),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}
