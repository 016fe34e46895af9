//! Durable per-identifier attempt records.
//!
//! One JSON file per identifier under the state directory. Loads are
//! forgiving: a missing, unreadable, or corrupt file yields a fresh record
//! so a damaged cache can never keep anyone out of the login form.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::policy::AttemptRecord;

const RECORD_PREFIX: &str = "attempt-";

#[derive(Debug)]
pub struct AttemptStore {
    dir: PathBuf,
    retention_ms: i64,
}

impl AttemptStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            dir: dir.into(),
            retention_ms: i64::try_from(retention.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// Load the record for an identifier.
    ///
    /// Never fails: corruption is logged and treated as empty state. Records
    /// idle past the retention window are also treated as empty, which is
    /// the only garbage collection the store does.
    #[must_use]
    pub fn load(&self, identifier: &str, now: DateTime<Utc>) -> AttemptRecord {
        let path = self.record_path(identifier);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return AttemptRecord::default();
            }
            Err(err) => {
                warn!("Failed to read attempt record {}: {err}", path.display());
                return AttemptRecord::default();
            }
        };

        let record: AttemptRecord = match serde_json::from_slice(&bytes) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    "Discarding corrupt attempt record {}: {err}",
                    path.display()
                );
                return AttemptRecord::default();
            }
        };

        if self.is_stale(&record, now) {
            debug!("Pruning stale attempt record for {identifier}");
            return AttemptRecord::default();
        }

        record
    }

    /// Persist the record for an identifier. Writes to a temp file first so
    /// a crash mid-write cannot leave a truncated record behind.
    pub fn save(&self, identifier: &str, record: &AttemptRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create state dir {}", self.dir.display()))?;
        let path = self.record_path(identifier);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&tmp, bytes)
            .with_context(|| format!("failed to write attempt record {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to commit attempt record {}", path.display()))?;
        Ok(())
    }

    /// Drop the record for an identifier, typically after a successful login.
    pub fn reset(&self, identifier: &str) -> Result<()> {
        let path = self.record_path(identifier);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove attempt record {}", path.display())),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_stale(&self, record: &AttemptRecord, now: DateTime<Utc>) -> bool {
        record.last_attempt != 0
            && !record.is_locked_at(now)
            && now.timestamp_millis().saturating_sub(record.last_attempt) > self.retention_ms
    }

    fn record_path(&self, identifier: &str) -> PathBuf {
        self.dir
            .join(format!("{RECORD_PREFIX}{}.json", sanitize(identifier)))
    }
}

/// Map an identifier onto a safe file name component.
fn sanitize(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
