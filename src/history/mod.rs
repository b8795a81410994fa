//! Relocation history log.
//!
//! One entry per in-flight relocation, holding every filesystem rename the
//! attempt performed. An entry is removed only once the attempt either
//! completed or was fully rolled back; anything left behind after a crash
//! points at changes that may need manual reconciliation.

mod json;

pub use json::JsonHistoryLog;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Opaque key of a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryId(String);

static ID_SEQ: AtomicU64 = AtomicU64::new(0);

impl HistoryId {
    /// Fresh id: time, pid and a process-wide sequence number, hex encoded.
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = ID_SEQ.fetch_add(1, Ordering::Relaxed);
        HistoryId(format!("{:x}-{:x}-{:x}", nanos, std::process::id(), seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for HistoryId {
    fn from(s: &str) -> Self {
        HistoryId(s.to_string())
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Progress of one recorded rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementStatus {
    Attempted,
    Confirmed,
    RollbackAttempted,
    RollbackConfirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub old: PathBuf,
    pub new: PathBuf,
    pub status: MovementStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub old: PathBuf,
    pub new: PathBuf,
    /// RFC 3339 creation time.
    pub created_at: String,
    #[serde(default)]
    pub file_movements: Vec<Movement>,
}

impl HistoryEntry {
    pub fn new(old: &Path, new: &Path) -> Self {
        Self {
            old: old.to_path_buf(),
            new: new.to_path_buf(),
            created_at: chrono::Local::now().to_rfc3339(),
            file_movements: Vec::new(),
        }
    }

    /// Renames that may still be in effect: attempted or confirmed and
    /// never confirmed as reversed. Order of first appearance.
    pub fn unreversed_movements(&self) -> Vec<(&Path, &Path)> {
        let mut open: Vec<(&Path, &Path)> = Vec::new();
        for m in &self.file_movements {
            let key = (m.old.as_path(), m.new.as_path());
            match m.status {
                MovementStatus::Attempted | MovementStatus::Confirmed | MovementStatus::RollbackAttempted => {
                    if !open.contains(&key) {
                        open.push(key);
                    }
                }
                MovementStatus::RollbackConfirmed => open.retain(|k| *k != key),
            }
        }
        open
    }
}

/// Persisted key -> entry mapping.
pub trait HistoryStore {
    /// Record intent before anything is touched.
    fn create(&mut self, old: &Path, new: &Path) -> Result<HistoryId, StoreError>;
    fn append_movement(
        &mut self,
        id: &HistoryId,
        old: &Path,
        new: &Path,
        status: MovementStatus,
    ) -> Result<(), StoreError>;
    fn remove(&mut self, id: &HistoryId) -> Result<(), StoreError>;
    fn get(&self, id: &HistoryId) -> Result<Option<HistoryEntry>, StoreError>;
    /// Every surviving entry, ordered by id.
    fn entries(&self) -> Result<Vec<(HistoryId, HistoryEntry)>, StoreError>;
}
