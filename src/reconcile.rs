//! Startup scan for history entries left behind by an earlier process.
//!
//! An entry only survives when a relocation was interrupted mid-flight or its
//! rollback failed. Nothing is repaired automatically; each leftover is
//! reported so an operator can compare its recorded renames with the disk.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::StoreError;
use crate::history::{HistoryId, HistoryStore};

/// A surviving history entry and the renames that may still be in effect.
#[derive(Debug, Clone, Serialize)]
pub struct PendingEntry {
    pub id: HistoryId,
    pub old: PathBuf,
    pub new: PathBuf,
    pub created_at: String,
    pub unreversed: Vec<(PathBuf, PathBuf)>,
}

pub fn pending(history: &dyn HistoryStore) -> Result<Vec<PendingEntry>, StoreError> {
    let entries = history.entries()?;
    let mut out = Vec::with_capacity(entries.len());
    for (id, entry) in entries {
        let unreversed: Vec<(PathBuf, PathBuf)> = entry
            .unreversed_movements()
            .into_iter()
            .map(|(o, n)| (o.to_path_buf(), n.to_path_buf()))
            .collect();
        warn!(
            history_id = %id,
            old = %entry.old.display(),
            new = %entry.new.display(),
            created_at = %entry.created_at,
            unreversed = unreversed.len(),
            "Unfinished relocation found in history; manual reconciliation may be needed"
        );
        out.push(PendingEntry {
            id,
            old: entry.old,
            new: entry.new,
            created_at: entry.created_at,
            unreversed,
        });
    }
    if out.is_empty() {
        info!("No unfinished relocations in history");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{JsonHistoryLog, MovementStatus};
    use std::path::Path;

    #[test]
    fn lists_leftovers_with_open_movements() {
        let mut log = JsonHistoryLog::in_memory();
        let done = log.create(Path::new("/r/a"), Path::new("/r/b")).unwrap();
        log.remove(&done).unwrap();
        let stuck = log.create(Path::new("/r/c.jpg"), Path::new("/r/d.jpg")).unwrap();
        log.append_movement(&stuck, Path::new("/r/c.jpg"), Path::new("/r/d.jpg"), MovementStatus::Attempted)
            .unwrap();

        let found = pending(&log).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, stuck);
        assert_eq!(found[0].unreversed, vec![(PathBuf::from("/r/c.jpg"), PathBuf::from("/r/d.jpg"))]);
    }

    #[test]
    fn empty_history_has_nothing_pending() {
        assert!(pending(&JsonHistoryLog::in_memory()).unwrap().is_empty());
    }
}
