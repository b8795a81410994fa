//! File-backed history log: one JSON object keyed by history id, rewritten
//! atomically after every change.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{HistoryEntry, HistoryId, HistoryStore, Movement, MovementStatus};
use crate::errors::StoreError;
use crate::platform::write_private_file_atomic;

#[derive(Debug, Default)]
pub struct JsonHistoryLog {
    file: Option<PathBuf>,
    entries: BTreeMap<HistoryId, HistoryEntry>,
}

impl JsonHistoryLog {
    /// Load from `file`; a missing file is an empty log.
    pub fn open(file: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = file.into();
        let entries = match fs::read_to_string(&file) {
            Ok(s) if s.trim().is_empty() => BTreeMap::new(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %file.display(), entries = entries.len(), "Opened history log");
        Ok(Self {
            file: Some(file),
            entries,
        })
    }

    /// Not persisted anywhere; for tests and dry runs.
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write `entries` out; on failure the caller restores its previous state.
    fn persist(&self, entries: &BTreeMap<HistoryId, HistoryEntry>) -> Result<(), StoreError> {
        if let Some(file) = &self.file {
            let bytes = serde_json::to_vec_pretty(entries)?;
            write_private_file_atomic(file, &bytes)?;
            trace!(path = %file.display(), entries = entries.len(), "History log written");
        }
        Ok(())
    }

    fn update(
        &mut self,
        change: impl FnOnce(&mut BTreeMap<HistoryId, HistoryEntry>) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        change(&mut next)?;
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryLog {
    fn create(&mut self, old: &Path, new: &Path) -> Result<HistoryId, StoreError> {
        let id = HistoryId::generate();
        let entry = HistoryEntry::new(old, new);
        let key = id.clone();
        self.update(move |entries| {
            entries.insert(key, entry);
            Ok(())
        })?;
        Ok(id)
    }

    fn append_movement(
        &mut self,
        id: &HistoryId,
        old: &Path,
        new: &Path,
        status: MovementStatus,
    ) -> Result<(), StoreError> {
        self.update(|entries| {
            let entry = entries
                .get_mut(id)
                .ok_or_else(|| StoreError::UnknownEntry(id.clone()))?;
            entry.file_movements.push(Movement {
                old: old.to_path_buf(),
                new: new.to_path_buf(),
                status,
            });
            Ok(())
        })
    }

    fn remove(&mut self, id: &HistoryId) -> Result<(), StoreError> {
        if !self.entries.contains_key(id) {
            return Ok(());
        }
        self.update(|entries| {
            entries.remove(id);
            Ok(())
        })
    }

    fn get(&self, id: &HistoryId) -> Result<Option<HistoryEntry>, StoreError> {
        Ok(self.entries.get(id).cloned())
    }

    fn entries(&self) -> Result<Vec<(HistoryId, HistoryEntry)>, StoreError> {
        Ok(self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
