//! File-backed metadata store.
//!
//! Transactions are snapshots of the whole state: `begin` clones it,
//! `rollback` restores the clone and `commit` writes the current state out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{replace_reference, Document, MediaRecord, MetadataStore, RecordId, ReferenceScope};
use crate::errors::StoreError;
use crate::platform::write_private_file_atomic;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoreState {
    next_id: RecordId,
    #[serde(default)]
    records: Vec<MediaRecord>,
    #[serde(default)]
    documents: Vec<Document>,
}

impl StoreState {
    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct JsonMetadataStore {
    file: Option<PathBuf>,
    state: StoreState,
    snapshot: Option<StoreState>,
}

impl JsonMetadataStore {
    pub fn open(file: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let file = file.into();
        let state = match fs::read_to_string(&file) {
            Ok(s) if s.trim().is_empty() => StoreState::default(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            path = %file.display(),
            records = state.records.len(),
            documents = state.documents.len(),
            "Opened metadata store"
        );
        Ok(Self {
            file: Some(file),
            state,
            snapshot: None,
        })
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Register a new record at `path` with the given derived files.
    pub fn add_record(
        &mut self,
        path: &str,
        sizes: &[(&str, &str)],
        backups: &[(&str, &str)],
    ) -> Result<RecordId, StoreError> {
        let id = self.state.allocate_id();
        let mut record = MediaRecord::new(id, path);
        for (k, v) in sizes {
            record.sizes.insert(k.to_string(), v.to_string());
        }
        for (k, v) in backups {
            record.backups.insert(k.to_string(), v.to_string());
        }
        self.state.records.push(record);
        self.persist_outside_transaction()?;
        Ok(id)
    }

    pub fn add_document(&mut self, content: impl Into<String>) -> Result<RecordId, StoreError> {
        let id = self.state.allocate_id();
        self.state.documents.push(Document {
            id,
            content: content.into(),
        });
        self.persist_outside_transaction()?;
        Ok(id)
    }

    pub fn records(&self) -> &[MediaRecord] {
        &self.state.records
    }

    pub fn documents(&self) -> &[Document] {
        &self.state.documents
    }

    pub fn document(&self, id: RecordId) -> Option<&Document> {
        self.state.documents.iter().find(|d| d.id == id)
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(file) = &self.file {
            let bytes = serde_json::to_vec_pretty(&self.state)?;
            write_private_file_atomic(file, &bytes)?;
            trace!(path = %file.display(), "Metadata store written");
        }
        Ok(())
    }

    fn persist_outside_transaction(&self) -> Result<(), StoreError> {
        if self.snapshot.is_none() {
            self.persist()?;
        }
        Ok(())
    }
}

impl MetadataStore for JsonMetadataStore {
    fn get(&self, path: &str) -> Result<Option<MediaRecord>, StoreError> {
        Ok(self.state.records.iter().find(|r| r.path == path).cloned())
    }

    fn put(&mut self, path: &str, mut record: MediaRecord) -> Result<(), StoreError> {
        record.path = path.to_string();
        let slot = self
            .state
            .records
            .iter()
            .position(|r| r.id == record.id)
            .or_else(|| self.state.records.iter().position(|r| r.path == path));
        match slot {
            Some(i) => self.state.records[i] = record,
            None => {
                if record.id == 0 {
                    record.id = self.state.allocate_id();
                }
                self.state.records.push(record);
            }
        }
        self.persist_outside_transaction()
    }

    fn find_by_path_prefix(&self, prefix: &str) -> Result<Vec<MediaRecord>, StoreError> {
        Ok(self
            .state
            .records
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.snapshot = Some(self.state.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.snapshot.is_none() {
            return Err(StoreError::NoTransaction);
        }
        // Snapshot stays until the write lands so a failed commit can still roll back.
        self.persist()?;
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        let snapshot = self.snapshot.take().ok_or(StoreError::NoTransaction)?;
        self.state = snapshot;
        Ok(())
    }

    fn replace_text_in_documents(
        &mut self,
        old_ref: &str,
        new_ref: &str,
        scope: ReferenceScope,
    ) -> Result<usize, StoreError> {
        let mut changed = 0;
        for doc in &mut self.state.documents {
            if let Some(updated) = replace_reference(&doc.content, old_ref, new_ref, scope) {
                doc.content = updated;
                changed += 1;
            }
        }
        if changed > 0 {
            self.persist_outside_transaction()?;
        }
        Ok(changed)
    }
}
