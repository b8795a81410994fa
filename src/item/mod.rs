//! One relocation attempt.
//!
//! `Item` owns the bookkeeping shared by both variants: completed renames,
//! touched records, the info/error trail and the metadata transaction flag.
//! `ItemKind` picks the variant-specific steps in `file` and `folder`.

mod factory;
mod file;
mod folder;
mod names;

pub use factory::ItemFactory;
pub use names::derived_name;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::StoreError;
use crate::fs_ops::FileSystem;
use crate::history::{HistoryId, HistoryStore, MovementStatus};
use crate::metadata::{MetadataStore, RecordId};
use crate::tree::ManagedPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Folder,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::File => f.write_str("file"),
            ItemKind::Folder => f.write_str("folder"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// A precondition did not hold; nothing was touched.
    Validation,
    Filesystem,
    Metadata,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StepError {
    pub kind: FailureKind,
    pub message: String,
}

impl StepError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::Validation, message: message.into() }
    }

    pub(crate) fn filesystem(message: impl Into<String>) -> Self {
        Self { kind: FailureKind::Filesystem, message: message.into() }
    }

    pub(crate) fn metadata(context: &str, err: StoreError) -> Self {
        Self { kind: FailureKind::Metadata, message: format!("{context}: {err}") }
    }
}

/// A completed filesystem rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMove {
    pub old: PathBuf,
    pub new: PathBuf,
}

/// What an attempt actually changed, in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationHistory {
    pub files: Vec<FileMove>,
    pub records: Vec<RecordId>,
    pub documents: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationLog {
    pub info: Vec<String>,
    pub errors: Vec<String>,
}

/// Snapshot returned by `Item::tell`.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub kind: ItemKind,
    pub old: String,
    pub new: String,
    pub history_id: Option<HistoryId>,
    pub info: Vec<String>,
    pub errors: Vec<String>,
    pub history: OperationHistory,
}

/// Collaborators an attempt works against.
pub struct Services<'a> {
    pub fs: &'a dyn FileSystem,
    pub store: &'a mut dyn MetadataStore,
    pub history: &'a mut dyn HistoryStore,
}

/// A single relocation of one file or folder. Never reused across attempts.
#[derive(Debug)]
pub struct Item {
    kind: ItemKind,
    old: ManagedPath,
    new: ManagedPath,
    history_id: Option<HistoryId>,
    history: OperationHistory,
    log: OperationLog,
    transaction: bool,
    failure: Option<FailureKind>,
}

impl Item {
    pub(crate) fn new(kind: ItemKind, old: ManagedPath, new: ManagedPath) -> Self {
        Self {
            kind,
            old,
            new,
            history_id: None,
            history: OperationHistory::default(),
            log: OperationLog::default(),
            transaction: false,
            failure: None,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn old(&self) -> &ManagedPath {
        &self.old
    }

    pub fn new_path(&self) -> &ManagedPath {
        &self.new
    }

    pub fn history_id(&self) -> Option<&HistoryId> {
        self.history_id.as_ref()
    }

    pub fn operation_history(&self) -> &OperationHistory {
        &self.history
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }

    /// Kind of the first step that failed, if any.
    pub fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Check preconditions. Stops at the first failing one and records it.
    pub fn validate(&mut self) -> bool {
        let checked = match self.kind {
            ItemKind::File => file::check(self),
            ItemKind::Folder => folder::check(self),
        };
        match checked {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Run the protocol for this variant. On `false` the caller must roll back.
    pub fn relocate(&mut self, history_id: &HistoryId, svc: &mut Services<'_>) -> bool {
        self.history_id = Some(history_id.clone());
        if !self.validate() {
            return false;
        }
        let result = match self.kind {
            ItemKind::File => file::relocate(self, svc),
            ItemKind::Folder => folder::relocate(self, svc),
        };
        match result {
            Ok(()) => {
                self.note(format!("Relocated {} to {}", self.old, self.new));
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Reverse every completed rename, newest first, then roll back the
    /// metadata transaction. Every step is attempted even after a failure;
    /// the result is true only if all of them succeeded.
    pub fn roll_back(&mut self, svc: &mut Services<'_>) -> bool {
        let mut ok = true;
        let moves = std::mem::take(&mut self.history.files);
        let mut remaining = Vec::new();
        for mv in moves.into_iter().rev() {
            if let Err(e) = self.reverse(&mv, svc) {
                ok = false;
                self.record_error(e.message);
                remaining.push(mv);
            }
        }
        remaining.reverse();
        self.history.files = remaining;

        if let Err(e) = self.rollback_transaction(svc) {
            ok = false;
            self.record_error(e.message);
        }
        if ok {
            self.note(format!("Rolled back relocation of {}", self.old));
        }
        ok
    }

    /// Last error, or every error joined when `full` is set.
    pub fn explain(&self, full: bool) -> String {
        if full {
            self.log.errors.join("; ")
        } else {
            self.last_error().unwrap_or_default().to_string()
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.log.errors.last().map(String::as_str)
    }

    pub fn tell(&self) -> ItemReport {
        ItemReport {
            kind: self.kind,
            old: self.old.relative().to_string(),
            new: self.new.relative().to_string(),
            history_id: self.history_id.clone(),
            info: self.log.info.clone(),
            errors: self.log.errors.clone(),
            history: self.history.clone(),
        }
    }

    /// Renames `relocate` would perform, as absolute paths. Touches nothing.
    pub fn planned_moves(&self, store: &dyn MetadataStore) -> Result<Vec<(PathBuf, PathBuf)>, StoreError> {
        let pairs = match self.kind {
            ItemKind::File => file::planned(self, store)?.1,
            ItemKind::Folder => vec![(self.old.clone(), self.new.clone())],
        };
        Ok(pairs
            .into_iter()
            .map(|(o, n)| (o.system_path(), n.system_path()))
            .collect())
    }

    fn note(&mut self, message: String) {
        debug!(item = %self.old, "{message}");
        self.log.info.push(message);
    }

    fn record_error(&mut self, message: String) {
        debug!(item = %self.old, error = %message, "Relocation step failed");
        self.log.errors.push(message);
    }

    fn fail(&mut self, e: StepError) {
        if self.failure.is_none() {
            self.failure = Some(e.kind);
        }
        self.record_error(e.message);
    }

    /// Verified rename with history bookkeeping. `Ok(false)` means there was
    /// nothing to move.
    fn rename(&mut self, from: &Path, to: &Path, svc: &mut Services<'_>) -> Result<bool, StepError> {
        if from == to {
            self.note(format!("{} is already in place", from.display()));
            return Ok(false);
        }
        if !svc.fs.exists(from) {
            self.note(format!("{} is missing, skipping", from.display()));
            return Ok(false);
        }
        let id = self
            .history_id
            .clone()
            .ok_or_else(|| StepError::filesystem("No history entry for this relocation"))?;

        svc.history
            .append_movement(&id, from, to, MovementStatus::Attempted)
            .map_err(|e| {
                StepError::filesystem(format!(
                    "Can not record rename of {} in relocation history: {e}",
                    from.display()
                ))
            })?;

        svc.fs.rename(from, to).map_err(|e| {
            StepError::filesystem(format!(
                "Unable to move {} to {}: {e}",
                from.display(),
                to.display()
            ))
        })?;

        if !svc.fs.exists(to) || svc.fs.exists(from) {
            if svc.fs.exists(to) {
                // Something landed at the target; rollback has to deal with it.
                self.history.files.push(FileMove { old: from.to_path_buf(), new: to.to_path_buf() });
            }
            return Err(StepError::filesystem(format!(
                "Move of {} to {} reported success but did not take effect",
                from.display(),
                to.display()
            )));
        }

        self.history.files.push(FileMove { old: from.to_path_buf(), new: to.to_path_buf() });
        if let Err(e) = svc.history.append_movement(&id, from, to, MovementStatus::Confirmed) {
            warn!(history_id = %id, from = %from.display(), error = %e, "Could not confirm movement in history");
        }
        self.note(format!("Moved {} to {}", from.display(), to.display()));
        Ok(true)
    }

    fn reverse(&mut self, mv: &FileMove, svc: &mut Services<'_>) -> Result<(), StepError> {
        let id = self.history_id.clone();
        if let Some(id) = &id {
            if let Err(e) = svc.history.append_movement(id, &mv.old, &mv.new, MovementStatus::RollbackAttempted) {
                warn!(history_id = %id, error = %e, "Could not record rollback attempt in history");
            }
        }

        svc.fs.rename(&mv.new, &mv.old).map_err(|e| {
            StepError::filesystem(format!(
                "Unable to move {} back to {}: {e}",
                mv.new.display(),
                mv.old.display()
            ))
        })?;
        if !svc.fs.exists(&mv.old) || svc.fs.exists(&mv.new) {
            return Err(StepError::filesystem(format!(
                "Moving {} back to {} did not take effect",
                mv.new.display(),
                mv.old.display()
            )));
        }

        if let Some(id) = &id {
            if let Err(e) = svc.history.append_movement(id, &mv.old, &mv.new, MovementStatus::RollbackConfirmed) {
                warn!(history_id = %id, error = %e, "Could not confirm rollback in history");
            }
        }
        self.note(format!("Moved {} back to {}", mv.new.display(), mv.old.display()));
        Ok(())
    }

    fn start_transaction(&mut self, svc: &mut Services<'_>) -> Result<(), StepError> {
        if self.transaction {
            return Ok(());
        }
        svc.store
            .begin()
            .map_err(|e| StepError::metadata("Unable to start metadata transaction", e))?;
        self.transaction = true;
        Ok(())
    }

    fn commit_transaction(&mut self, svc: &mut Services<'_>) -> Result<(), StepError> {
        if !self.transaction {
            self.note("No metadata transaction to commit".to_string());
            return Ok(());
        }
        svc.store
            .commit()
            .map_err(|e| StepError::metadata("Unable to commit metadata changes", e))?;
        self.transaction = false;
        Ok(())
    }

    fn rollback_transaction(&mut self, svc: &mut Services<'_>) -> Result<(), StepError> {
        if !self.transaction {
            self.note("No metadata transaction to roll back".to_string());
            return Ok(());
        }
        svc.store
            .rollback()
            .map_err(|e| StepError::metadata("Unable to roll back metadata changes", e))?;
        self.transaction = false;
        Ok(())
    }
}
