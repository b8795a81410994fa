//! Drives relocation attempts end-to-end.
//!
//! Every attempt is bracketed by a history entry: created before anything is
//! touched, removed once the attempt completed or was fully rolled back, and
//! kept when rollback itself fails. That last case is the only fatal outcome.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::errors::RelocateError;
use crate::fs_ops::FileSystem;
use crate::history::{HistoryId, HistoryStore};
use crate::item::{FileMove, Item, ItemFactory, ItemKind, Services};
use crate::metadata::MetadataStore;
use crate::shutdown;
use crate::tree::{ManagedPath, Tree};

#[derive(Debug, Clone, Copy)]
pub struct RelocatorOptions {
    /// Dump each item's full operation log after its attempt.
    pub logging: bool,
    /// Items per progress chunk in batch moves.
    pub batch_size: usize,
}

impl Default for RelocatorOptions {
    fn default() -> Self {
        Self {
            logging: false,
            batch_size: 50,
        }
    }
}

/// Non-fatal end state of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Completed,
    RolledBack { reason: String },
}

/// Caller-facing result of a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Outcome {
    pub fn success(new_path: impl Into<String>) -> Self {
        Self {
            success: true,
            new_path: Some(new_path.into()),
            error_message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            new_path: None,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// New paths of the items that were relocated.
    pub successful: Vec<String>,
    pub failed: Vec<FailedItem>,
    /// History entries left behind by failed rollbacks.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unrecoverable: Vec<HistoryId>,
}

impl BatchOutcome {
    /// False only when a rollback failed; ordinary item failures do not count.
    pub fn status(&self) -> bool {
        self.unrecoverable.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.unrecoverable.is_empty()
    }

    fn fail(&mut self, path: &str, reason: impl Into<String>) {
        self.failed.push(FailedItem {
            path: path.to_string(),
            reason: reason.into(),
        });
    }
}

/// Dry-run description of one relocation.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub kind: ItemKind,
    pub old: String,
    pub new: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub moves: Vec<FileMove>,
}

pub struct Relocator<S, H, F> {
    tree: Tree,
    store: S,
    history: H,
    fs: F,
    options: RelocatorOptions,
}

impl<S, H, F> Relocator<S, H, F>
where
    S: MetadataStore,
    H: HistoryStore,
    F: FileSystem,
{
    pub fn new(tree: Tree, store: S, history: H, fs: F, options: RelocatorOptions) -> Self {
        Self {
            tree,
            store,
            history,
            fs,
            options,
        }
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Run one attempt under a history entry.
    pub fn relocate_item(&mut self, item: &mut Item) -> Result<Attempt, RelocateError> {
        let old = item.old().system_path();
        let new = item.new_path().system_path();
        let id = self
            .history
            .create(&old, &new)
            .map_err(RelocateError::HistoryUnavailable)?;
        info!(
            history_id = %id,
            kind = %item.kind(),
            old = %item.old(),
            new = %item.new_path(),
            "Relocating"
        );

        let mut svc = Services {
            fs: &self.fs,
            store: &mut self.store,
            history: &mut self.history,
        };
        let attempt = if item.relocate(&id, &mut svc) {
            Attempt::Completed
        } else if item.roll_back(&mut svc) {
            Attempt::RolledBack {
                reason: item.explain(false),
            }
        } else {
            self.dump(item);
            error!(
                history_id = %id,
                old = %old.display(),
                new = %new.display(),
                "Rollback failed; history entry kept for manual inspection"
            );
            return Err(RelocateError::IntegrityAtRisk {
                history_id: id,
                details: item.explain(true),
            });
        };

        self.dump(item);
        if let Err(e) = self.history.remove(&id) {
            warn!(history_id = %id, error = %e, "Could not remove finished history entry");
        }
        match &attempt {
            Attempt::Completed => info!(history_id = %id, new = %item.new_path(), "Relocation completed"),
            Attempt::RolledBack { reason } => {
                warn!(history_id = %id, old = %item.old(), reason = %reason, "Relocation rolled back")
            }
        }
        Ok(attempt)
    }

    /// Rename or move a single file or folder.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<Outcome, RelocateError> {
        let old = self.locate_source(old)?;
        let new = self.locate_target(new)?;
        let mut item = ItemFactory::create(old, new, &self.fs)?;
        self.outcome(&mut item)
    }

    /// Move every item into `destination`, keeping base names. One failing
    /// item never stops the others; a failed rollback stops the batch.
    pub fn move_items<T: AsRef<str>>(&mut self, items: &[T], destination: &str) -> Result<BatchOutcome, RelocateError> {
        let dest = self.tree.locate(destination)?;
        let mut outcome = BatchOutcome::default();
        let total = items.len();
        let mut done = 0usize;

        for chunk in items.chunks(self.options.batch_size.max(1)) {
            for raw in chunk {
                let raw = raw.as_ref();
                done += 1;
                if shutdown::is_requested() {
                    outcome.fail(raw, "interrupted");
                    continue;
                }
                if !outcome.unrecoverable.is_empty() {
                    outcome.fail(raw, "not attempted: an earlier rollback failed");
                    continue;
                }
                match self.move_one(raw, &dest) {
                    Ok(result) if result.success => {
                        outcome.successful.push(result.new_path.unwrap_or_default());
                    }
                    Ok(result) => outcome.fail(raw, result.error_message.unwrap_or_default()),
                    Err(e) => {
                        error!(code = e.code(), item = raw, error = %e, "Item relocation error");
                        if let RelocateError::IntegrityAtRisk { history_id, .. } = &e {
                            outcome.unrecoverable.push(history_id.clone());
                        }
                        outcome.fail(raw, e.to_string());
                    }
                }
            }
            info!(
                done,
                total,
                succeeded = outcome.successful.len(),
                failed = outcome.failed.len(),
                "Batch progress"
            );
        }
        Ok(outcome)
    }

    /// Create a new folder; the parent must exist.
    pub fn create_folder(&mut self, path: &str) -> Result<Outcome, RelocateError> {
        let path = self.locate_new_name(path)?;
        if !path.is_valid_file_name() {
            return Ok(Outcome::failure(format!("{} is not a valid folder name", path.base(true))));
        }
        if !path.parent().is_folder() {
            return Ok(Outcome::failure(format!(
                "Destination folder {} doesn't exist",
                path.parent().system_path().display()
            )));
        }
        let relative = path.relative().to_string();
        Ok(match path.create(&self.fs) {
            Ok(created) => {
                info!(path = %created, "Folder created");
                Outcome::success(relative)
            }
            Err(e) => Outcome::failure(e.to_string()),
        })
    }

    /// Validate and list the renames a relocation would perform.
    pub fn plan(&self, old: &str, new: &str) -> Result<Plan, RelocateError> {
        let old = self.locate_source(old)?;
        let new = self.locate_target(new)?;
        self.plan_for(old, new)
    }

    /// `plan` for one item of a batch move.
    pub fn plan_move(&self, item: &str, destination: &str) -> Result<Plan, RelocateError> {
        let old = self.locate_source(item)?;
        let new = self.tree.locate(destination)?.append(old.base(true));
        self.plan_for(old, new)
    }

    fn plan_for(&self, old: ManagedPath, new: ManagedPath) -> Result<Plan, RelocateError> {
        let mut item = ItemFactory::create(old, new, &self.fs)?;
        let valid = item.validate();
        let moves = item
            .planned_moves(&self.store)?
            .into_iter()
            .map(|(old, new)| FileMove { old, new })
            .collect();
        Ok(Plan {
            kind: item.kind(),
            old: item.old().relative().to_string(),
            new: item.new_path().relative().to_string(),
            valid,
            reason: item.last_error().map(str::to_string),
            moves,
        })
    }

    fn move_one(&mut self, raw: &str, dest: &ManagedPath) -> Result<Outcome, RelocateError> {
        let old = self.locate_source(raw)?;
        let new = dest.append(old.base(true));
        let mut item = ItemFactory::create(old, new, &self.fs)?;
        self.outcome(&mut item)
    }

    fn outcome(&mut self, item: &mut Item) -> Result<Outcome, RelocateError> {
        Ok(match self.relocate_item(item)? {
            Attempt::Completed => Outcome::success(item.new_path().relative()),
            Attempt::RolledBack { reason } => Outcome::failure(reason),
        })
    }

    fn locate_source(&self, raw: &str) -> Result<ManagedPath, RelocateError> {
        let path = self.tree.locate(raw)?;
        if path.is_root() {
            return Err(RelocateError::Input(format!("{raw:?} does not name an item")));
        }
        Ok(path)
    }

    fn locate_target(&self, raw: &str) -> Result<ManagedPath, RelocateError> {
        let path = self.tree.locate(raw)?;
        if path.is_root() {
            return Err(RelocateError::Input(format!("{raw:?} is not a valid destination")));
        }
        Ok(path)
    }

    /// A destination the caller is naming from scratch; forbidden characters
    /// are stripped instead of rejected.
    fn locate_new_name(&self, raw: &str) -> Result<ManagedPath, RelocateError> {
        let path = self.tree.locate_sanitized(raw)?;
        if path.is_root() {
            return Err(RelocateError::Input(format!("{raw:?} is not a valid destination")));
        }
        Ok(path)
    }

    fn dump(&self, item: &Item) {
        if !self.options.logging {
            return;
        }
        match serde_json::to_string(&item.tell()) {
            Ok(report) => debug!(old = %item.old(), report = %report, "Item operation log"),
            Err(e) => warn!(error = %e, "Could not serialize item operation log"),
        }
    }
}
