//! File variant: the primary file plus every derived file its record lists.

use tracing::debug;

use crate::errors::StoreError;
use crate::metadata::{MediaRecord, MetadataStore, ReferenceScope};
use crate::tree::ManagedPath;

use super::names::derived_name;
use super::{Item, Services, StepError};

pub(super) fn check(item: &Item) -> Result<(), StepError> {
    let (old, new) = (&item.old, &item.new);
    if old.relative() == new.relative() {
        return Err(StepError::validation(format!(
            "The old and new paths are the same: {old}"
        )));
    }
    let parent = new.parent();
    if !parent.is_folder() {
        return Err(StepError::validation(format!(
            "Destination folder {} doesn't exist",
            parent.system_path().display()
        )));
    }
    if new.exists() {
        return Err(StepError::validation(format!(
            "{} already exists",
            new.system_path().display()
        )));
    }
    if !new.is_valid_file_name() {
        return Err(StepError::validation(format!(
            "{} is not a valid file name",
            new.base(true)
        )));
    }
    Ok(())
}

/// Same base name means only the folder changes.
fn is_move(old: &ManagedPath, new: &ManagedPath) -> bool {
    old.base(true) == new.base(true)
}

fn target_name(name: &str, old: &ManagedPath, new: &ManagedPath) -> String {
    if is_move(old, new) {
        name.to_string()
    } else {
        derived_name(name, old.base(true), new.base(true))
    }
}

/// The primary record, if any, and every (source, target) pair to rename,
/// primary first.
pub(super) fn planned(
    item: &Item,
    store: &dyn MetadataStore,
) -> Result<(Option<MediaRecord>, Vec<(ManagedPath, ManagedPath)>), StoreError> {
    let (old, new) = (&item.old, &item.new);
    let record = store.get(old.relative())?;
    let mut pairs = vec![(old.clone(), new.clone())];
    if let Some(rec) = &record {
        let (old_dir, new_dir) = (old.parent(), new.parent());
        for name in rec.related_file_names() {
            let target = target_name(&name, old, new);
            pairs.push((old_dir.append(&name), new_dir.append(&target)));
        }
    }
    Ok((record, pairs))
}

pub(super) fn relocate(item: &mut Item, svc: &mut Services<'_>) -> Result<(), StepError> {
    let (record, pairs) = planned(item, &*svc.store)
        .map_err(|e| StepError::metadata("Unable to read metadata record", e))?;

    let mut moved = Vec::new();
    for (from, to) in &pairs {
        if item.rename(&from.system_path(), &to.system_path(), svc)? {
            moved.push((from.url(), to.url()));
        }
    }

    item.start_transaction(svc)?;

    if let Some(mut rec) = record {
        let (old, new) = (item.old.clone(), item.new.clone());
        if !is_move(&old, &new) {
            for name in rec.sizes.values_mut().chain(rec.backups.values_mut()) {
                if !name.is_empty() {
                    *name = target_name(name, &old, &new);
                }
            }
        }
        let id = rec.id;
        svc.store
            .put(new.relative(), rec)
            .map_err(|e| StepError::metadata("Unable to update metadata record", e))?;
        item.history.records.push(id);
        item.note(format!("Updated metadata record {id}"));
    }

    for (old_ref, new_ref) in &moved {
        let changed = svc
            .store
            .replace_text_in_documents(old_ref, new_ref, ReferenceScope::Exact)
            .map_err(|e| StepError::metadata("Unable to update references", e))?;
        debug!(old = %old_ref, new = %new_ref, changed, "Rewrote references");
        item.history.documents += changed;
    }

    item.commit_transaction(svc)
}
