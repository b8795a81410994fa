//! Folder variant: one rename moves the whole subtree, then every record
//! below the old folder is re-prefixed.

use tracing::{debug, warn};

use crate::metadata::ReferenceScope;

use super::{Item, Services, StepError};

pub(super) fn check(item: &Item) -> Result<(), StepError> {
    let (old, new) = (&item.old, &item.new);
    if old.is_root() {
        return Err(StepError::validation("The root folder can not be relocated"));
    }
    if old.relative() == new.relative() {
        return Err(StepError::validation(format!(
            "The old and new paths are the same: {old}"
        )));
    }
    if new.exists() {
        return Err(StepError::validation(format!(
            "{} already exists",
            new.system_path().display()
        )));
    }
    if old.is_parent(new) {
        return Err(StepError::validation(format!(
            "Can not move {old} into its own subfolder {new}"
        )));
    }
    let parent = new.parent();
    if !parent.is_folder() {
        return Err(StepError::validation(format!(
            "Destination folder {} doesn't exist",
            parent.system_path().display()
        )));
    }
    Ok(())
}

pub(super) fn relocate(item: &mut Item, svc: &mut Services<'_>) -> Result<(), StepError> {
    let (old, new) = (item.old.clone(), item.new.clone());
    item.rename(&old.system_path(), &new.system_path(), svc)?;

    let prefix = format!("{}/", old.relative());
    let records = svc
        .store
        .find_by_path_prefix(&prefix)
        .map_err(|e| StepError::metadata("Unable to look up records in folder", e))?;

    item.start_transaction(svc)?;

    for rec in records {
        let Some(rest) = rec.path.strip_prefix(&prefix) else {
            warn!(path = %rec.path, prefix = %prefix, "Store returned a record outside the folder");
            item.note(format!("Skipped record {} outside {old}", rec.path));
            continue;
        };
        let moved_to = format!("{}/{rest}", new.relative());
        let id = rec.id;
        svc.store
            .put(&moved_to, rec)
            .map_err(|e| StepError::metadata("Unable to update metadata record", e))?;
        item.history.records.push(id);
    }
    if !item.history.records.is_empty() {
        item.note(format!("Updated {} metadata records", item.history.records.len()));
    }

    let changed = svc
        .store
        .replace_text_in_documents(&old.url(), &new.url(), ReferenceScope::Prefix)
        .map_err(|e| StepError::metadata("Unable to update references", e))?;
    debug!(old = %old.url(), new = %new.url(), changed, "Rewrote folder references");
    item.history.documents += changed;

    item.commit_transaction(svc)
}
