use crate::errors::RelocateError;
use crate::fs_ops::FileSystem;
use crate::tree::ManagedPath;

use super::{Item, ItemKind};

/// Picks the item variant from the source side only.
pub struct ItemFactory;

impl ItemFactory {
    pub fn create(old: ManagedPath, new: ManagedPath, fs: &dyn FileSystem) -> Result<Item, RelocateError> {
        let source = old.system_path();
        if !fs.exists(&source) {
            return Err(RelocateError::NotFound(source));
        }
        let kind = if fs.is_file(&source) {
            ItemKind::File
        } else if fs.is_dir(&source) {
            ItemKind::Folder
        } else {
            return Err(RelocateError::UnsupportedType(source));
        };
        Ok(Item::new(kind, old, new))
    }
}
