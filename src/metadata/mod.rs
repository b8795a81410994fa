//! Metadata store contract.
//!
//! A record ties a managed file (by relative path) to its derived files:
//! size variants and backups, stored by file name. Documents are free text
//! that reference files by public URL.

mod json;

pub use json::JsonMetadataStore;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

pub type RecordId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: RecordId,
    /// Normalized path relative to the managed root.
    pub path: String,
    /// Size variant name -> file name, e.g. "thumbnail" -> "image-150x150.jpg".
    #[serde(default)]
    pub sizes: BTreeMap<String, String>,
    /// Backup key -> file name.
    #[serde(default)]
    pub backups: BTreeMap<String, String>,
}

impl MediaRecord {
    pub fn new(id: RecordId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
            sizes: BTreeMap::new(),
            backups: BTreeMap::new(),
        }
    }

    /// File names of every derived file, sizes first then backups.
    /// Empty names, the primary's own name and duplicates are skipped.
    pub fn related_file_names(&self) -> Vec<String> {
        let primary = self.path.rsplit('/').next().unwrap_or_default();
        let mut names: Vec<String> = Vec::new();
        for name in self.sizes.values().chain(self.backups.values()) {
            if name.is_empty() || name == primary || names.iter().any(|n| n == name) {
                continue;
            }
            names.push(name.clone());
        }
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: RecordId,
    pub content: String,
}

/// How a reference must be bounded on its right to count as a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceScope {
    /// The whole reference, closed by a quote: `.../image.jpg"`.
    Exact,
    /// The reference or anything below it: followed by `/` or a quote.
    Prefix,
}

impl ReferenceScope {
    fn accepts(self, next: Option<char>) -> bool {
        match (self, next) {
            (_, Some('"')) => true,
            (ReferenceScope::Prefix, Some('/')) => true,
            _ => false,
        }
    }
}

/// Replace each bounded occurrence of `old` in `content` by `new`.
/// Returns `None` when nothing qualified.
pub fn replace_reference(content: &str, old: &str, new: &str, scope: ReferenceScope) -> Option<String> {
    if old.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    let mut replaced = false;
    while let Some(pos) = rest.find(old) {
        let after = &rest[pos + old.len()..];
        out.push_str(&rest[..pos]);
        if scope.accepts(after.chars().next()) {
            out.push_str(new);
            replaced = true;
        } else {
            out.push_str(old);
        }
        rest = after;
    }
    out.push_str(rest);
    replaced.then_some(out)
}

/// What the relocation engine needs from a metadata backend.
pub trait MetadataStore {
    fn get(&self, path: &str) -> Result<Option<MediaRecord>, StoreError>;
    /// Store `record` under `path`, replacing whatever was registered at the
    /// record's previous path.
    fn put(&mut self, path: &str, record: MediaRecord) -> Result<(), StoreError>;
    /// Records whose path starts with `prefix` (callers include the trailing `/`).
    fn find_by_path_prefix(&self, prefix: &str) -> Result<Vec<MediaRecord>, StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Rewrite bounded references across all documents; returns how many
    /// documents changed.
    fn replace_text_in_documents(
        &mut self,
        old_ref: &str,
        new_ref: &str,
        scope: ReferenceScope,
    ) -> Result<usize, StoreError>;
}
