//! A single location inside the managed tree.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use super::{file_extension, file_stem, NameRules, Tree};
use crate::fs_ops::FileSystem;

/// Why `ManagedPath::create` refused or failed.
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("{0} already exists")]
    NotNew(PathBuf),

    #[error("Unable to create directory {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Normalized relative location plus its derived filesystem path and URL.
///
/// Immutable: `append` and `parent` return new values.
#[derive(Clone)]
pub struct ManagedPath {
    tree: Tree,
    relative: String,
    new: bool,
}

impl ManagedPath {
    /// `relative` must already be normalized (see `clean_path`).
    pub(super) fn new(tree: Tree, relative: String) -> Self {
        let mut p = Self {
            tree,
            relative,
            new: false,
        };
        p.new = !p.exists();
        p
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Slash-separated path relative to the root; empty for the root.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    /// True if nothing existed at this location when the value was built.
    pub fn is_new(&self) -> bool {
        self.new
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relative.split('/').filter(|s| !s.is_empty())
    }

    /// Absolute filesystem location, joined with the platform separator.
    pub fn system_path(&self) -> PathBuf {
        let mut p = self.tree.root().to_path_buf();
        for seg in self.segments() {
            p.push(seg);
        }
        p
    }

    /// Public reference used inside documents.
    pub fn url(&self) -> String {
        if self.is_root() {
            self.tree.base_url().to_string()
        } else {
            format!("{}/{}", self.tree.base_url(), self.relative)
        }
    }

    pub fn append(&self, segment: &str) -> ManagedPath {
        let joined = format!("{}/{}", self.relative, segment);
        self.tree.path(&joined)
    }

    /// Drops the last segment; the root is its own parent.
    pub fn parent(&self) -> ManagedPath {
        let mut parts: Vec<&str> = self.segments().collect();
        parts.pop();
        ManagedPath::new(self.tree.clone(), parts.join("/"))
    }

    /// Last segment. Without the extension this is the text before the first `.`.
    pub fn base(&self, with_extension: bool) -> &str {
        let base = self.relative.rsplit('/').next().unwrap_or("");
        if with_extension {
            base
        } else {
            file_stem(base)
        }
    }

    /// Text after the last `.` of the base name, or empty.
    pub fn extension(&self, with_dot: bool) -> String {
        file_extension(self.base(true), with_dot).to_string()
    }

    /// True when `other` lies at or below this path.
    pub fn is_parent(&self, other: &ManagedPath) -> bool {
        if !self.tree.same_root(&other.tree) {
            return false;
        }
        let mine: Vec<&str> = self.segments().collect();
        let theirs: Vec<&str> = other.segments().collect();
        theirs.len() >= mine.len() && theirs[..mine.len()] == mine[..]
    }

    pub fn exists(&self) -> bool {
        fs::symlink_metadata(self.system_path()).is_ok()
    }

    pub fn is_file(&self) -> bool {
        self.system_path().is_file()
    }

    pub fn is_folder(&self) -> bool {
        self.system_path().is_dir()
    }

    pub fn is_valid_file_name(&self) -> bool {
        self.is_valid_file_name_for(NameRules::native())
    }

    pub fn is_valid_file_name_for(&self, rules: NameRules) -> bool {
        rules.is_valid(self.base(true))
    }

    /// Create this location as a directory. Only allowed for paths flagged new.
    pub fn create(self, fs: &dyn FileSystem) -> Result<ManagedPath, CreateError> {
        let target = self.system_path();
        if !self.new {
            return Err(CreateError::NotNew(target));
        }
        fs.mkdir(&target).map_err(|e| CreateError::Io {
            path: target.clone(),
            message: e.to_string(),
        })?;
        Ok(ManagedPath {
            new: false,
            ..self
        })
    }
}

impl PartialEq for ManagedPath {
    fn eq(&self, other: &Self) -> bool {
        self.relative == other.relative && self.tree.same_root(&other.tree)
    }
}

impl Eq for ManagedPath {}

impl fmt::Display for ManagedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

impl fmt::Debug for ManagedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedPath")
            .field("relative", &self.relative)
            .field("new", &self.new)
            .finish()
    }
}
