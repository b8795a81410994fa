//! Shared fixtures: fault-injecting filesystem and metadata store wrappers,
//! plus a byte-level snapshot of a directory tree.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use media_relocate::{
    FileSystem, JsonHistoryLog, JsonMetadataStore, LocalFs, MediaRecord, MetadataStore, ReferenceScope,
    Relocator, RelocatorOptions, StoreError, Tree,
};
use walkdir::WalkDir;

pub const BASE_URL: &str = "http://example.test/uploads";

/// Local disk with scripted rename failures.
#[derive(Default)]
pub struct FaultFs {
    pub calls: Cell<usize>,
    /// 1-based index of the forward rename that fails.
    pub fail_rename: Option<usize>,
    /// 1-based index of the forward rename that reports success without moving.
    pub lie_rename: Option<usize>,
    /// Every reverse rename (undoing an earlier one) fails.
    pub fail_reverse: bool,
    pub done: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl FaultFs {
    pub fn failing_at(n: usize) -> Self {
        Self { fail_rename: Some(n), ..Default::default() }
    }

    pub fn renames(&self) -> usize {
        self.calls.get()
    }
}

impl FileSystem for FaultFs {
    fn exists(&self, path: &Path) -> bool {
        LocalFs.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        LocalFs.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        LocalFs.is_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let reverse = self
            .done
            .borrow()
            .iter()
            .any(|(f, t)| f.as_path() == to && t.as_path() == from);
        if reverse {
            if self.fail_reverse {
                return Err(io::Error::other("injected reverse rename failure"));
            }
            return LocalFs.rename(from, to);
        }

        let n = self.calls.get() + 1;
        self.calls.set(n);
        if self.fail_rename == Some(n) {
            return Err(io::Error::other(format!("injected failure on rename #{n}")));
        }
        if self.lie_rename == Some(n) {
            return Ok(());
        }
        LocalFs.rename(from, to)?;
        self.done.borrow_mut().push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        LocalFs.mkdir(path)
    }
}

/// In-memory metadata store with scripted transaction failures.
#[derive(Default)]
pub struct FaultStore {
    pub inner: JsonMetadataStore,
    pub fail_begin: bool,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    pub fail_replace: bool,
    /// Prefix lookups ignore the prefix and return every record.
    pub loose_prefix: bool,
}

fn injected(what: &str) -> StoreError {
    StoreError::Io(io::Error::other(format!("injected {what} failure")))
}

impl MetadataStore for FaultStore {
    fn get(&self, path: &str) -> Result<Option<MediaRecord>, StoreError> {
        self.inner.get(path)
    }

    fn put(&mut self, path: &str, record: MediaRecord) -> Result<(), StoreError> {
        self.inner.put(path, record)
    }

    fn find_by_path_prefix(&self, prefix: &str) -> Result<Vec<MediaRecord>, StoreError> {
        if self.loose_prefix {
            return Ok(self.inner.records().to_vec());
        }
        self.inner.find_by_path_prefix(prefix)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if self.fail_begin {
            return Err(injected("begin"));
        }
        self.inner.begin()
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.fail_commit {
            return Err(injected("commit"));
        }
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.fail_rollback {
            return Err(injected("rollback"));
        }
        self.inner.rollback()
    }

    fn replace_text_in_documents(
        &mut self,
        old_ref: &str,
        new_ref: &str,
        scope: ReferenceScope,
    ) -> Result<usize, StoreError> {
        if self.fail_replace {
            return Err(injected("reference update"));
        }
        self.inner.replace_text_in_documents(old_ref, new_ref, scope)
    }
}

pub fn options() -> RelocatorOptions {
    RelocatorOptions { logging: true, batch_size: 2 }
}

pub fn relocator<S: MetadataStore, F: FileSystem>(root: &Path, store: S, fs: F) -> Relocator<S, JsonHistoryLog, F> {
    Relocator::new(Tree::new(root, BASE_URL), store, JsonHistoryLog::in_memory(), fs, options())
}

pub fn local(root: &Path, store: JsonMetadataStore) -> Relocator<JsonMetadataStore, JsonHistoryLog, LocalFs> {
    relocator(root, store, LocalFs)
}

pub fn url(rel: &str) -> String {
    format!("{BASE_URL}/{rel}")
}

/// Write `contents` at `rel` under `root`, creating parents.
pub fn put_file(root: &Path, rel: &str, contents: &str) {
    let p = root.join(rel);
    if let Some(parent) = p.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(p, contents).unwrap();
}

/// Relative path -> file bytes (None for directories).
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            let bytes = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (rel, bytes)
        })
        .collect()
}
