//! Filesystem primitive used by the relocation engine.
//!
//! The engine never touches `std::fs` for mutations directly; it goes through
//! `FileSystem` so verification and failure paths can be exercised.

mod atomic;
mod helpers;
#[cfg(unix)]
mod util;

pub use atomic::try_atomic_move;
pub use helpers::{io_error_with_help, io_error_with_help_io};

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Filesystem operations the relocation protocol relies on.
pub trait FileSystem {
    /// True if anything (file, folder, dangling link) is present at `path`.
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Rename without clobbering: fails if `to` already exists.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    /// Create a single directory; the parent must exist.
    fn mkdir(&self, path: &Path) -> io::Result<()>;
}

/// The local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        try_atomic_move(from, to)
    }

    fn mkdir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).map_err(io_error_with_help_io("create directory", path))?;
        debug!(path = %path.display(), "Created directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn local_rename_moves_and_refuses_to_clobber() {
        let td = tempdir().unwrap();
        let a = td.path().join("a.txt");
        let b = td.path().join("b.txt");
        let c = td.path().join("c.txt");
        fs::write(&a, b"a").unwrap();
        fs::write(&c, b"c").unwrap();

        LocalFs.rename(&a, &b).unwrap();
        assert!(!LocalFs.exists(&a));
        assert_eq!(fs::read(&b).unwrap(), b"a");

        let err = LocalFs.rename(&b, &c).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read(&c).unwrap(), b"c");
        assert!(LocalFs.exists(&b));
    }

    #[test]
    fn mkdir_needs_parent() {
        let td = tempdir().unwrap();
        let ok = td.path().join("one");
        LocalFs.mkdir(&ok).unwrap();
        assert!(LocalFs.is_dir(&ok));
        let err = LocalFs.mkdir(&td.path().join("x").join("y")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("create directory"));
    }
}
