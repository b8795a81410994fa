//! Atomic rename helper.
//! - Refuses to replace an existing destination (rename would clobber it on Unix).
//! - Errors carry the operation, both paths and a platform hint.
//! - On Unix, best-effort fsync of both parent directories after the rename.

use std::fs;
use std::io;
use std::path::Path;

use super::helpers::io_error_with_help_io;

pub fn try_atomic_move(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "rename '{}' -> '{}': destination already exists",
                src.display(),
                dst.display()
            ),
        ));
    }

    fs::rename(src, dst).map_err(io_error_with_help_io("rename", src))?;

    // Persist the directory entries; a failed fsync does not undo a completed rename.
    #[cfg(unix)]
    {
        if let Some(parent) = dst.parent() {
            let _ = super::util::fsync_dir(parent);
        }
        if let Some(parent) = src.parent() {
            if Some(parent) != dst.parent() {
                let _ = super::util::fsync_dir(parent);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn moves_directory_subtree() {
        let td = tempdir().unwrap();
        let src = td.path().join("a");
        fs::create_dir_all(src.join("b")).unwrap();
        fs::write(src.join("b").join("f.txt"), b"f").unwrap();
        let dst = td.path().join("z");
        try_atomic_move(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(dst.join("b").join("f.txt")).unwrap(), b"f");
    }

    #[test]
    fn missing_source_reports_path() {
        let td = tempdir().unwrap();
        let src = td.path().join("nope");
        let err = try_atomic_move(&src, &td.path().join("x")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().contains("nope"));
    }
}
