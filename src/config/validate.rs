//! Config validation logic.
//! Checks the managed root, the URL prefix and batch size, and prepares the
//! directories that hold the metadata store and history log.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::fs_ops::io_error_with_help;
use crate::platform::set_dir_mode_0700;

use super::BATCH_SIZE_MAX;
use super::types::Config;

impl Config {
    pub fn validate(&self) -> Result<()> {
        let root = &self.root_dir;
        if !root.exists() {
            error!(root = %root.display(), "root_dir does not exist");
            bail!("root_dir does not exist: {}", root.display());
        }
        if !root.is_dir() {
            error!(root = %root.display(), "root_dir is not a directory");
            bail!("root_dir is not a directory: {}", root.display());
        }
        fs::read_dir(root)
            .map_err(io_error_with_help("read root_dir", root))
            .context("Cannot read root_dir; check permissions")?;

        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if !(1..=BATCH_SIZE_MAX).contains(&self.batch_size) {
            bail!("batch_size must be between 1 and {BATCH_SIZE_MAX}, got {}", self.batch_size);
        }

        ensure_parent_dir(&self.metadata_file, "metadata_file")?;
        ensure_parent_dir(&self.history_file, "history_file")?;
        if self.metadata_file == self.history_file {
            bail!(
                "metadata_file and history_file must differ: '{}'",
                self.metadata_file.display()
            );
        }

        let real_root = dunce::canonicalize(root).unwrap_or_else(|_| root.clone());
        info!(
            root = %real_root.display(),
            base_url = %self.base_url,
            metadata = %self.metadata_file.display(),
            history = %self.history_file.display(),
            "Config validated"
        );
        Ok(())
    }
}

/// Create the parent of a data file if missing; it must be a directory.
fn ensure_parent_dir(file: &Path, name: &str) -> Result<()> {
    let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if parent.exists() {
        if !parent.is_dir() {
            bail!("{name} parent exists but isn't a directory: {}", parent.display());
        }
        return Ok(());
    }
    fs::create_dir_all(parent)
        .map_err(io_error_with_help("create directory", parent))
        .with_context(|| format!("Failed to create {name} directory"))?;
    let _ = set_dir_mode_0700(parent);
    debug!("Created {name} directory: {}", parent.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &Path) -> Config {
        let mut cfg = Config::new(dir.join("media"), "http://m");
        cfg.metadata_file = dir.join("data").join("metadata.json");
        cfg.history_file = dir.join("data").join("history.json");
        cfg
    }

    #[test]
    fn valid_config_creates_data_dir() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("media")).unwrap();
        let cfg = config_in(td.path());
        cfg.validate().unwrap();
        assert!(td.path().join("data").is_dir());
    }

    #[test]
    fn missing_root_is_rejected() {
        let td = tempdir().unwrap();
        let err = config_in(td.path()).validate().unwrap_err();
        assert!(err.to_string().contains("root_dir does not exist"));
    }

    #[test]
    fn batch_size_bounds() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("media")).unwrap();
        let mut cfg = config_in(td.path());
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());
        cfg.batch_size = BATCH_SIZE_MAX + 1;
        assert!(cfg.validate().is_err());
        cfg.batch_size = BATCH_SIZE_MAX;
        assert!(cfg.validate().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn uncreatable_data_dir_reports_path_and_hint() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("media")).unwrap();
        fs::write(td.path().join("blocker"), b"").unwrap();
        let mut cfg = config_in(td.path());
        cfg.metadata_file = td.path().join("blocker").join("sub").join("metadata.json");
        let err = cfg.validate().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Failed to create metadata_file directory"), "{msg}");
        assert!(msg.contains("create directory '"), "{msg}");
        assert!(msg.contains("os code"), "{msg}");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let td = tempdir().unwrap();
        fs::create_dir(td.path().join("media")).unwrap();
        let mut cfg = config_in(td.path());
        cfg.base_url = "  ".into();
        assert!(cfg.validate().is_err());
    }
}
