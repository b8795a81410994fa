//! Core configuration types.
//! - Config holds runtime settings with sensible defaults.
//! - LogLevel represents console verbosity.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::paths;
use super::{BASE_URL_DEFAULT, BATCH_SIZE_DEFAULT, ROOT_DIR_DEFAULT};
use crate::relocator::RelocatorOptions;
use crate::tree::Tree;

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    #[default]
    Normal,
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Case-insensitive; accepts a few common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        })
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Runtime configuration for the relocation engine and the CLI around it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the managed media tree
    pub root_dir: PathBuf,
    /// Public URL prefix that maps to `root_dir` inside documents
    pub base_url: String,
    /// JSON metadata store (records and documents)
    pub metadata_file: PathBuf,
    /// JSON relocation history log
    pub history_file: PathBuf,
    /// Items per progress chunk in batch moves
    pub batch_size: usize,
    /// Dump every item's operation log after its attempt
    pub logging: bool,
    pub log_level: LogLevel,
    pub log_file: Option<PathBuf>,
    /// Validate and print planned renames without touching anything
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(ROOT_DIR_DEFAULT),
            base_url: BASE_URL_DEFAULT.to_string(),
            metadata_file: paths::default_data_path("metadata.json")
                .unwrap_or_else(|| PathBuf::from("metadata.json")),
            history_file: paths::default_data_path("history.json")
                .unwrap_or_else(|| PathBuf::from("history.json")),
            batch_size: BATCH_SIZE_DEFAULT,
            logging: true,
            log_level: LogLevel::Normal,
            log_file: None,
            dry_run: false,
        }
    }
}

impl Config {
    /// Explicit root and base URL; other fields use defaults.
    pub fn new(root_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn tree(&self) -> Tree {
        Tree::new(&self.root_dir, self.base_url.clone())
    }

    pub fn relocator_options(&self) -> RelocatorOptions {
        RelocatorOptions {
            logging: self.logging,
            batch_size: self.batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_aliases() {
        assert_eq!(LogLevel::parse(" Verbose "), Some(LogLevel::Info));
        assert_eq!("trace".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn options_follow_config() {
        let mut cfg = Config::new("/tmp/m", "http://x");
        cfg.logging = false;
        cfg.batch_size = 7;
        let opts = cfg.relocator_options();
        assert!(!opts.logging);
        assert_eq!(opts.batch_size, 7);
        assert_eq!(cfg.tree().base_url(), "http://x");
    }
}
