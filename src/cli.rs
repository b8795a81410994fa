//! CLI definition and parsing.
//!
//! Notes:
//! - Global flags override config values loaded from XML.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};

/// Relocate files and folders in a managed media tree, keeping metadata and
/// document references in step.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Move and rename media files without breaking references")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Override the managed root directory.
    #[arg(long, global = true, value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Override the public URL prefix of the root.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Override the metadata store file.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub metadata_file: Option<PathBuf>,

    /// Override the history log file.
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub history_file: Option<PathBuf>,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs and results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Validate and show planned renames without changing anything.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the config file location and exit.
    #[arg(long)]
    pub print_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rename or move one file or folder.
    Rename {
        /// Current path, relative to the root or absolute under it.
        old: String,
        /// New path.
        new: String,
    },
    /// Move several items into a folder, keeping their names.
    Move {
        /// Destination folder.
        #[arg(long = "to", short = 't', value_name = "DEST")]
        to: String,
        #[arg(required = true, num_args = 1..)]
        items: Vec<String>,
    },
    /// Create a folder.
    Mkdir { path: String },
    /// List relocations left unfinished in the history log.
    History,
}

impl Args {
    /// Precedence: --debug > --log-level value > None (use config).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config in place. Unset flags are no-ops.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(root) = &self.root {
            cfg.root_dir = root.clone();
        }
        if let Some(url) = &self.base_url {
            cfg.base_url = url.clone();
        }
        if let Some(p) = &self.metadata_file {
            cfg.metadata_file = p.clone();
        }
        if let Some(p) = &self.history_file {
            cfg.history_file = p.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if self.dry_run {
            cfg.dry_run = true;
        }
    }
}

pub fn parse() -> Args {
    Args::parse()
}
