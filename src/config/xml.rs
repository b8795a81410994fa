//! XML configuration support.
//! - Loads settings from config.xml (quick_xml + serde).
//! - Creates a commented template on first run at the default location.
//!
//! Unknown elements are rejected so typos surface instead of silently
//! falling back to defaults.

use anyhow::{anyhow, Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use super::paths::{CONFIG_ENV, default_config_path, path_has_symlink_ancestor};
use super::types::{Config, LogLevel};
use super::{BASE_URL_DEFAULT, BATCH_SIZE_DEFAULT, ROOT_DIR_DEFAULT};
use crate::platform::{set_dir_mode_0700, write_private_file_atomic};

#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    root_dir: Option<String>,
    base_url: Option<String>,
    metadata_file: Option<String>,
    history_file: Option<String>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    batch_size: Option<usize>,
    #[serde(default, deserialize_with = "de_trimmed_opt")]
    logging: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

/// Whitespace-tolerant scalar; unparsable values count as absent.
fn de_trimmed_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| s.trim().parse::<T>().ok()))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// What `load_config` found.
#[derive(Debug)]
pub enum LoadResult {
    Loaded(Config, PathBuf),
    /// No config existed; a template was written here and defaults apply.
    CreatedTemplate(PathBuf),
    /// No config and none created (explicit path missing, or no default location).
    Missing(Option<PathBuf>),
}

fn xml_to_config(parsed: XmlConfig) -> Config {
    let mut cfg = Config::default();
    if let Some(root) = non_empty(parsed.root_dir) {
        cfg.root_dir = PathBuf::from(root);
    }
    if let Some(url) = non_empty(parsed.base_url) {
        cfg.base_url = url;
    }
    if let Some(p) = non_empty(parsed.metadata_file) {
        cfg.metadata_file = PathBuf::from(p);
    }
    if let Some(p) = non_empty(parsed.history_file) {
        cfg.history_file = PathBuf::from(p);
    }
    if let Some(n) = parsed.batch_size {
        cfg.batch_size = n;
    }
    if let Some(flag) = parsed.logging {
        cfg.logging = flag;
    }
    if let Some(level) = parsed.log_level.as_deref().and_then(LogLevel::parse) {
        cfg.log_level = level;
    }
    cfg.log_file = non_empty(parsed.log_file).map(PathBuf::from);
    cfg
}

/// Load a Config from a specific XML file.
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig =
        from_xml_str(&contents).with_context(|| format!("parse config xml '{}'", path.display()))?;
    Ok(xml_to_config(parsed))
}

/// Resolve the config location and load it, writing a template on first run
/// when the default location is in use.
pub fn load_config() -> Result<LoadResult> {
    let explicit = env::var_os(CONFIG_ENV).is_some();
    let Some(path) = default_config_path() else {
        return Ok(LoadResult::Missing(None));
    };
    if path.exists() {
        let cfg = load_config_from_xml_path(&path)?;
        return Ok(LoadResult::Loaded(cfg, path));
    }
    if explicit {
        return Ok(LoadResult::Missing(Some(path)));
    }
    create_template_config(&path)?;
    Ok(LoadResult::CreatedTemplate(path))
}

/// Write the commented default config. Refuses symlinked ancestors.
pub fn create_template_config(path: &Path) -> Result<()> {
    if path_has_symlink_ancestor(path)? {
        return Err(anyhow!(
            "Refusing to create config: ancestor of {} is a symlink",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory '{}'", parent.display()))?;
        let _ = set_dir_mode_0700(parent);
    }

    let defaults = Config::default();
    let content = format!(
        "<!--\n  media_relocate configuration (XML)\n\n    root_dir       -> root of the managed media tree\n    base_url       -> public URL prefix documents use to reference files under root_dir\n    metadata_file  -> JSON metadata store (records + documents)\n    history_file   -> JSON relocation history log\n    batch_size     -> items per progress chunk when moving many items (1-1000)\n    logging        -> true/false: dump each item's operation log at debug level\n    log_level      -> quiet | normal | info | debug\n    log_file       -> optional log file (console output is kept)\n\n  CLI flags override XML values.\n-->\n<config>\n  <root_dir>{}</root_dir>\n  <base_url>{}</base_url>\n  <metadata_file>{}</metadata_file>\n  <history_file>{}</history_file>\n  <batch_size>{}</batch_size>\n  <logging>true</logging>\n  <log_level>normal</log_level>\n  <log_file></log_file>\n</config>\n",
        ROOT_DIR_DEFAULT,
        BASE_URL_DEFAULT,
        defaults.metadata_file.display(),
        defaults.history_file.display(),
        BATCH_SIZE_DEFAULT,
    );

    write_private_file_atomic(path, content.as_bytes())
        .with_context(|| format!("write template config '{}'", path.display()))?;
    info!("Created template config at {}", path.display());
    Ok(())
}
