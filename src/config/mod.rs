//! Configuration: typed settings, default locations, XML loading and validation.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{CONFIG_ENV, default_config_path, default_data_path, default_log_path, path_has_symlink_ancestor};
pub use types::{Config, LogLevel};
pub use xml::{LoadResult, create_template_config, load_config, load_config_from_xml_path};

pub const ROOT_DIR_DEFAULT: &str = "/srv/media";
pub const BASE_URL_DEFAULT: &str = "http://localhost/media";
pub const BATCH_SIZE_DEFAULT: usize = 50;
pub const BATCH_SIZE_MAX: usize = 1000;
