use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::content::posts::FilterConfig;

/// Looked up as `wp_migrate.toml` (or any format `config` knows) in the working dir.
const DEFAULT_CONFIG: &str = "wp_migrate";
const ENV_PREFIX: &str = "WPM";

/// Layered settings: defaults < config file < `WPM_*` environment < CLI flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub posts_dump: PathBuf,
    pub meta_dump: PathBuf,
    pub output_dir: PathBuf,
    pub featured_meta_key: String,
    pub filter: FilterConfig,
    pub import: ImportSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub table: String,
    pub batch_size: usize,
    pub env_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            posts_dump: PathBuf::from("wp_files/wp_posts.sql"),
            meta_dump: PathBuf::from("wp_files/wp_postmeta.sql"),
            output_dir: PathBuf::from("data"),
            featured_meta_key: "_thumbnail_id".to_string(),
            filter: FilterConfig::default(),
            import: ImportSettings::default(),
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            table: "posts".to_string(),
            batch_size: 50,
            env_file: PathBuf::from(".env.local"),
        }
    }
}

impl Settings {
    /// An explicit `path` must exist; the default config file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("filter.exclude_slugs")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
