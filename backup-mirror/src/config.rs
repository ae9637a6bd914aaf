//! Configuration management for the backup mirror.
//!
//! Loads configuration from an optional TOML file with environment variable
//! overrides (`BACKUP_MIRROR__<SECTION>__<KEY>`).

use crate::fs::walker::WalkOptions;
use crate::sync::MirrorOptions;
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_PREFIX: &str = "BACKUP_MIRROR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub walk: WalkConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_links: bool,

    /// Entry names containing any of these substrings are ignored
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format of the final report
    #[serde(default)]
    pub format: OutputFormat,
}

/// How the report is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// Default values
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::load(Some(path))
    }

    /// Defaults plus environment overrides, no file
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("walk.exclude_patterns")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// The effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::utils::MirrorError::config(e.to_string()))
    }

    pub fn mirror_options(&self) -> MirrorOptions {
        MirrorOptions {
            walk: WalkOptions {
                follow_links: self.walk.follow_links,
                exclude_patterns: self.walk.exclude_patterns.clone(),
            },
        }
    }
}
