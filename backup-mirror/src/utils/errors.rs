//! Error types for the backup mirror.
//!
//! Only run-aborting failures live here. Per-entry failures are recorded in
//! the report as [`FailedEntry`](crate::report::FailedEntry) values.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot enumerate {}: {source}", path.display())]
    RootEnumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MirrorError {
    pub fn config(message: impl Into<String>) -> Self {
        MirrorError::Config(message.into())
    }
}

impl From<config::ConfigError> for MirrorError {
    fn from(err: config::ConfigError) -> Self {
        MirrorError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
