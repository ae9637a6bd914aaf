//! Validation of the two tree roots before a run.
//!
//! The driver trusts its inputs; this is the gate the command line passes
//! them through first.

use crate::utils::{MirrorError, Result};
use std::io;
use std::path::{Path, PathBuf};

/// A validated, canonical pair of roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRoots {
    pub source: PathBuf,
    pub backup: PathBuf,
}

/// Check that both paths are usable and not nested inside each other.
///
/// The source must be an existing directory. The backup may be missing as
/// long as its parent exists; the driver creates it.
pub fn validate_roots(source: &Path, backup: &Path) -> Result<SyncRoots> {
    if source.as_os_str().is_empty() {
        return Err(MirrorError::config("source directory path is empty"));
    }
    if backup.as_os_str().is_empty() {
        return Err(MirrorError::config("backup directory path is empty"));
    }

    let source = match std::fs::metadata(source) {
        Ok(metadata) if metadata.is_dir() => dunce::canonicalize(source)?,
        Ok(_) => {
            return Err(MirrorError::config(format!(
                "source is not a directory: {}",
                source.display()
            )))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(MirrorError::config(format!(
                "source directory does not exist: {}",
                source.display()
            )))
        }
        Err(err) => return Err(err.into()),
    };

    let backup = canonical_backup(backup)?;

    if source == backup {
        return Err(MirrorError::config("source and backup are the same directory"));
    }
    if backup.starts_with(&source) {
        return Err(MirrorError::config(format!(
            "backup directory {} is inside the source directory",
            backup.display()
        )));
    }
    if source.starts_with(&backup) {
        return Err(MirrorError::config(format!(
            "source directory {} is inside the backup directory",
            source.display()
        )));
    }

    Ok(SyncRoots { source, backup })
}

fn canonical_backup(backup: &Path) -> Result<PathBuf> {
    match std::fs::metadata(backup) {
        Ok(metadata) if metadata.is_dir() => Ok(dunce::canonicalize(backup)?),
        Ok(_) => Err(MirrorError::config(format!(
            "backup is not a directory: {}",
            backup.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let name = backup.file_name().ok_or_else(|| {
                MirrorError::config(format!("invalid backup directory: {}", backup.display()))
            })?;
            let parent = match backup.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            if !parent.is_dir() {
                return Err(MirrorError::config(format!(
                    "parent of backup directory does not exist: {}",
                    parent.display()
                )));
            }
            Ok(dunce::canonicalize(parent)?.join(name))
        }
        Err(err) => Err(err.into()),
    }
}
