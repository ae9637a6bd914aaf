//! Copy executor: moves one file's content and timestamps into the backup.
//!
//! The content is written to a temporary file next to the destination and
//! renamed over it only once permissions and timestamps are in place, so a
//! failed copy never damages an existing backup file.

use crate::fs::metadata::{BackupState, FileRecord};
use crate::sync::decision::SyncAction;
use filetime::FileTime;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const STAGING_PREFIX: &str = ".backup-mirror-";

/// Step of a copy that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStage {
    /// The action does not call for a copy
    Plan,
    /// Opening or statting the source
    Open,
    /// Creating the temporary file in the backup directory
    Stage,
    /// Streaming content
    Write,
    /// Applying source permissions
    Permissions,
    /// Applying source timestamps
    Timestamps,
    /// Renaming the temporary file over the destination
    Commit,
}

impl fmt::Display for CopyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CopyStage::Plan => "plan",
            CopyStage::Open => "open source",
            CopyStage::Stage => "create staging file",
            CopyStage::Write => "copy content",
            CopyStage::Permissions => "preserve permissions",
            CopyStage::Timestamps => "preserve timestamps",
            CopyStage::Commit => "replace destination",
        };
        f.write_str(name)
    }
}

/// A failed copy, with the step and path that failed
#[derive(Error, Debug)]
#[error("{stage} failed for {}: {source}", path.display())]
pub struct CopyError {
    pub stage: CopyStage,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl CopyError {
    fn at(stage: CopyStage, path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self {
            stage,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of executing a `Create` or `Update`
#[derive(Debug)]
pub enum CopyOutcome {
    Succeeded {
        /// Bytes written to the destination
        bytes_written: u64,
        /// Destination size after minus destination size before
        bytes_delta: i64,
    },
    Failed(CopyError),
}

/// Copy `record` into the backup according to `action`.
///
/// `backup_before` is the destination as probed before deciding; for an
/// `Update` its size is subtracted from the bytes written. Never panics and
/// never creates directories: the destination directory must exist.
pub fn execute(action: SyncAction, record: &FileRecord, backup_before: Option<&BackupState>) -> CopyOutcome {
    if !action.requires_copy() {
        return CopyOutcome::Failed(CopyError {
            stage: CopyStage::Plan,
            path: record.backup_path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "skipped files are not copied"),
        });
    }

    match copy_with_metadata(&record.source_path, &record.backup_path) {
        Ok(bytes_written) => {
            let previous = match action {
                SyncAction::Update => backup_before.map(|state| state.size).unwrap_or(0),
                _ => 0,
            };
            let bytes_delta = bytes_written as i64 - previous as i64;
            info!(
                "Copied {} ({} bytes, delta {:+})",
                record.entry, bytes_written, bytes_delta
            );
            CopyOutcome::Succeeded {
                bytes_written,
                bytes_delta,
            }
        }
        Err(err) => CopyOutcome::Failed(err),
    }
}

/// Copy content, permissions and timestamps from `source` to `destination`.
///
/// Returns the number of content bytes written.
pub fn copy_with_metadata(source: &Path, destination: &Path) -> Result<u64, CopyError> {
    let directory = destination.parent().ok_or_else(|| CopyError {
        stage: CopyStage::Stage,
        path: destination.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent directory"),
    })?;

    let mut input = File::open(source).map_err(CopyError::at(CopyStage::Open, source))?;
    let metadata = input
        .metadata()
        .map_err(CopyError::at(CopyStage::Open, source))?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(directory)
        .map_err(CopyError::at(CopyStage::Stage, directory))?;
    debug!("Staging {} at {}", destination.display(), staged.path().display());

    let bytes_written = io::copy(&mut input, staged.as_file_mut())
        .map_err(CopyError::at(CopyStage::Write, destination))?;

    staged
        .as_file()
        .set_permissions(metadata.permissions())
        .map_err(CopyError::at(CopyStage::Permissions, destination))?;

    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_handle_times(staged.as_file(), Some(accessed), Some(modified))
        .map_err(CopyError::at(CopyStage::Timestamps, destination))?;

    staged
        .persist(destination)
        .map_err(|err| CopyError::at(CopyStage::Commit, destination)(err.error))?;

    Ok(bytes_written)
}
