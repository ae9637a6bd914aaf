//! File metadata captured while mirroring.
//!
//! A [`FileRecord`] is the source-side view of one file at the moment the
//! driver visits it; a [`BackupState`] is what already sits at the backup
//! path, if anything.

use crate::fs::entry::RelativeEntry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Source file as seen when the driver reaches it
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Path relative to both roots
    pub entry: RelativeEntry,

    /// Full path under the source root
    pub source_path: PathBuf,

    /// Full path under the backup root
    pub backup_path: PathBuf,

    /// Source size in bytes
    pub size: u64,

    /// Source modification time
    pub modified: SystemTime,
}

impl FileRecord {
    /// Stat the source file for `entry` and pair it with its backup path.
    ///
    /// Links are followed, so a link to a file records the target's size and
    /// modification time.
    pub fn capture(entry: RelativeEntry, source_root: &Path, backup_root: &Path) -> io::Result<Self> {
        let source_path = entry.resolve(source_root);
        let backup_path = entry.resolve(backup_root);
        let metadata = fs::metadata(&source_path)?;

        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified()?,
            entry,
            source_path,
            backup_path,
        })
    }
}

/// Metadata of an existing backup entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupState {
    /// Size in bytes before this run touches it
    pub size: u64,

    /// Last modified time
    pub modified: SystemTime,
}

impl BackupState {
    /// Look at the backup path; `Ok(None)` when nothing is there.
    pub fn probe(path: &Path) -> io::Result<Option<Self>> {
        match fs::metadata(path) {
            Ok(metadata) => Ok(Some(Self {
                size: metadata.len(),
                modified: metadata.modified()?,
            })),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}
