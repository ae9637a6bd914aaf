//! Per-file classification: does the backup need this file?
//!
//! Only presence and modification time are compared. A file whose content
//! changed without advancing its modification time is classified `Skip`.

use crate::fs::metadata::{BackupState, FileRecord};

/// What the mirror has to do with one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// No backup entry exists yet
    Create,
    /// The backup entry is strictly older than the source
    Update,
    /// The backup entry is as new as the source, or newer
    Skip,
}

impl SyncAction {
    pub fn requires_copy(self) -> bool {
        !matches!(self, SyncAction::Skip)
    }
}

/// Classify a source file against the current backup entry.
///
/// Equal timestamps resolve to `Skip`, which also absorbs filesystems with
/// coarser timestamp resolution on the backup side.
pub fn decide(record: &FileRecord, backup: Option<&BackupState>) -> SyncAction {
    match backup {
        None => SyncAction::Create,
        Some(state) if record.modified > state.modified => SyncAction::Update,
        Some(_) => SyncAction::Skip,
    }
}
