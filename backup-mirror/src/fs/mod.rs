//! Filesystem access: tree walking, metadata and root validation.

pub mod entry;
pub mod metadata;
pub mod roots;
pub mod walker;

pub use entry::RelativeEntry;
pub use metadata::{BackupState, FileRecord};
pub use roots::{validate_roots, SyncRoots};
pub use walker::{backup_directories, walk_directories, DirectoryListing, WalkFailure, WalkOptions};
