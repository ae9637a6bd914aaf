//! Backup Mirror Library
//!
//! Mirrors a source directory tree into a backup tree, copying only files
//! that are missing or stale in the backup, and reports every action taken.

pub mod config;
pub mod fs;
pub mod report;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use fs::{validate_roots, RelativeEntry, SyncRoots};
pub use report::{Category, FailedEntry, FailureKind, Report};
pub use sync::{Mirror, MirrorOptions, SyncAction};
pub use utils::errors::MirrorError;
pub type Result<T> = std::result::Result<T, MirrorError>;
