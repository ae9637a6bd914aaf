//! The synchronization engine: classification, copying and the driver that
//! ties them to a tree walk.

pub mod copy;
pub mod decision;
pub mod driver;

pub use copy::{execute, CopyError, CopyOutcome, CopyStage};
pub use decision::{decide, SyncAction};
pub use driver::{Mirror, MirrorOptions};

use crate::report::Report;
use crate::utils::Result;
use std::path::Path;

/// Mirror `source` into `backup` with default options.
pub fn run(source: &Path, backup: &Path) -> Result<Report> {
    Mirror::default().run(source, backup)
}
