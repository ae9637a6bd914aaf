//! Synchronization driver: one pass over the source tree.
//!
//! The driver snapshots the backup's directories, walks the source top-down,
//! creates missing backup directories, classifies and copies each file, and
//! folds every outcome into a [`ReportBuilder`]. Per-entry failures end up
//! in the report; only an unreadable root stops the run.

use crate::fs::entry::RelativeEntry;
use crate::fs::metadata::{BackupState, FileRecord};
use crate::fs::walker::{backup_directories, walk_directories, DirectoryListing, WalkOptions};
use crate::report::format::format_signed_bytes;
use crate::report::{FailureKind, Report, ReportBuilder};
use crate::sync::copy::{execute, CopyOutcome};
use crate::sync::decision::{decide, SyncAction};
use crate::utils::{MirrorError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Options for a mirror run
#[derive(Debug, Clone, Default)]
pub struct MirrorOptions {
    /// Applied to both the source walk and the backup snapshot
    pub walk: WalkOptions,
}

/// Mirrors a source tree into a backup tree
#[derive(Debug, Clone, Default)]
pub struct Mirror {
    options: MirrorOptions,
}

/// State threaded through one run
struct Pass<'a> {
    source: &'a Path,
    backup: &'a Path,
    existing: HashSet<RelativeEntry>,
    blocked: Vec<RelativeEntry>,
    report: ReportBuilder,
}

impl Mirror {
    pub fn new(options: MirrorOptions) -> Self {
        Self { options }
    }

    /// Run one synchronization pass.
    ///
    /// Both roots are expected to be validated already (see
    /// [`validate_roots`](crate::fs::validate_roots)). The backup root may be
    /// missing; it is then created and reported as a created directory.
    pub fn run(&self, source: &Path, backup: &Path) -> Result<Report> {
        let report = ReportBuilder::new(source, backup);
        info!(
            "Starting mirror run {}: {} -> {}",
            report.run_id(),
            source.display(),
            backup.display()
        );

        let existing = backup_directories(backup, &self.options.walk).map_err(|e| {
            error!("Cannot snapshot backup tree: {}", e);
            e
        })?;
        debug!("Backup tree has {} directories", existing.len());

        let mut pass = Pass {
            source,
            backup,
            existing,
            blocked: Vec::new(),
            report,
        };

        for listing in walk_directories(source, &self.options.walk) {
            match listing {
                Ok(listing) => pass.mirror_directory(listing),
                Err(failure) if failure.is_root() => {
                    error!("Cannot enumerate source tree: {}", failure);
                    return Err(MirrorError::RootEnumeration {
                        path: failure.path,
                        source: failure.error,
                    });
                }
                Err(failure) => {
                    warn!("Unreadable source entry {}", failure);
                    pass.report
                        .failed(failure.entry, FailureKind::Enumeration, failure.error);
                }
            }
        }

        let report = pass.report.finish();
        let counts = report.counts();
        info!(
            "Mirror run {} complete in {:?}: {} created dirs, {} transferred, {} updated, {} skipped, {} failed, {}",
            report.run_id(),
            report.elapsed(),
            counts.created_directories,
            counts.transferred,
            counts.updated,
            counts.skipped,
            counts.failed,
            format_signed_bytes(report.total_bytes_added()),
        );

        Ok(report)
    }
}

impl Pass<'_> {
    fn mirror_directory(&mut self, listing: DirectoryListing) {
        let DirectoryListing { entry, files, .. } = listing;

        if let Some(blocker) = self.blocked.iter().find(|b| entry.starts_with(b)) {
            let reason = format!("backup directory {} could not be created", blocker);
            for name in files {
                self.report
                    .failed(entry.join(name), FailureKind::DirectoryCreation, &reason);
            }
            return;
        }

        let target = entry.resolve(self.backup);
        if let Err(err) = fs::create_dir_all(&target) {
            warn!("Cannot create backup directory {}: {}", target.display(), err);
            let reason = format!("backup directory {} could not be created: {}", entry, err);
            for name in files {
                self.report
                    .failed(entry.join(name), FailureKind::DirectoryCreation, &reason);
            }
            self.report
                .failed(entry.clone(), FailureKind::DirectoryCreation, err);
            self.blocked.push(entry);
            return;
        }

        if !self.existing.contains(&entry) {
            debug!("Created backup directory {}", target.display());
            self.report.created_directory(entry.clone());
        }

        for name in files {
            self.mirror_file(entry.join(name));
        }
    }

    fn mirror_file(&mut self, entry: RelativeEntry) {
        let record = match FileRecord::capture(entry.clone(), self.source, self.backup) {
            Ok(record) => record,
            Err(err) => {
                warn!("Cannot stat source file {}: {}", entry, err);
                self.report.failed(entry, FailureKind::Metadata, err);
                return;
            }
        };

        let before = match BackupState::probe(&record.backup_path) {
            Ok(before) => before,
            Err(err) => {
                warn!("Cannot stat backup file {}: {}", record.backup_path.display(), err);
                self.report.failed(entry, FailureKind::Metadata, err);
                return;
            }
        };

        let action = decide(&record, before.as_ref());
        if action == SyncAction::Skip {
            debug!("Unchanged: {}", entry);
            self.report.skipped(entry);
            return;
        }

        match execute(action, &record, before.as_ref()) {
            CopyOutcome::Succeeded {
                bytes_written,
                bytes_delta,
            } => match action {
                SyncAction::Update => self.report.updated(entry, bytes_written, bytes_delta),
                _ => self.report.transferred(entry, bytes_written, bytes_delta),
            },
            CopyOutcome::Failed(err) => {
                warn!("Copy failed for {}: {}", entry, err);
                self.report.failed(entry, FailureKind::Copy, err);
            }
        }
    }
}
