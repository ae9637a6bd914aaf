//! The account of one mirror run.
//!
//! A [`ReportBuilder`] is appended to while the driver walks the source
//! tree, then frozen into a [`Report`] that presentation code can query by
//! category, as flat lists or as [`PathTree`]s.

pub mod format;
pub mod render;
pub mod tree;

use crate::fs::entry::RelativeEntry;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub use tree::PathTree;

/// Why an entry ended up in the failed list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A directory or link below the root could not be read
    Enumeration,
    /// A file could not be statted
    Metadata,
    /// Content, metadata or rename step of a copy failed
    Copy,
    /// The backup directory for this entry could not be created
    DirectoryCreation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Enumeration => "enumeration",
            FailureKind::Metadata => "metadata",
            FailureKind::Copy => "copy",
            FailureKind::DirectoryCreation => "directory creation",
        };
        f.write_str(name)
    }
}

/// A failed entry with its retained cause
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    pub entry: RelativeEntry,
    pub kind: FailureKind,
    pub reason: String,
}

/// The report lists, for per-category queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    CreatedDirectories,
    Transferred,
    Updated,
    Skipped,
    Failed,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::CreatedDirectories,
        Category::Transferred,
        Category::Updated,
        Category::Skipped,
        Category::Failed,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Category::CreatedDirectories => "Created directories",
            Category::Transferred => "Transferred files",
            Category::Updated => "Updated files",
            Category::Skipped => "Skipped files",
            Category::Failed => "Failed entries",
        }
    }
}

/// Totals per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub created_directories: usize,
    pub transferred: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Immutable result of one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    run_id: Uuid,
    source: PathBuf,
    backup: PathBuf,
    started_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_secs")]
    elapsed: Duration,
    total_bytes_added: i64,
    bytes_copied: u64,
    created_directories: BTreeSet<RelativeEntry>,
    transferred: Vec<RelativeEntry>,
    updated: Vec<RelativeEntry>,
    skipped: Vec<RelativeEntry>,
    failed: Vec<FailedEntry>,
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

impl Report {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn backup(&self) -> &Path {
        &self.backup
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Net change of the backup tree's size; negative when updates shrank files
    pub fn total_bytes_added(&self) -> i64 {
        self.total_bytes_added
    }

    /// Bytes written by successful copies
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied
    }

    pub fn created_directories(&self) -> &BTreeSet<RelativeEntry> {
        &self.created_directories
    }

    pub fn transferred(&self) -> &[RelativeEntry] {
        &self.transferred
    }

    pub fn updated(&self) -> &[RelativeEntry] {
        &self.updated
    }

    pub fn skipped(&self) -> &[RelativeEntry] {
        &self.skipped
    }

    /// Failed entries. Besides files this holds directories that could not
    /// be read (`Enumeration`) or created (`DirectoryCreation`).
    pub fn failed(&self) -> &[FailedEntry] {
        &self.failed
    }

    /// Entries of one category, in the order they were recorded
    pub fn entries(&self, category: Category) -> Vec<&RelativeEntry> {
        match category {
            Category::CreatedDirectories => self.created_directories.iter().collect(),
            Category::Transferred => self.transferred.iter().collect(),
            Category::Updated => self.updated.iter().collect(),
            Category::Skipped => self.skipped.iter().collect(),
            Category::Failed => self.failed.iter().map(|f| &f.entry).collect(),
        }
    }

    /// Entries of one category grouped by path prefix
    pub fn tree(&self, category: Category) -> PathTree {
        PathTree::from_entries(self.entries(category))
    }

    pub fn counts(&self) -> ReportCounts {
        ReportCounts {
            created_directories: self.created_directories.len(),
            transferred: self.transferred.len(),
            updated: self.updated.len(),
            skipped: self.skipped.len(),
            failed: self.failed.len(),
        }
    }

    /// `true` when nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// The file category an entry was recorded under, if any
    pub fn category_of(&self, entry: &RelativeEntry) -> Option<Category> {
        [
            Category::Transferred,
            Category::Updated,
            Category::Skipped,
            Category::Failed,
        ]
        .into_iter()
        .find(|category| self.entries(*category).contains(&entry))
    }
}

/// Append-only accumulator the driver fills during a walk
#[derive(Debug)]
pub struct ReportBuilder {
    run_id: Uuid,
    source: PathBuf,
    backup: PathBuf,
    started_at: DateTime<Utc>,
    started: Instant,
    total_bytes_added: i64,
    bytes_copied: u64,
    created_directories: BTreeSet<RelativeEntry>,
    transferred: Vec<RelativeEntry>,
    updated: Vec<RelativeEntry>,
    skipped: Vec<RelativeEntry>,
    failed: Vec<FailedEntry>,
}

impl ReportBuilder {
    /// Start a report; the elapsed clock starts now.
    pub fn new(source: &Path, backup: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.to_path_buf(),
            backup: backup.to_path_buf(),
            started_at: Utc::now(),
            started: Instant::now(),
            total_bytes_added: 0,
            bytes_copied: 0,
            created_directories: BTreeSet::new(),
            transferred: Vec::new(),
            updated: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn created_directory(&mut self, entry: RelativeEntry) {
        self.created_directories.insert(entry);
    }

    pub fn transferred(&mut self, entry: RelativeEntry, bytes_written: u64, bytes_delta: i64) {
        self.add_bytes(bytes_written, bytes_delta);
        self.transferred.push(entry);
    }

    pub fn updated(&mut self, entry: RelativeEntry, bytes_written: u64, bytes_delta: i64) {
        self.add_bytes(bytes_written, bytes_delta);
        self.updated.push(entry);
    }

    pub fn skipped(&mut self, entry: RelativeEntry) {
        self.skipped.push(entry);
    }

    pub fn failed(&mut self, entry: RelativeEntry, kind: FailureKind, reason: impl fmt::Display) {
        self.failed.push(FailedEntry {
            entry,
            kind,
            reason: reason.to_string(),
        });
    }

    fn add_bytes(&mut self, bytes_written: u64, bytes_delta: i64) {
        self.bytes_copied = self.bytes_copied.saturating_add(bytes_written);
        self.total_bytes_added = self.total_bytes_added.saturating_add(bytes_delta);
    }

    /// Stamp the elapsed time and freeze.
    pub fn finish(self) -> Report {
        Report {
            run_id: self.run_id,
            source: self.source,
            backup: self.backup,
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
            total_bytes_added: self.total_bytes_added,
            bytes_copied: self.bytes_copied,
            created_directories: self.created_directories,
            transferred: self.transferred,
            updated: self.updated,
            skipped: self.skipped,
            failed: self.failed,
        }
    }
}
