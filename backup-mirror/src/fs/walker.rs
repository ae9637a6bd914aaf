//! Directory traversal for the source and backup trees.
//!
//! The walk is grouped per directory: each item is a directory (the root
//! included) together with the names of the files it directly contains.
//! Unreadable entries are surfaced as [`WalkFailure`]s without stopping the
//! rest of the walk.

use crate::fs::entry::RelativeEntry;
use crate::utils::{MirrorError, Result};
use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow symbolic links
    pub follow_links: bool,

    /// Entry names containing any of these substrings are not listed
    pub exclude_patterns: Vec<String>,
}

/// One directory and the files it directly contains
#[derive(Debug, Clone)]
pub struct DirectoryListing {
    /// Directory relative to the walk root
    pub entry: RelativeEntry,

    /// Full path to the directory
    pub path: PathBuf,

    /// Names of the regular files (or links to files) inside it
    pub files: Vec<OsString>,

    /// Names of links resolving to directories; these are not descended into
    pub linked_dirs: Vec<OsString>,
}

/// An entry that could not be read during the walk
#[derive(Debug)]
pub struct WalkFailure {
    pub entry: RelativeEntry,
    pub path: PathBuf,
    pub error: io::Error,
    depth: usize,
}

impl WalkFailure {
    /// The walk root itself could not be read; nothing below it was visited.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }
}

impl fmt::Display for WalkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Lazy per-directory walk, see [`walk_directories`]
pub struct DirectoryWalk {
    root: PathBuf,
    inner: walkdir::IntoIter,
    exclude_patterns: Vec<String>,
    pending: Option<DirectoryListing>,
    ready: VecDeque<std::result::Result<DirectoryListing, WalkFailure>>,
}

/// Walk every directory under `root`, parents before children.
///
/// Names are visited in sorted order and the files of a directory are
/// listed before any of its subdirectories is entered, so a listing is
/// complete as soon as the next directory shows up.
///
/// # Example
/// ```no_run
/// use backup_mirror::fs::walker::{walk_directories, WalkOptions};
/// use std::path::Path;
///
/// for listing in walk_directories(Path::new("/data"), &WalkOptions::default()) {
///     match listing {
///         Ok(dir) => println!("{}: {} files", dir.entry, dir.files.len()),
///         Err(failure) => eprintln!("unreadable: {failure}"),
///     }
/// }
/// ```
pub fn walk_directories(root: &Path, options: &WalkOptions) -> DirectoryWalk {
    let inner = WalkDir::new(root)
        .follow_links(options.follow_links)
        .sort_by(|a, b| {
            a.file_type()
                .is_dir()
                .cmp(&b.file_type().is_dir())
                .then_with(|| a.file_name().cmp(b.file_name()))
        })
        .into_iter();

    DirectoryWalk {
        root: root.to_path_buf(),
        inner,
        exclude_patterns: options.exclude_patterns.clone(),
        pending: None,
        ready: VecDeque::new(),
    }
}

impl DirectoryWalk {
    fn visit(&mut self, entry: DirEntry) {
        if entry.depth() > 0 && self.is_excluded(&entry) {
            if entry.file_type().is_dir() {
                self.inner.skip_current_dir();
            }
            return;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            if let Some(done) = self.pending.take() {
                self.ready.push_back(Ok(done));
            }
            self.pending = Some(DirectoryListing {
                entry: self.relative(entry.path()),
                path: entry.path().to_path_buf(),
                files: Vec::new(),
                linked_dirs: Vec::new(),
            });
        } else if entry.depth() == 0 {
            self.push_failure(
                entry.path(),
                0,
                io::Error::other("walk root is not a directory"),
            );
        } else if file_type.is_file() {
            self.push_file(entry);
        } else if file_type.is_symlink() {
            // Only reached without follow_links: resolve to decide.
            match std::fs::metadata(entry.path()) {
                Ok(target) if target.is_dir() => {
                    debug!("Skipping link to directory: {}", entry.path().display());
                    self.push_linked_dir(entry);
                }
                Ok(target) if target.is_file() => self.push_file(entry),
                Ok(_) => {
                    debug!("Skipping link to special file: {}", entry.path().display());
                }
                Err(err) => self.push_failure(entry.path(), entry.depth(), err),
            }
        } else {
            debug!("Skipping special file: {}", entry.path().display());
        }
    }

    fn push_file(&mut self, entry: DirEntry) {
        match self.pending.as_mut() {
            Some(listing) if entry.path().parent() == Some(listing.path.as_path()) => {
                listing.files.push(entry.file_name().to_os_string());
            }
            _ => debug!("File outside current listing: {}", entry.path().display()),
        }
    }

    fn push_linked_dir(&mut self, entry: DirEntry) {
        if let Some(listing) = self.pending.as_mut() {
            if entry.path().parent() == Some(listing.path.as_path()) {
                listing.linked_dirs.push(entry.file_name().to_os_string());
            }
        }
    }

    fn fail(&mut self, err: walkdir::Error) {
        let depth = err.depth();
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        // The directory's own entry came first; its listing is now void.
        if self.pending.as_ref().map(|p| p.path == path).unwrap_or(false) {
            self.pending = None;
        }

        let message = err.to_string();
        let error = err
            .into_io_error()
            .unwrap_or_else(|| io::Error::other(message));
        self.push_failure(&path, depth, error);
    }

    fn push_failure(&mut self, path: &Path, depth: usize, error: io::Error) {
        self.ready.push_back(Err(WalkFailure {
            entry: self.relative(path),
            path: path.to_path_buf(),
            error,
            depth,
        }));
    }

    fn relative(&self, path: &Path) -> RelativeEntry {
        RelativeEntry::from_root(&self.root, path).unwrap_or_default()
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let file_name = entry.file_name().to_string_lossy();
        self.exclude_patterns
            .iter()
            .any(|pattern| file_name.contains(pattern.as_str()))
    }
}

impl Iterator for DirectoryWalk {
    type Item = std::result::Result<DirectoryListing, WalkFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            match self.inner.next() {
                Some(Ok(entry)) => self.visit(entry),
                Some(Err(err)) => self.fail(err),
                None => return self.pending.take().map(Ok),
            }
        }
    }
}

/// Snapshot the set of directories present under `root`.
///
/// A missing root yields an empty set. Any other failure to read the root is
/// returned as an error. A directory that exists but cannot be listed is
/// still part of the snapshot; only what lies below it is left out. Links
/// resolving to directories count as directories.
pub fn backup_directories(root: &Path, options: &WalkOptions) -> Result<HashSet<RelativeEntry>> {
    match std::fs::symlink_metadata(root) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        _ => {}
    }

    let mut directories = HashSet::new();
    for listing in walk_directories(root, options) {
        match listing {
            Ok(listing) => {
                for name in &listing.linked_dirs {
                    directories.insert(listing.entry.join(name));
                }
                directories.insert(listing.entry);
            }
            Err(failure) if failure.is_root() => {
                return Err(MirrorError::RootEnumeration {
                    path: failure.path,
                    source: failure.error,
                });
            }
            Err(failure) => {
                warn!("Backup snapshot incomplete, {}", failure);
                record_unlisted(&mut directories, failure);
            }
        }
    }

    Ok(directories)
}

/// Keep a directory the walk saw but could not read.
fn record_unlisted(directories: &mut HashSet<RelativeEntry>, failure: WalkFailure) {
    let is_dir = std::fs::symlink_metadata(&failure.path)
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if is_dir {
        directories.insert(failure.entry);
    }
}
