//! Relative paths used as the comparison key between the two trees.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A path relative to a tree root, reduced to its normal components.
///
/// Two entries are equal iff their component sequences are equal, so
/// `a/./b` and `a/b` compare the same. The root itself has no components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativeEntry {
    path: PathBuf,
}

impl RelativeEntry {
    /// The entry naming the root of a tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build an entry from any relative path, dropping `.` components.
    ///
    /// Root, prefix and `..` components are discarded as well; callers only
    /// hand in paths produced by stripping a root prefix.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path
            .as_ref()
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        Self { path }
    }

    /// Express `path` relative to `root`, or `None` if it is not under it.
    pub fn from_root(root: &Path, path: &Path) -> Option<Self> {
        path.strip_prefix(root).ok().map(Self::new)
    }

    pub fn is_root(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Resolve this entry against a tree root.
    pub fn resolve(&self, root: &Path) -> PathBuf {
        if self.is_root() {
            root.to_path_buf()
        } else {
            root.join(&self.path)
        }
    }

    pub fn join(&self, name: impl AsRef<Path>) -> Self {
        let mut path = self.path.clone();
        path.push(name);
        Self::new(path)
    }

    /// Path components as display strings.
    pub fn components(&self) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
    }

    /// `true` if `self` is `ancestor` or lies beneath it.
    pub fn starts_with(&self, ancestor: &RelativeEntry) -> bool {
        self.path.starts_with(&ancestor.path)
    }
}

impl fmt::Display for RelativeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let parts: Vec<_> = self.components().collect();
        f.write_str(&parts.join("/"))
    }
}

impl Serialize for RelativeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
