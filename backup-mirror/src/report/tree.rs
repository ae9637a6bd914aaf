//! Hierarchical grouping of report paths for display.

use crate::fs::entry::RelativeEntry;
use serde::Serialize;
use std::collections::BTreeMap;

/// A node in a path tree; children are keyed by path component and kept in
/// lexicographic order at every level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PathTree {
    children: BTreeMap<String, PathTree>,
}

impl PathTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a RelativeEntry>,
    {
        let mut tree = Self::new();
        for entry in entries {
            tree.insert(entry);
        }
        tree
    }

    /// Insert an entry, creating intermediate nodes. The root entry is kept
    /// as a `.` node.
    pub fn insert(&mut self, entry: &RelativeEntry) {
        if entry.is_root() {
            self.children.entry(".".to_string()).or_default();
            return;
        }
        let mut node = self;
        for component in entry.components() {
            node = node.children.entry(component.into_owned()).or_default();
        }
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &PathTree)> {
        self.children.iter().map(|(name, child)| (name.as_str(), child))
    }

    pub fn get(&self, name: &str) -> Option<&PathTree> {
        self.children.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaf nodes below this one
    pub fn leaf_count(&self) -> usize {
        self.children
            .values()
            .map(|child| if child.is_empty() { 1 } else { child.leaf_count() })
            .sum()
    }

    /// Render as indented lines, two spaces per level, inner nodes with a
    /// trailing `/`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        for (name, child) in &self.children {
            out.push_str(&"  ".repeat(depth));
            out.push_str(name);
            if !child.is_empty() {
                out.push('/');
            }
            out.push('\n');
            child.render_into(out, depth + 1);
        }
    }
}
