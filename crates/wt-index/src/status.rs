//! Working directory status types.
//!
//! A [`WorkdirStatus`] combines a classification against the current
//! snapshot with the untracked and ignored path sets.

use serde::Serialize;

use crate::classify::{ChangeKind, ChangeSet};

/// Complete status of the working directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkdirStatus {
    /// Paths that differ from the snapshot, in path order.
    pub changes: Vec<StatusEntry>,
    /// Trackable files not in the index.
    pub untracked: Vec<String>,
    /// Files hidden by ignore rules.
    pub ignored: Vec<String>,
}

impl WorkdirStatus {
    /// Create an empty status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a status from its parts.
    pub fn from_parts(
        changes: &ChangeSet,
        untracked: impl IntoIterator<Item = String>,
        ignored: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            changes: changes
                .iter()
                .map(|r| StatusEntry::new(&r.path, r.kind()))
                .collect(),
            untracked: untracked.into_iter().collect(),
            ignored: ignored.into_iter().collect(),
        }
    }

    /// Returns `true` if nothing differs from the snapshot and nothing is
    /// untracked. Ignored files do not count.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty() && self.untracked.is_empty()
    }

    /// Paths with a given kind of change.
    pub fn paths(&self, kind: ChangeKind) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(move |e| e.status == kind)
            .map(|e| e.path.as_str())
    }
}

/// A single status entry representing a file change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// The file path relative to the working root.
    pub path: String,
    /// The kind of change.
    pub status: ChangeKind,
}

impl StatusEntry {
    /// Create a new status entry.
    pub fn new(path: impl Into<String>, status: ChangeKind) -> Self {
        Self {
            path: path.into(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::partition;
    use crate::ignore::IgnoreFilter;
    use wt_store::{Blob, Entry, EntryMode, FlatTree};

    #[test]
    fn empty_status_is_clean() {
        let status = WorkdirStatus::new();
        assert!(status.is_clean());
    }

    #[test]
    fn ignored_files_do_not_dirty_status() {
        let status = WorkdirStatus::from_parts(&ChangeSet::new(), Vec::new(), vec!["x.log".into()]);
        assert!(status.is_clean());
    }

    #[test]
    fn untracked_files_dirty_status() {
        let status = WorkdirStatus::from_parts(&ChangeSet::new(), vec!["new.txt".into()], Vec::new());
        assert!(!status.is_clean());
    }

    #[test]
    fn changes_carry_their_kind() {
        let mut old = FlatTree::new();
        old.insert(
            "a.txt".into(),
            Entry::new("a.txt", EntryMode::Regular, Blob::id_of(b"1")),
        );
        let new = FlatTree::new();
        let changes = partition(&old, &new, &IgnoreFilter::default());
        let status = WorkdirStatus::from_parts(&changes, Vec::new(), Vec::new());
        assert_eq!(status.changes, vec![StatusEntry::new("a.txt", ChangeKind::Removed)]);
        assert_eq!(status.paths(ChangeKind::Removed).collect::<Vec<_>>(), vec!["a.txt"]);
        assert!(!status.is_clean());
    }
}
