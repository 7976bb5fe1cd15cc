//! Three-way change classification of the working directory against a
//! recorded snapshot.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};
use wt_store::{flatten_tree, Entry, FlatTree, ObjectStore, StoreError};
use wt_types::ObjectId;

use crate::error::{IndexError, IndexResult};
use crate::ignore::IgnoreFilter;
use crate::scan::PathScanner;

/// Which sides of a comparison a path exists on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChangePattern {
    pub exists_old: bool,
    pub exists_new: bool,
}

/// The kind of difference for one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

impl ChangePattern {
    /// Pattern for a pair of optional entries.
    pub fn of(old: Option<&Entry>, new: Option<&Entry>) -> Self {
        Self {
            exists_old: old.is_some(),
            exists_new: new.is_some(),
        }
    }

    /// Classify the pattern. Present on both sides with the same content is
    /// unchanged (`None`), as is absent on both.
    pub fn kind(&self, same_content: bool) -> Option<ChangeKind> {
        match (self.exists_old, self.exists_new) {
            (false, true) => Some(ChangeKind::Added),
            (true, false) => Some(ChangeKind::Removed),
            (true, true) if !same_content => Some(ChangeKind::Modified),
            _ => None,
        }
    }
}

/// One differing path with its entry on each side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: String,
    pub old: Option<Entry>,
    pub new: Option<Entry>,
}

impl ChangeRecord {
    /// Which sides the path exists on.
    pub fn pattern(&self) -> ChangePattern {
        ChangePattern::of(self.old.as_ref(), self.new.as_ref())
    }

    /// The kind of change this record describes.
    pub fn kind(&self) -> ChangeKind {
        let same = match (&self.old, &self.new) {
            (Some(old), Some(new)) => old.object_id == new.object_id,
            _ => false,
        };
        self.pattern().kind(same).unwrap_or(ChangeKind::Modified)
    }
}

/// Result of a classification, keyed by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    records: BTreeMap<String, ChangeRecord>,
    skipped: BTreeSet<String>,
}

impl ChangeSet {
    /// An empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of changed paths.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Record for `path`, if it changed.
    pub fn get(&self, path: &str) -> Option<&ChangeRecord> {
        self.records.get(path)
    }

    /// All records in path order.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    /// Records of one kind, in path order.
    pub fn of_kind(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values().filter(move |r| r.kind() == kind)
    }

    /// Paths of one kind.
    pub fn paths(&self, kind: ChangeKind) -> BTreeSet<String> {
        self.of_kind(kind).map(|r| r.path.clone()).collect()
    }

    pub fn added(&self) -> BTreeSet<String> {
        self.paths(ChangeKind::Added)
    }

    pub fn removed(&self) -> BTreeSet<String> {
        self.paths(ChangeKind::Removed)
    }

    pub fn modified(&self) -> BTreeSet<String> {
        self.paths(ChangeKind::Modified)
    }

    /// Working paths that could not be read and were left out.
    pub fn skipped(&self) -> &BTreeSet<String> {
        &self.skipped
    }
}

impl IntoIterator for ChangeSet {
    type Item = ChangeRecord;
    type IntoIter = std::collections::btree_map::IntoValues<String, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

/// Compare two flattened file maps.
///
/// Paths matched by `filter` are dropped from every partition. Content ids
/// decide equality; a mode change alone is not a modification.
pub fn partition(old: &FlatTree, new: &FlatTree, filter: &IgnoreFilter) -> ChangeSet {
    let mut records = BTreeMap::new();
    let paths: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    for path in paths {
        let (o, n) = (old.get(path), new.get(path));
        let same = matches!((o, n), (Some(a), Some(b)) if a.object_id == b.object_id);
        if ChangePattern::of(o, n).kind(same).is_none() || filter.is_ignored(path) {
            continue;
        }
        records.insert(
            path.clone(),
            ChangeRecord {
                path: path.clone(),
                old: o.cloned(),
                new: n.cloned(),
            },
        );
    }

    ChangeSet {
        records,
        skipped: BTreeSet::new(),
    }
}

/// Classifies working files against a recorded commit.
pub struct ChangeClassifier<'a> {
    scanner: &'a PathScanner,
    store: &'a dyn ObjectStore,
    max_depth: usize,
}

impl<'a> ChangeClassifier<'a> {
    pub fn new(scanner: &'a PathScanner, store: &'a dyn ObjectStore, max_depth: usize) -> Self {
        Self {
            scanner,
            store,
            max_depth,
        }
    }

    /// Hash every trackable file. Unreadable files are logged and returned
    /// separately.
    pub fn working_entries(&self) -> (FlatTree, BTreeSet<String>) {
        let mut entries = FlatTree::new();
        let mut skipped = BTreeSet::new();
        for path in self.scanner.trackable_files() {
            match self.scanner.hash_file(&path) {
                Ok(entry) => {
                    entries.insert(path, entry);
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "skipping unreadable file");
                    skipped.insert(path);
                }
            }
        }
        (entries, skipped)
    }

    /// Flattened files of the commit `base`.
    pub fn base_entries(&self, base: &ObjectId) -> IndexResult<FlatTree> {
        let commit = self.store.read_commit(base).map_err(|e| match e {
            StoreError::NotFound(id) => IndexError::MissingSnapshot(id),
            other => other.into(),
        })?;
        flatten_tree(self.store, &commit.tree, self.max_depth).map_err(|e| match e {
            StoreError::NotFound(id) => IndexError::MissingSnapshot(id),
            other => other.into(),
        })
    }

    /// Classify the working directory against the commit `base`.
    ///
    /// `None` means the repository has no commits yet; the result is then
    /// empty rather than reporting every file as added.
    pub fn classify(&self, base: Option<&ObjectId>) -> IndexResult<ChangeSet> {
        let Some(base) = base else {
            debug!("no base commit, nothing to classify against");
            return Ok(ChangeSet::new());
        };

        let mut old = self.base_entries(base)?;
        let (new, skipped) = self.working_entries();
        old.retain(|path, _| !skipped.contains(path));

        let mut changes = partition(&old, &new, self.scanner.filter());
        changes.skipped = skipped;
        debug!(
            base = %base.short_hex(),
            added = changes.added().len(),
            removed = changes.removed().len(),
            modified = changes.modified().len(),
            "classified working directory"
        );
        Ok(changes)
    }
}
