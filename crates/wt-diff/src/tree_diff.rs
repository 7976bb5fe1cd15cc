//! Tree-level diff: pair the files of two trees by path.
//!
//! Both trees are flattened to full relative paths first, so changes come
//! out in lexicographic path order. Entries whose content id matches on
//! both sides are skipped, including when only the mode differs.

use std::collections::BTreeSet;

use wt_index::ChangeKind;
use wt_store::{flatten_tree, Entry, FlatTree, ObjectStore};
use wt_types::ObjectId;

use crate::error::{DiffError, DiffResult};

/// The result of comparing two trees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeDiff {
    /// Changes in path order.
    pub changes: Vec<TreeChange>,
}

impl TreeDiff {
    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// A single path that differs between two trees.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeChange {
    Added { new: Entry },
    Removed { old: Entry },
    Modified { old: Entry, new: Entry },
}

impl TreeChange {
    /// The path this change applies to.
    pub fn path(&self) -> &str {
        match self {
            TreeChange::Added { new } => &new.path,
            TreeChange::Removed { old } => &old.path,
            TreeChange::Modified { new, .. } => &new.path,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            TreeChange::Added { .. } => ChangeKind::Added,
            TreeChange::Removed { .. } => ChangeKind::Removed,
            TreeChange::Modified { .. } => ChangeKind::Modified,
        }
    }

    /// Content id on the old side, if any.
    pub fn old_id(&self) -> Option<ObjectId> {
        match self {
            TreeChange::Removed { old } | TreeChange::Modified { old, .. } => Some(old.object_id),
            TreeChange::Added { .. } => None,
        }
    }

    /// Content id on the new side, if any.
    pub fn new_id(&self) -> Option<ObjectId> {
        match self {
            TreeChange::Added { new } | TreeChange::Modified { new, .. } => Some(new.object_id),
            TreeChange::Removed { .. } => None,
        }
    }
}

/// Compare two flattened file maps.
pub fn diff_flat(old: &FlatTree, new: &FlatTree) -> TreeDiff {
    let paths: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
    let changes = paths
        .into_iter()
        .filter_map(|path| match (old.get(path), new.get(path)) {
            (Some(o), Some(n)) if o.object_id != n.object_id => Some(TreeChange::Modified {
                old: o.clone(),
                new: n.clone(),
            }),
            (Some(o), None) => Some(TreeChange::Removed { old: o.clone() }),
            (None, Some(n)) => Some(TreeChange::Added { new: n.clone() }),
            _ => None,
        })
        .collect();
    TreeDiff { changes }
}

/// Compare two trees from the store. `None` on the old side is an empty tree.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: &ObjectId,
    max_depth: usize,
) -> DiffResult<TreeDiff> {
    let old = match old_tree {
        Some(id) => flatten_tree(store, id, max_depth).map_err(DiffError::from_store)?,
        None => FlatTree::new(),
    };
    let new = flatten_tree(store, new_tree, max_depth).map_err(DiffError::from_store)?;
    Ok(diff_flat(&old, &new))
}
