//! Conversions between nested trees and flat path-keyed entry maps.

use std::collections::BTreeMap;

use tracing::trace;
use wt_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{Entry, EntryMode, Tree, TreeEntry};
use crate::traits::ObjectStore;

/// Files of a tree keyed by full relative path, in lexicographic order.
pub type FlatTree = BTreeMap<String, Entry>;

/// Flatten the tree `root` into its files.
///
/// Subtrees are walked iteratively; directory entries themselves never show
/// up in the result. A subtree nested more than `max_depth` levels below the
/// root fails with [`StoreError::DepthExceeded`] instead of being truncated.
pub fn flatten_tree(
    store: &dyn ObjectStore,
    root: &ObjectId,
    max_depth: usize,
) -> StoreResult<FlatTree> {
    let mut files = FlatTree::new();
    let mut pending: Vec<(String, ObjectId, usize)> = vec![(String::new(), *root, 0)];

    while let Some((prefix, tree_id, depth)) = pending.pop() {
        let tree = store.read_tree(&tree_id)?;
        for entry in tree.entries {
            let path = if prefix.is_empty() {
                entry.name
            } else {
                format!("{prefix}/{}", entry.name)
            };
            if entry.mode.is_directory() {
                if depth + 1 > max_depth {
                    return Err(StoreError::DepthExceeded { path, max_depth });
                }
                pending.push((path, entry.object_id, depth + 1));
            } else {
                files.insert(path.clone(), Entry::new(path, entry.mode, entry.object_id));
            }
        }
    }

    trace!(root = %root.short_hex(), files = files.len(), "flattened tree");
    Ok(files)
}

enum Node {
    File(EntryMode, ObjectId),
    Dir(BTreeMap<String, Node>),
}

/// Write nested tree objects for `entries` and return the root tree id.
///
/// Paths are split on `/`; intermediate directories get
/// [`EntryMode::Directory`] entries. A path used both as a file and as a
/// directory fails with [`StoreError::PathConflict`].
pub fn build_tree<'a>(
    store: &dyn ObjectStore,
    entries: impl IntoIterator<Item = &'a Entry>,
) -> StoreResult<ObjectId> {
    let mut root: BTreeMap<String, Node> = BTreeMap::new();

    for entry in entries {
        let mut segments: Vec<&str> = entry.path.split('/').filter(|s| !s.is_empty()).collect();
        let Some(name) = segments.pop() else {
            return Err(StoreError::PathConflict(entry.path.clone()));
        };

        let mut level = &mut root;
        for segment in segments {
            let node = level
                .entry(segment.to_string())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
            level = match node {
                Node::Dir(children) => children,
                Node::File(..) => return Err(StoreError::PathConflict(entry.path.clone())),
            };
        }
        if let Some(Node::Dir(_)) = level.get(name) {
            return Err(StoreError::PathConflict(entry.path.clone()));
        }
        level.insert(name.to_string(), Node::File(entry.mode, entry.object_id));
    }

    write_level(store, root)
}

fn write_level(store: &dyn ObjectStore, level: BTreeMap<String, Node>) -> StoreResult<ObjectId> {
    let mut tree_entries = Vec::with_capacity(level.len());
    for (name, node) in level {
        let entry = match node {
            Node::File(mode, id) => TreeEntry::new(mode, name, id),
            Node::Dir(children) => {
                TreeEntry::new(EntryMode::Directory, name, write_level(store, children)?)
            }
        };
        tree_entries.push(entry);
    }
    store.write_tree(&Tree::new(tree_entries))
}
