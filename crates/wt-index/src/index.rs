//! The staging index.
//!
//! The [`Index`] is the in-memory set of tracked paths. It is seeded from a
//! recorded tree, updated by staging file contents, and turned back into
//! nested tree objects when a snapshot is taken.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;
use wt_store::{build_tree, flatten_tree, EntryMode, ObjectStore};
use wt_types::ObjectId;

use crate::entry::IndexEntry;
use crate::error::{IndexError, IndexResult};
use crate::scan::DEFAULT_MAX_DEPTH;

/// Tracked paths and the content staged for each.
pub struct Index {
    entries: BTreeMap<String, IndexEntry>,
    /// Root tree id for the current entries, invalidated on change.
    tree_cache: Option<ObjectId>,
    max_depth: usize,
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("entries", &self.entries.len())
            .field("tree_cache", &self.tree_cache)
            .finish()
    }
}

fn validate_path(path: &str) -> IndexResult<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(IndexError::InvalidPath(path.to_string()));
    }
    Ok(())
}

impl Index {
    /// Create a new empty index backed by the given store.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            entries: BTreeMap::new(),
            tree_cache: None,
            max_depth: DEFAULT_MAX_DEPTH,
            store,
        }
    }

    /// Limit tree nesting accepted by [`Index::read_tree`].
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by path.
    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.get(path)
    }

    /// All entries in path order.
    pub fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    /// Every tracked path.
    pub fn paths(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// Paths staged in this session.
    pub fn staged_paths(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .filter(|e| e.staged)
            .map(|e| e.path.clone())
            .collect()
    }

    // ---------------------------------------------------------------
    // Stage operations
    // ---------------------------------------------------------------

    /// Store `content` as a blob and stage it at `path`.
    pub fn stage_file(&mut self, path: &str, content: &[u8], mode: EntryMode) -> IndexResult<ObjectId> {
        validate_path(path)?;
        if mode.is_directory() {
            return Err(IndexError::InvalidPath(format!("{path} (directory mode)")));
        }
        let object_id = self.store.write_blob(content)?;
        self.entries.insert(
            path.to_string(),
            IndexEntry::new_staged(path, object_id, mode, content.len() as u64),
        );
        self.tree_cache = None;
        Ok(object_id)
    }

    /// Stop tracking `path`.
    pub fn remove(&mut self, path: &str) -> IndexResult<IndexEntry> {
        let entry = self
            .entries
            .remove(path)
            .ok_or_else(|| IndexError::PathNotFound(path.to_string()))?;
        self.tree_cache = None;
        Ok(entry)
    }

    // ---------------------------------------------------------------
    // Tree conversion
    // ---------------------------------------------------------------

    /// Write nested tree objects for every entry and return the root id.
    pub fn write_tree(&mut self) -> IndexResult<ObjectId> {
        if let Some(id) = self.tree_cache {
            return Ok(id);
        }
        let entries: Vec<_> = self.entries.values().map(IndexEntry::to_entry).collect();
        let tree_id = build_tree(self.store.as_ref(), &entries)?;
        debug!(tree = %tree_id.short_hex(), entries = entries.len(), "wrote index tree");
        self.tree_cache = Some(tree_id);
        Ok(tree_id)
    }

    /// Replace the index contents with the files of `tree_id`.
    pub fn read_tree(&mut self, tree_id: &ObjectId) -> IndexResult<()> {
        let files = flatten_tree(self.store.as_ref(), tree_id, self.max_depth)?;
        self.entries = files
            .into_iter()
            .map(|(path, entry)| (path, IndexEntry::from_tree(entry)))
            .collect();
        self.tree_cache = Some(*tree_id);
        Ok(())
    }
}
