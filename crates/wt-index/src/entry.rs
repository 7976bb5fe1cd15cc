//! Index entry types for tracking working directory files.

use serde::{Deserialize, Serialize};
use wt_store::{Entry, EntryMode};
use wt_types::ObjectId;

/// An entry in the staging index, representing a tracked file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Relative path from the working root, `/`-separated.
    pub path: String,
    /// Content-addressed ID of the file's blob in the object store.
    pub object_id: ObjectId,
    /// File mode.
    pub mode: EntryMode,
    /// File size in bytes, when known. Entries loaded from a tree have none.
    pub size: Option<u64>,
    /// Whether the entry was staged in this session rather than loaded
    /// from a tree.
    pub staged: bool,
}

impl IndexEntry {
    /// An entry loaded from a recorded tree.
    pub fn from_tree(entry: Entry) -> Self {
        Self {
            path: entry.path,
            object_id: entry.object_id,
            mode: entry.mode,
            size: None,
            staged: false,
        }
    }

    /// A freshly staged entry.
    pub fn new_staged(path: impl Into<String>, object_id: ObjectId, mode: EntryMode, size: u64) -> Self {
        Self {
            path: path.into(),
            object_id,
            mode,
            size: Some(size),
            staged: true,
        }
    }

    /// The path/mode/id triple recorded in trees.
    pub fn to_entry(&self) -> Entry {
        Entry::new(self.path.clone(), self.mode, self.object_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_entries_are_not_staged() {
        let entry = IndexEntry::from_tree(Entry::new(
            "a.txt",
            EntryMode::Regular,
            ObjectId::from_bytes(b"a"),
        ));
        assert!(!entry.staged);
        assert!(entry.size.is_none());
        assert_eq!(entry.to_entry().path, "a.txt");
    }

    #[test]
    fn new_staged_entry_is_staged() {
        let entry = IndexEntry::new_staged("b.txt", ObjectId::from_bytes(b"b"), EntryMode::Executable, 7);
        assert!(entry.staged);
        assert_eq!(entry.size, Some(7));
        assert_eq!(entry.to_entry().mode, EntryMode::Executable);
    }
}
