//! Per-path diff records between a snapshot and another snapshot or the
//! working directory.

use serde::Serialize;
use tracing::debug;
use wt_index::{ChangeClassifier, ChangeKind, IndexError, PathScanner, DEFAULT_MAX_DEPTH};
use wt_store::{Commit, InMemoryObjectStore, ObjectKind, ObjectStore};
use wt_types::ObjectId;

use crate::blob_diff::{diff_blobs, is_binary, render_unified, DEFAULT_BINARY_PROBE, DEFAULT_CONTEXT_LINES};
use crate::error::{DiffError, DiffResult};
use crate::tree_diff::diff_trees;

/// Where the new side of a diff comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffMode {
    TreeToTree,
    TreeToWorking,
}

/// The new side of a diff.
#[derive(Clone, Copy)]
pub enum DiffTarget<'s> {
    /// A recorded commit.
    Snapshot(ObjectId),
    /// The live working directory.
    Working(&'s PathScanner),
}

impl DiffTarget<'_> {
    pub fn mode(&self) -> DiffMode {
        match self {
            DiffTarget::Snapshot(_) => DiffMode::TreeToTree,
            DiffTarget::Working(_) => DiffMode::TreeToWorking,
        }
    }
}

/// The rendered part of a [`DiffRecord`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum DiffBody {
    /// A unified diff.
    Text(String),
    /// Placeholder for content that was not line-diffed.
    Binary(String),
}

impl DiffBody {
    /// The printable body.
    pub fn as_str(&self) -> &str {
        match self {
            DiffBody::Text(text) | DiffBody::Binary(text) => text,
        }
    }
}

/// One differing path with its rendered diff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    pub path: String,
    pub change_type: ChangeKind,
    pub body: DiffBody,
    pub old_id: Option<ObjectId>,
    pub new_id: Option<ObjectId>,
}

impl DiffRecord {
    /// Returns `true` if either side was detected as binary.
    pub fn is_binary(&self) -> bool {
        matches!(self.body, DiffBody::Binary(_))
    }
}

/// Knobs for rendering diffs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffOptions {
    /// Context lines around each hunk.
    pub context_lines: usize,
    /// Bytes inspected for a NUL when detecting binary content.
    pub binary_probe_len: usize,
    /// Maximum tree nesting accepted when flattening snapshots.
    pub max_depth: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            binary_probe_len: DEFAULT_BINARY_PROBE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A path pair to render, with each side's blob id.
struct PendingDiff {
    path: String,
    kind: ChangeKind,
    old_id: Option<ObjectId>,
    new_id: Option<ObjectId>,
}

/// Produces [`DiffRecord`]s from an object store.
///
/// The store is only read. Working-file bytes are materialised in a scratch
/// store that lives for one call.
pub struct DiffEngine<'a> {
    store: &'a dyn ObjectStore,
    options: DiffOptions,
}

impl<'a> DiffEngine<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self::with_options(store, DiffOptions::default())
    }

    pub fn with_options(store: &'a dyn ObjectStore, options: DiffOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Diff the commit `old` against `target`.
    ///
    /// Any failure aborts the whole call; no partial output is returned.
    pub fn diff(&self, old: &ObjectId, target: DiffTarget<'_>) -> DiffResult<Vec<DiffRecord>> {
        match target {
            DiffTarget::Snapshot(new) => self.diff_commits(old, &new),
            DiffTarget::Working(scanner) => self.diff_working(old, scanner),
        }
    }

    // -----------------------------------------------------------------------
    // Tree to tree
    // -----------------------------------------------------------------------

    /// Diff two commits. Records come out in path order.
    ///
    /// When `old == new` the old side is an empty tree, so the whole
    /// snapshot shows as additions.
    pub fn diff_commits(&self, old: &ObjectId, new: &ObjectId) -> DiffResult<Vec<DiffRecord>> {
        let new_commit = self.load_commit(new)?;
        let old_tree = if old == new {
            debug!(id = %new.short_hex(), "same snapshot on both sides, diffing against empty tree");
            None
        } else {
            Some(self.load_commit(old)?.tree)
        };

        let tree_diff = diff_trees(self.store, old_tree.as_ref(), &new_commit.tree, self.options.max_depth)?;
        let pending = tree_diff.changes.iter().map(|change| PendingDiff {
            path: change.path().to_string(),
            kind: change.kind(),
            old_id: change.old_id(),
            new_id: change.new_id(),
        });
        let records = self.render_all(pending, self.store)?;
        debug!(
            old = %old.short_hex(),
            new = %new.short_hex(),
            records = records.len(),
            "diffed snapshots"
        );
        Ok(records)
    }

    // -----------------------------------------------------------------------
    // Tree to working directory
    // -----------------------------------------------------------------------

    /// Diff the commit `old` against the files under `scanner`'s root.
    pub fn diff_working(&self, old: &ObjectId, scanner: &PathScanner) -> DiffResult<Vec<DiffRecord>> {
        self.load_commit(old)?;
        let classifier = ChangeClassifier::new(scanner, self.store, self.options.max_depth);
        let changes = classifier.classify(Some(old)).map_err(|e| match e {
            IndexError::MissingSnapshot(id) => DiffError::MissingSnapshot(id),
            other => other.into(),
        })?;

        let scratch = InMemoryObjectStore::new();
        let mut pending = Vec::with_capacity(changes.len());
        for record in changes.iter() {
            let new_id = match &record.new {
                Some(_) => Some(scratch.write_blob(&scanner.read_file(&record.path)?)?),
                None => None,
            };
            pending.push(PendingDiff {
                path: record.path.clone(),
                kind: record.kind(),
                old_id: record.old.as_ref().map(|e| e.object_id),
                new_id,
            });
        }

        let records = self.render_all(pending, &scratch)?;
        debug!(
            old = %old.short_hex(),
            records = records.len(),
            transient = scratch.len(),
            "diffed working directory"
        );
        Ok(records)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    fn render_all(
        &self,
        pending: impl IntoIterator<Item = PendingDiff>,
        new_side: &dyn ObjectStore,
    ) -> DiffResult<Vec<DiffRecord>> {
        pending
            .into_iter()
            .map(|p| -> DiffResult<DiffRecord> {
                let old = read_side(self.store, p.old_id.as_ref())?;
                let new = read_side(new_side, p.new_id.as_ref())?;
                let body = self.render(&p.path, old.as_deref(), new.as_deref());
                Ok(DiffRecord {
                    path: p.path,
                    change_type: p.kind,
                    body,
                    old_id: p.old_id,
                    new_id: p.new_id,
                })
            })
            .collect()
    }

    /// Render one path. `None` marks a side where the path does not exist.
    pub fn render(&self, path: &str, old: Option<&[u8]>, new: Option<&[u8]>) -> DiffBody {
        let probe = self.options.binary_probe_len;
        let binary = old.is_some_and(|d| is_binary(d, probe)) || new.is_some_and(|d| is_binary(d, probe));
        let old_label = old.map(|_| path);
        let new_label = new.map(|_| path);

        if binary {
            debug!(path = %path, "binary content, skipping line diff");
            let side = |label: Option<&str>, prefix: &str| {
                label.map_or("/dev/null".to_string(), |l| format!("{prefix}/{l}"))
            };
            return DiffBody::Binary(format!(
                "Binary files {} and {} differ\n",
                side(old_label, "a"),
                side(new_label, "b")
            ));
        }

        let blob_diff = diff_blobs(
            old.unwrap_or_default(),
            new.unwrap_or_default(),
            self.options.context_lines,
        );
        DiffBody::Text(render_unified(old_label, new_label, &blob_diff))
    }

    fn load_commit(&self, id: &ObjectId) -> DiffResult<Commit> {
        let object = self.store.read(id)?.ok_or(DiffError::MissingSnapshot(*id))?;
        if object.kind != ObjectKind::Commit {
            return Err(DiffError::NotACommit(*id));
        }
        Ok(Commit::from_stored_object(&object)?)
    }
}

fn read_side(store: &dyn ObjectStore, id: Option<&ObjectId>) -> DiffResult<Option<Vec<u8>>> {
    id.map(|id| store.read_blob(id).map(|blob| blob.data).map_err(DiffError::from_store))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use wt_index::IgnoreFilter;
    use wt_store::{build_tree, Entry, EntryMode, Tree};

    fn commit(store: &InMemoryObjectStore, files: &[(&str, &str)], parents: Vec<ObjectId>) -> ObjectId {
        let entries: Vec<Entry> = files
            .iter()
            .map(|(p, c)| Entry::new(*p, EntryMode::Regular, store.write_blob(c.as_bytes()).unwrap()))
            .collect();
        commit_entries(store, &entries, parents)
    }

    fn commit_raw(store: &InMemoryObjectStore, path: &str, data: &[u8], parents: Vec<ObjectId>) -> ObjectId {
        let entry = Entry::new(path, EntryMode::Regular, store.write_blob(data).unwrap());
        commit_entries(store, &[entry], parents)
    }

    fn commit_entries(store: &InMemoryObjectStore, entries: &[Entry], parents: Vec<ObjectId>) -> ObjectId {
        let tree = build_tree(store, entries).unwrap();
        store
            .write_commit(&Commit::new(tree, parents, "T <t@example.com>", "snapshot"))
            .unwrap()
    }

    fn scanner(root: &Path) -> PathScanner {
        PathScanner::new(root, IgnoreFilter::new(IgnoreFilter::builtin_patterns(".wt")))
    }

    #[test]
    fn two_commits_modified_file() {
        let store = InMemoryObjectStore::new();
        let c1 = commit(&store, &[("a.txt", "x\n")], vec![]);
        let c2 = commit(&store, &[("a.txt", "y\n")], vec![c1]);

        let records = DiffEngine::new(&store).diff(&c1, DiffTarget::Snapshot(c2)).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.path, "a.txt");
        assert_eq!(record.change_type, ChangeKind::Modified);
        assert!(!record.is_binary());
        let text = record.body.as_str();
        assert!(text.contains("\n-x\n"));
        assert!(text.contains("\n+y\n"));
    }

    #[test]
    fn identical_content_emits_nothing() {
        let store = InMemoryObjectStore::new();
        let c1 = commit(&store, &[("same.txt", "keep\n"), ("a.txt", "1\n")], vec![]);
        let c2 = commit(&store, &[("same.txt", "keep\n"), ("a.txt", "2\n")], vec![c1]);

        let records = DiffEngine::new(&store).diff_commits(&c1, &c2).unwrap();
        let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt"]);
    }

    #[test]
    fn same_id_diffs_against_empty_tree() {
        let store = InMemoryObjectStore::new();
        let c1 = commit(&store, &[("b.txt", "b\n"), ("a.txt", "a\n")], vec![]);

        let records = DiffEngine::new(&store).diff_commits(&c1, &c1).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "a.txt");
        assert!(records.iter().all(|r| r.change_type == ChangeKind::Added));
        assert!(records[0].body.as_str().starts_with("--- /dev/null\n+++ b/a.txt\n@@ -0,0 +1,1 @@\n+a\n"));
    }

    #[test]
    fn tree_to_tree_records_follow_path_order() {
        let store = InMemoryObjectStore::new();
        let c1 = commit(&store, &[("z.txt", "z\n"), ("dir/a.txt", "1\n")], vec![]);
        let c2 = commit(&store, &[("m.txt", "m\n"), ("dir/a.txt", "2\n")], vec![c1]);

        let records = DiffEngine::new(&store).diff_commits(&c1, &c2).unwrap();
        let summary: Vec<(&str, ChangeKind)> = records.iter().map(|r| (r.path.as_str(), r.change_type)).collect();
        assert_eq!(
            summary,
            vec![
                ("dir/a.txt", ChangeKind::Modified),
                ("m.txt", ChangeKind::Added),
                ("z.txt", ChangeKind::Removed),
            ]
        );
        assert!(records[2].body.as_str().starts_with("--- a/z.txt\n+++ /dev/null\n"));
    }

    #[test]
    fn nul_byte_makes_binary_record() {
        let store = InMemoryObjectStore::new();
        let c1 = commit(&store, &[("img.bin", "text\n")], vec![]);
        let c2 = commit_raw(&store, "img.bin", b"\x00\x01\x02", vec![c1]);

        let records = DiffEngine::new(&store).diff_commits(&c1, &c2).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_binary());
        assert_eq!(records[0].change_type, ChangeKind::Modified);
        assert_eq!(records[0].body.as_str(), "Binary files a/img.bin and b/img.bin differ\n");
    }

    #[test]
    fn nul_past_detection_window_is_text() {
        let store = InMemoryObjectStore::new();
        let engine = DiffEngine::with_options(
            &store,
            DiffOptions {
                binary_probe_len: 4,
                ..DiffOptions::default()
            },
        );
        assert!(matches!(engine.render("f", None, Some(&b"abcdef\x00"[..])), DiffBody::Text(_)));
        assert!(matches!(engine.render("f", None, Some(&b"ab\x00"[..])), DiffBody::Binary(_)));
    }

    #[test]
    fn added_binary_uses_dev_null() {
        let store = InMemoryObjectStore::new();
        let body = DiffEngine::new(&store).render("new.bin", None, Some(&b"\x00"[..]));
        assert_eq!(body, DiffBody::Binary("Binary files /dev/null and b/new.bin differ\n".into()));
    }

    #[test]
    fn undecodable_content_is_binary() {
        let store = InMemoryObjectStore::new();
        let body = DiffEngine::new(&store).render("f", Some(&[0xFF, b'\n'][..]), Some(&[0xFE, b'\n'][..]));
        assert_eq!(body, DiffBody::Binary("Binary files a/f and b/f differ\n".into()));
    }

    #[test]
    fn trailing_newline_change_is_marked() {
        let store = InMemoryObjectStore::new();
        let body = DiffEngine::new(&store).render("f", Some(&b"x"[..]), Some(&b"x\n"[..]));
        assert_eq!(
            body.as_str(),
            "--- a/f\n+++ b/f\n@@ -1,1 +1,1 @@\n-x\n\\ No newline at end of file\n+x\n"
        );
    }

    #[test]
    fn missing_snapshot_aborts() {
        let store = InMemoryObjectStore::new();
        let c1 = commit(&store, &[("a.txt", "a")], vec![]);
        let absent = ObjectId::from_bytes(b"absent");
        assert!(matches!(
            DiffEngine::new(&store).diff_commits(&c1, &absent),
            Err(DiffError::MissingSnapshot(id)) if id == absent
        ));
        assert!(matches!(
            DiffEngine::new(&store).diff_commits(&absent, &c1),
            Err(DiffError::MissingSnapshot(id)) if id == absent
        ));
    }

    #[test]
    fn tree_id_is_not_a_commit() {
        let store = InMemoryObjectStore::new();
        let tree = store.write_tree(&Tree::empty()).unwrap();
        assert!(matches!(
            DiffEngine::new(&store).diff_commits(&tree, &tree),
            Err(DiffError::NotACommit(id)) if id == tree
        ));
    }

    #[test]
    fn missing_blob_aborts_whole_diff() {
        let store = InMemoryObjectStore::new();
        let lost = ObjectId::from_bytes(b"lost blob");
        let tree = build_tree(&store, &[Entry::new("gone.txt", EntryMode::Regular, lost)]).unwrap();
        let c1 = store
            .write_commit(&Commit::new(tree, vec![], "T <t@example.com>", "broken"))
            .unwrap();
        assert!(matches!(
            DiffEngine::new(&store).diff_commits(&c1, &c1),
            Err(DiffError::MissingObject(id)) if id == lost
        ));
    }

    #[test]
    fn working_directory_changes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let store = InMemoryObjectStore::new();
        let base = commit(
            &store,
            &[("a.txt", "hello\n"), ("gone.txt", "bye\n"), ("same.txt", "same\n")],
            vec![],
        );
        fs::write(root.join("a.txt"), b"hello world\n").unwrap();
        fs::write(root.join("same.txt"), b"same\n").unwrap();
        fs::write(root.join("new.txt"), b"fresh\n").unwrap();
        let before = store.len();

        let scan = scanner(root);
        let records = DiffEngine::new(&store).diff(&base, DiffTarget::Working(&scan)).unwrap();
        let mut summary: Vec<(&str, ChangeKind)> = records.iter().map(|r| (r.path.as_str(), r.change_type)).collect();
        summary.sort();
        assert_eq!(
            summary,
            vec![
                ("a.txt", ChangeKind::Modified),
                ("gone.txt", ChangeKind::Removed),
                ("new.txt", ChangeKind::Added),
            ]
        );
        let modified = records.iter().find(|r| r.path == "a.txt").unwrap();
        assert!(modified.body.as_str().contains("-hello\n+hello world\n"));
        assert_eq!(store.len(), before, "working bytes must not reach the durable store");
    }

    #[test]
    fn working_binary_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = InMemoryObjectStore::new();
        let base = commit(&store, &[("data.bin", "plain\n")], vec![]);
        fs::write(dir.path().join("data.bin"), b"\x00\xff").unwrap();

        let scan = scanner(dir.path());
        let records = DiffEngine::new(&store).diff_working(&base, &scan).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_binary());
    }

    #[test]
    fn target_reports_mode() {
        let dir = tempfile::tempdir().unwrap();
        let scan = scanner(dir.path());
        assert_eq!(DiffTarget::Working(&scan).mode(), DiffMode::TreeToWorking);
        assert_eq!(DiffTarget::Snapshot(ObjectId::null()).mode(), DiffMode::TreeToTree);
    }

    #[test]
    fn record_serializes_with_tagged_body() {
        let record = DiffRecord {
            path: "a.txt".into(),
            change_type: ChangeKind::Added,
            body: DiffBody::Text("+a\n".into()),
            old_id: None,
            new_id: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["change_type"], "added");
        assert_eq!(json["body"]["kind"], "text");
        assert_eq!(json["body"]["text"], "+a\n");
    }
}
