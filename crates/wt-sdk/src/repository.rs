use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use wt_diff::{DiffEngine, DiffRecord, DiffTarget};
use wt_index::{
    ChangeClassifier, ChangeKind, ChangeSet, IgnoreFilter, Index, IndexError, PathScanner, StatusEntry,
    WorkdirStatus,
};
use wt_refs::types::branch_ref;
use wt_refs::{FsRefStore, Head, Ref, RefResolver, RefStore};
use wt_store::{Commit, FsObjectStore, ObjectStore};
use wt_types::ObjectId;

use crate::commit::CommitInfo;
use crate::config::{RepoConfig, DEFAULT_CONTROL_DIR};
use crate::error::{SdkError, SdkResult};

/// Branch HEAD names in a fresh repository.
pub const DEFAULT_BRANCH: &str = "main";

/// What to build a [`Repository`] from.
pub enum RepoSource {
    /// An already open repository, used as is.
    Handle(Box<Repository>),
    /// A working root to open.
    Path(PathBuf),
}

impl From<Repository> for RepoSource {
    fn from(repo: Repository) -> Self {
        RepoSource::Handle(Box::new(repo))
    }
}

impl From<PathBuf> for RepoSource {
    fn from(path: PathBuf) -> Self {
        RepoSource::Path(path)
    }
}

impl From<&Path> for RepoSource {
    fn from(path: &Path) -> Self {
        RepoSource::Path(path.to_path_buf())
    }
}

impl From<&str> for RepoSource {
    fn from(path: &str) -> Self {
        RepoSource::Path(PathBuf::from(path))
    }
}

/// A working directory together with its object store, refs and index.
pub struct Repository {
    root: PathBuf,
    config: RepoConfig,
    objects: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
    scanner: PathScanner,
    index: Index,
}

impl Repository {
    /// Create the control directory under `path` with HEAD on
    /// [`DEFAULT_BRANCH`].
    pub fn init(path: impl AsRef<Path>) -> SdkResult<Self> {
        let root = path.as_ref().to_path_buf();
        let control = root.join(DEFAULT_CONTROL_DIR);
        if control.join("HEAD").exists() {
            return Err(SdkError::AlreadyInitialized(root.display().to_string()));
        }
        fs::create_dir_all(&control)?;
        let objects = FsObjectStore::open(control.join("objects"))?;
        let refs = FsRefStore::open(&control)?;
        refs.set_head(DEFAULT_BRANCH)?;
        info!(root = %root.display(), branch = DEFAULT_BRANCH, "initialized repository");
        Self::with_stores(root, RepoConfig::default(), Arc::new(objects), Arc::new(refs))
    }

    /// Open an existing repository, reading its optional config file.
    pub fn open(path: impl AsRef<Path>) -> SdkResult<Self> {
        let root = path.as_ref();
        let control = root.join(DEFAULT_CONTROL_DIR);
        if !control.join("HEAD").is_file() {
            return Err(SdkError::NotInitialized(root.display().to_string()));
        }
        let config = RepoConfig::load(&control)?;
        Self::open_with_config(root, config)
    }

    /// Open an existing repository with explicit settings.
    pub fn open_with_config(path: impl AsRef<Path>, config: RepoConfig) -> SdkResult<Self> {
        let root = path.as_ref().to_path_buf();
        let control = root.join(&config.control_dir);
        if !control.join("HEAD").is_file() {
            return Err(SdkError::NotInitialized(root.display().to_string()));
        }
        let objects = FsObjectStore::open(control.join("objects"))?;
        let refs = FsRefStore::open(&control)?;
        Self::with_stores(root, config, Arc::new(objects), Arc::new(refs))
    }

    /// Use an open handle or open one from a path.
    pub fn from_source(source: impl Into<RepoSource>) -> SdkResult<Self> {
        match source.into() {
            RepoSource::Handle(repo) => Ok(*repo),
            RepoSource::Path(path) => Self::open(path),
        }
    }

    /// Assemble a repository over existing stores. The index is seeded from
    /// the tree HEAD points at.
    pub fn with_stores(
        root: impl Into<PathBuf>,
        config: RepoConfig,
        objects: Arc<dyn ObjectStore>,
        refs: Arc<dyn RefStore>,
    ) -> SdkResult<Self> {
        let root = root.into();
        let filter = IgnoreFilter::load(&root, &config.control_dir, &config.ignore_file, &config.extra_ignore)?;
        let scanner = PathScanner::with_options(&root, filter, config.scan_options());
        let mut index = Index::new(Arc::clone(&objects)).with_max_depth(config.max_tree_depth);
        if let Some(head) = refs.head_commit()? {
            let commit = objects.read_commit(&head)?;
            index.read_tree(&commit.tree)?;
            debug!(head = %head.short_hex(), tracked = index.len(), "seeded index from HEAD");
        }
        Ok(Self {
            root,
            config,
            objects,
            refs,
            scanner,
            index,
        })
    }

    // ---- Accessors ----

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn control_dir(&self) -> PathBuf {
        self.root.join(&self.config.control_dir)
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    pub fn scanner(&self) -> &PathScanner {
        &self.scanner
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    // ---- References ----

    fn resolver(&self) -> RefResolver<'_> {
        RefResolver::new(self.refs.as_ref(), self.objects.as_ref())
    }

    /// Resolve a reference expression such as `main`, `HEAD~2` or a full id.
    pub fn resolve(&self, reference: &str) -> SdkResult<ObjectId> {
        Ok(self.resolver().resolve(reference)?)
    }

    /// The commit HEAD points at, or `None` before the first commit.
    pub fn head(&self) -> SdkResult<Option<ObjectId>> {
        Ok(self.refs.head_commit()?)
    }

    pub fn current_branch(&self) -> SdkResult<Option<String>> {
        Ok(self.refs.current_branch()?)
    }

    fn require_head(&self) -> SdkResult<ObjectId> {
        self.head()?.ok_or(SdkError::EmptyRepository)
    }

    // ---- Snapshots ----

    /// Stage the current content of working files. A tracked path that is
    /// gone from disk is unstaged.
    pub fn add<S: AsRef<str>>(&mut self, paths: &[S]) -> SdkResult<()> {
        for path in paths {
            let path = path.as_ref();
            if self.scanner.filter().is_ignored(path) {
                return Err(IndexError::InvalidPath(format!("{path} is ignored")).into());
            }
            if !self.scanner.absolute(path).is_file() {
                self.index.remove(path)?;
                debug!(path, "unstaged missing file");
                continue;
            }
            let data = self.scanner.read_file(path)?;
            let mode = self.scanner.file_mode(path)?;
            let id = self.index.stage_file(path, &data, mode)?;
            debug!(path, id = %id.short_hex(), "staged");
        }
        Ok(())
    }

    /// Record every trackable file as a new commit on the current branch.
    ///
    /// Tracked paths that are no longer on disk are dropped; unreadable
    /// files keep their previously staged content.
    pub fn commit(&mut self, author: &str, message: &str) -> SdkResult<ObjectId> {
        let trackable = self.scanner.trackable_files();
        for path in &trackable {
            let staged = self
                .scanner
                .read_file(path)
                .and_then(|data| Ok((data, self.scanner.file_mode(path)?)));
            match staged {
                Ok((data, mode)) => {
                    self.index.stage_file(path, &data, mode)?;
                }
                Err(e) => warn!(path = %path, error = %e, "skipping unreadable file"),
            }
        }
        for gone in self.index.paths().difference(&trackable) {
            self.index.remove(gone)?;
        }

        let tree = self.index.write_tree()?;
        let parents: Vec<ObjectId> = self.head()?.into_iter().collect();
        let id = self
            .objects
            .write_commit(&Commit::new(tree, parents, author, message))?;

        match self.refs.head()? {
            Some(Head::Detached(_)) => self.refs.set_head_detached(id)?,
            Some(Head::Symbolic(branch)) => self.refs.write_ref(&branch_ref(&branch), &Ref::Direct(id))?,
            None => {
                self.refs.write_ref(&branch_ref(DEFAULT_BRANCH), &Ref::Direct(id))?;
                self.refs.set_head(DEFAULT_BRANCH)?;
            }
        }
        info!(id = %id.short_hex(), tree = %tree.short_hex(), files = self.index.len(), "committed");
        Ok(id)
    }

    // ---- History ----

    /// Up to `limit` commits along HEAD's first-parent lineage, newest first.
    pub fn log(&self, limit: usize) -> SdkResult<Vec<CommitInfo>> {
        match self.head()? {
            Some(head) => self.log_from_id(head, limit),
            None => Ok(Vec::new()),
        }
    }

    /// Like [`Repository::log`], starting at `reference`.
    pub fn log_from(&self, reference: &str, limit: usize) -> SdkResult<Vec<CommitInfo>> {
        let start = self.resolve(reference)?;
        self.log_from_id(start, limit)
    }

    fn log_from_id(&self, start: ObjectId, limit: usize) -> SdkResult<Vec<CommitInfo>> {
        let resolver = self.resolver();
        let mut infos = Vec::new();
        let mut next = Some(start);
        while let Some(id) = next {
            if infos.len() >= limit {
                break;
            }
            let commit = resolver.load_commit(&id)?;
            next = commit.first_parent().copied();
            infos.push(CommitInfo::new(id, &commit));
        }
        Ok(infos)
    }

    pub fn commit_info(&self, reference: &str) -> SdkResult<CommitInfo> {
        let id = self.resolve(reference)?;
        let commit = self.resolver().load_commit(&id)?;
        Ok(CommitInfo::new(id, &commit))
    }

    // ---- Path sets ----

    pub fn raw_files(&self) -> BTreeSet<String> {
        self.scanner.raw_files()
    }

    pub fn trackable_files(&self) -> BTreeSet<String> {
        self.scanner.trackable_files()
    }

    pub fn ignored_files(&self) -> BTreeSet<String> {
        self.scanner.ignored_files()
    }

    /// Paths in the index.
    pub fn tracked_files(&self) -> BTreeSet<String> {
        self.index.paths()
    }

    /// Trackable files that are not in the index.
    pub fn untracked_files(&self) -> BTreeSet<String> {
        self.scanner.untracked_files(&self.index.paths())
    }

    /// Tracked files whose content differs from HEAD.
    pub fn modified_files(&self) -> SdkResult<BTreeSet<String>> {
        Ok(self.classify("HEAD")?.modified())
    }

    // ---- Classification ----

    /// Classify the working directory against `reference`.
    ///
    /// `HEAD` (or `HEAD~N`) in a repository without commits classifies as
    /// empty.
    pub fn classify(&self, reference: &str) -> SdkResult<ChangeSet> {
        let name = reference.split_once('~').map_or(reference, |(name, _)| name);
        let base = if name == "HEAD" && self.head()?.is_none() {
            None
        } else {
            Some(self.resolve(reference)?)
        };
        let classifier = ChangeClassifier::new(&self.scanner, self.objects.as_ref(), self.config.max_tree_depth);
        Ok(classifier.classify(base.as_ref())?)
    }

    /// Changes against HEAD plus untracked and ignored files. New files that
    /// were never staged are listed as untracked only; the control directory
    /// is left out of the ignored list.
    pub fn status(&self) -> SdkResult<WorkdirStatus> {
        let tracked = self.index.paths();
        let changes = self.classify("HEAD")?;
        let control = format!("{}/", self.config.control_dir);
        Ok(WorkdirStatus {
            changes: changes
                .iter()
                .filter(|r| r.kind() != ChangeKind::Added || tracked.contains(&r.path))
                .map(|r| StatusEntry::new(&r.path, r.kind()))
                .collect(),
            untracked: self.scanner.untracked_files(&tracked).into_iter().collect(),
            ignored: self
                .scanner
                .ignored_files()
                .into_iter()
                .filter(|p| !p.starts_with(&control))
                .collect(),
        })
    }

    pub fn is_working_copy_clean(&self) -> SdkResult<bool> {
        Ok(self.status()?.is_clean())
    }

    // ---- Diffs ----

    fn engine(&self) -> DiffEngine<'_> {
        DiffEngine::with_options(self.objects.as_ref(), self.config.diff_options())
    }

    /// Diff two references.
    pub fn diff(&self, old: &str, new: &str) -> SdkResult<Vec<DiffRecord>> {
        let old = self.resolve(old)?;
        let new = self.resolve(new)?;
        Ok(self.engine().diff(&old, DiffTarget::Snapshot(new))?)
    }

    /// Diff `reference` against the working directory.
    pub fn diff_working(&self, reference: &str) -> SdkResult<Vec<DiffRecord>> {
        let old = self.resolve(reference)?;
        Ok(self.engine().diff(&old, DiffTarget::Working(&self.scanner))?)
    }

    /// Uncommitted changes: HEAD against the working directory.
    pub fn diff_head(&self) -> SdkResult<Vec<DiffRecord>> {
        let head = self.require_head()?;
        Ok(self.engine().diff_working(&head, &self.scanner)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    const AUTHOR: &str = "Ada <ada@example.com>";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn init_points_head_at_main() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        assert_eq!(repo.current_branch().unwrap(), Some("main".into()));
        assert_eq!(repo.head().unwrap(), None);
        assert!(dir.path().join(".wt").join("HEAD").is_file());
        assert!(repo.log(10).unwrap().is_empty());
    }

    #[test]
    fn init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        assert!(matches!(
            Repository::init(dir.path()),
            Err(SdkError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn open_requires_init() {
        let dir = tempfile::tempdir().unwrap();
        let err = Repository::open(dir.path()).err().unwrap();
        assert!(matches!(err, SdkError::NotInitialized(_)));
        assert_eq!(err.category(), ErrorCategory::InvalidInput);
    }

    #[test]
    fn from_source_accepts_handle_or_path() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let same = Repository::from_source(repo).unwrap();
        assert_eq!(same.root(), dir.path());

        let reopened = Repository::from_source(dir.path()).unwrap();
        assert_eq!(reopened.current_branch().unwrap(), Some("main".into()));
    }

    #[test]
    fn empty_repository_classifies_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "hello");

        assert_eq!(repo.trackable_files(), set(&["a.txt"]));
        assert!(repo.classify("HEAD").unwrap().is_empty());
        assert!(repo.classify("HEAD~0").unwrap().is_empty());
        assert!(repo.classify("HEAD~3").unwrap().is_empty());
        assert!(repo.classify("main").is_err());
        assert_eq!(repo.untracked_files(), set(&["a.txt"]));
        assert!(!repo.is_working_copy_clean().unwrap());

        let err = repo.diff_head().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NothingToCompare);
    }

    #[test]
    fn modified_file_after_commit() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "hello");
        repo.commit(AUTHOR, "first").unwrap();
        assert!(repo.is_working_copy_clean().unwrap());

        write(dir.path(), "a.txt", "hello world");
        let changes = repo.classify("HEAD").unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.modified(), set(&["a.txt"]));
        assert_eq!(repo.modified_files().unwrap(), set(&["a.txt"]));
    }

    #[test]
    fn deleted_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "hello");
        repo.commit(AUTHOR, "first").unwrap();

        fs::remove_file(dir.path().join("a.txt")).unwrap();
        let changes = repo.classify("HEAD").unwrap();
        assert_eq!(changes.removed(), set(&["a.txt"]));
        assert!(changes.added().is_empty());
        assert!(changes.modified().is_empty());
    }

    #[test]
    fn diff_between_two_commits() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "x\n");
        let c1 = repo.commit(AUTHOR, "one").unwrap();
        write(dir.path(), "a.txt", "y\n");
        let c2 = repo.commit(AUTHOR, "two").unwrap();

        assert_eq!(repo.resolve("HEAD").unwrap(), c2);
        assert_eq!(repo.resolve("HEAD~1").unwrap(), c1);
        assert_eq!(repo.resolve("main~5").unwrap(), c1);

        let records = repo.diff(&c1.to_hex(), "HEAD").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "a.txt");
        assert_eq!(records[0].change_type, ChangeKind::Modified);
        assert!(records[0].body.as_str().contains("-x\n+y\n"));
    }

    #[test]
    fn first_commit_diff_against_itself_lists_additions() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "a\n");
        write(dir.path(), "src/b.txt", "b\n");
        repo.commit(AUTHOR, "root").unwrap();

        let records = repo.diff("HEAD", "HEAD").unwrap();
        let paths: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "src/b.txt"]);
        assert!(records.iter().all(|r| r.change_type == ChangeKind::Added));
    }

    #[test]
    fn diff_head_shows_uncommitted_edit() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "notes.md", "one\ntwo\n");
        repo.commit(AUTHOR, "notes").unwrap();
        write(dir.path(), "notes.md", "one\nthree\n");

        let records = repo.diff_head().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].body.as_str().contains("-two\n+three\n"));
        assert_eq!(repo.diff_working("main").unwrap(), records);
    }

    #[test]
    fn status_groups_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".wtignore", "# build output\n*.log\n");
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "kept.txt", "v1");
        repo.commit(AUTHOR, "base").unwrap();

        write(dir.path(), "kept.txt", "v2");
        write(dir.path(), "fresh.txt", "new");
        write(dir.path(), "debug.log", "noise");

        let status = repo.status().unwrap();
        assert_eq!(status.changes, vec![StatusEntry::new("kept.txt", ChangeKind::Modified)]);
        assert_eq!(status.untracked, vec!["fresh.txt".to_string()]);
        assert_eq!(status.ignored, vec!["debug.log".to_string()]);
        assert!(!status.is_clean());
        assert!(repo.raw_files().contains("debug.log"));
        assert!(repo.ignored_files().contains(".wt/HEAD"));
    }

    #[test]
    fn add_tracks_and_reopen_seeds_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "b.txt", "b");
        repo.add(&["a.txt"]).unwrap();
        assert_eq!(repo.tracked_files(), set(&["a.txt"]));
        assert_eq!(repo.untracked_files(), set(&["b.txt"]));
        repo.commit(AUTHOR, "both").unwrap();

        let reopened = Repository::open(dir.path()).unwrap();
        assert_eq!(reopened.tracked_files(), set(&["a.txt", "b.txt"]));
        assert!(reopened.untracked_files().is_empty());
    }

    #[test]
    fn add_rejects_ignored_and_unknown_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        assert!(matches!(repo.add(&[".wt/HEAD"]), Err(SdkError::Index(IndexError::InvalidPath(_)))));
        assert!(matches!(repo.add(&["nope.txt"]), Err(SdkError::Index(IndexError::PathNotFound(_)))));
    }

    #[test]
    fn commit_drops_deleted_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "b.txt", "b");
        repo.commit(AUTHOR, "both").unwrap();
        fs::remove_file(dir.path().join("b.txt")).unwrap();
        repo.commit(AUTHOR, "drop b").unwrap();

        assert_eq!(repo.tracked_files(), set(&["a.txt"]));
        let records = repo.diff("HEAD~1", "HEAD").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].change_type, ChangeKind::Removed);
    }

    #[test]
    fn log_walks_first_parent_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        for n in 0..3 {
            write(dir.path(), "n.txt", &n.to_string());
            repo.commit(AUTHOR, &format!("commit {n}\n\nbody {n}")).unwrap();
        }

        let log = repo.log(10).unwrap();
        let summaries: Vec<&str> = log.iter().map(|c| c.summary.as_str()).collect();
        assert_eq!(summaries, vec!["commit 2", "commit 1", "commit 0"]);
        assert_eq!(log[0].description, "body 2");
        assert_eq!(log[0].author_name, "Ada");
        assert_eq!(repo.log(2).unwrap().len(), 2);
        assert_eq!(repo.log_from("HEAD~1", 10).unwrap().len(), 2);

        let info = repo.commit_info("HEAD~2").unwrap();
        assert_eq!(info.summary, "commit 0");
        assert!(info.parents.is_empty());
    }

    #[test]
    fn bad_reference_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let err = repo.resolve("no-such-branch").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvalidInput);

        let absent = ObjectId::from_bytes(b"absent").to_hex();
        let err = repo.diff(&absent, &absent).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::StorageInconsistency);
    }

    #[test]
    fn config_file_sets_context_width() {
        let dir = tempfile::tempdir().unwrap();
        let mut repo = Repository::init(dir.path()).unwrap();
        write(dir.path(), "a.txt", "1\n2\n3\n4\n5\n");
        repo.commit(AUTHOR, "lines").unwrap();
        write(dir.path(), ".wt/config.toml", "context_lines = 0\n");
        write(dir.path(), "a.txt", "1\n2\nthree\n4\n5\n");

        let repo = Repository::open(dir.path()).unwrap();
        assert_eq!(repo.config().context_lines, 0);
        let records = repo.diff_head().unwrap();
        assert!(records[0].body.as_str().ends_with("@@ -3,1 +3,1 @@\n-3\n+three\n"));
    }
}
