//! Working-directory enumeration.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use wt_store::{Blob, Entry, EntryMode};

use crate::error::{IndexError, IndexResult};
use crate::ignore::IgnoreFilter;

/// Default limit on directory nesting below the root.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Scanner tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOptions {
    /// Directories nested deeper than this are skipped.
    pub max_depth: usize,
    /// Follow symbolic links. Links back to an ancestor directory are
    /// always skipped.
    pub follow_symlinks: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            follow_symlinks: true,
        }
    }
}

/// Enumerates files under a working root and partitions them with an
/// [`IgnoreFilter`].
///
/// Every call walks the disk again; nothing is cached. Unreadable subtrees,
/// symlink cycles and over-deep directories are logged and treated as empty.
#[derive(Debug, Clone)]
pub struct PathScanner {
    root: PathBuf,
    filter: IgnoreFilter,
    options: ScanOptions,
}

/// Convert a path relative to the root into `/`-separated form.
///
/// Returns `None` for non-UTF-8 names.
pub fn to_slash_path(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

impl PathScanner {
    /// Create a scanner with default options.
    pub fn new(root: impl Into<PathBuf>, filter: IgnoreFilter) -> Self {
        Self::with_options(root, filter, ScanOptions::default())
    }

    /// Create a scanner with explicit options.
    pub fn with_options(root: impl Into<PathBuf>, filter: IgnoreFilter, options: ScanOptions) -> Self {
        Self {
            root: root.into(),
            filter,
            options,
        }
    }

    /// The working root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The ignore rules in use.
    pub fn filter(&self) -> &IgnoreFilter {
        &self.filter
    }

    // ---------------------------------------------------------------
    // Path sets
    // ---------------------------------------------------------------

    /// Every regular file under the root, unfiltered.
    pub fn raw_files(&self) -> BTreeSet<String> {
        let mut files = BTreeSet::new();
        let mut walker = WalkDir::new(&self.root)
            .follow_links(self.options.follow_symlinks)
            .into_iter();

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                    if let Some(ancestor) = err.loop_ancestor() {
                        warn!(path = %path, ancestor = %ancestor.display(), "skipping symlink cycle");
                    } else {
                        warn!(path = %path, error = %err, "skipping unreadable path");
                    }
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if entry.depth() > self.options.max_depth {
                    warn!(
                        path = %entry.path().display(),
                        max_depth = self.options.max_depth,
                        "skipping directory nested too deeply"
                    );
                    walker.skip_current_dir();
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).ok().and_then(to_slash_path);
            match relative {
                Some(path) if !path.is_empty() => {
                    files.insert(path);
                }
                _ => debug!(path = %entry.path().display(), "skipping non UTF-8 path"),
            }
        }

        files
    }

    /// Files matched by the ignore rules.
    pub fn ignored_files(&self) -> BTreeSet<String> {
        self.raw_files()
            .into_iter()
            .filter(|p| self.filter.is_ignored(p))
            .collect()
    }

    /// Raw files minus ignored files.
    pub fn trackable_files(&self) -> BTreeSet<String> {
        self.raw_files()
            .into_iter()
            .filter(|p| !self.filter.is_ignored(p))
            .collect()
    }

    /// Trackable files not in `tracked`.
    pub fn untracked_files(&self, tracked: &BTreeSet<String>) -> BTreeSet<String> {
        self.trackable_files()
            .into_iter()
            .filter(|p| !tracked.contains(p))
            .collect()
    }

    // ---------------------------------------------------------------
    // File content
    // ---------------------------------------------------------------

    /// Absolute location of a relative path.
    pub fn absolute(&self, path: &str) -> PathBuf {
        path.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Read the bytes of a working file.
    pub fn read_file(&self, path: &str) -> IndexResult<Vec<u8>> {
        fs::read(self.absolute(path)).map_err(|source| IndexError::UnreadablePath {
            path: path.to_string(),
            source,
        })
    }

    /// Mode of a working file, following symlinks.
    pub fn file_mode(&self, path: &str) -> IndexResult<EntryMode> {
        let meta = fs::metadata(self.absolute(path)).map_err(|source| IndexError::UnreadablePath {
            path: path.to_string(),
            source,
        })?;
        Ok(mode_of(&meta))
    }

    /// Hash a working file into an [`Entry`] without storing anything.
    pub fn hash_file(&self, path: &str) -> IndexResult<Entry> {
        let mode = self.file_mode(path)?;
        let data = self.read_file(path)?;
        Ok(Entry::new(path, mode, Blob::id_of(&data)))
    }
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> EntryMode {
    use std::os::unix::fs::PermissionsExt;
    EntryMode::from_permissions(meta.permissions().mode())
}

#[cfg(not(unix))]
fn mode_of(_meta: &fs::Metadata) -> EntryMode {
    EntryMode::Regular
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn scanner(root: &Path) -> PathScanner {
        let mut patterns = IgnoreFilter::builtin_patterns(".wt");
        patterns.push("*.log".into());
        PathScanner::new(root, IgnoreFilter::new(patterns))
    }

    #[test]
    fn raw_trackable_ignored_untracked() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", b"hello");
        write(dir.path(), "src/lib.rs", b"lib");
        write(dir.path(), "debug.log", b"log");
        write(dir.path(), ".wt/HEAD", b"ref: refs/heads/main\n");
        fs::create_dir_all(dir.path().join("empty/dir")).unwrap();

        let s = scanner(dir.path());
        assert_eq!(
            s.raw_files(),
            set(&[".wt/HEAD", "a.txt", "debug.log", "src/lib.rs"])
        );
        assert_eq!(s.ignored_files(), set(&[".wt/HEAD", "debug.log"]));
        assert_eq!(s.trackable_files(), set(&["a.txt", "src/lib.rs"]));
        assert_eq!(s.untracked_files(&set(&["a.txt"])), set(&["src/lib.rs"]));
    }

    #[test]
    fn single_untracked_file_in_empty_repo() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".wt")).unwrap();
        write(dir.path(), "a.txt", b"hello");
        let s = scanner(dir.path());
        assert_eq!(s.trackable_files(), set(&["a.txt"]));
        assert_eq!(s.untracked_files(&BTreeSet::new()), set(&["a.txt"]));
    }

    #[test]
    fn hash_is_content_based() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", b"same");
        write(dir.path(), "b.txt", b"same");
        let s = scanner(dir.path());
        let a = s.hash_file("a.txt").unwrap();
        let b = s.hash_file("b.txt").unwrap();
        assert_eq!(a.object_id, b.object_id);
        assert_eq!(a.object_id, Blob::id_of(b"same"));
        assert_eq!(a.path, "a.txt");
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let s = scanner(dir.path());
        assert!(matches!(
            s.hash_file("nope.txt"),
            Err(IndexError::UnreadablePath { path, .. }) if path == "nope.txt"
        ));
    }

    #[test]
    fn depth_limit_skips_deep_subtrees() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "top.txt", b"t");
        write(dir.path(), "a/one.txt", b"1");
        write(dir.path(), "a/b/two.txt", b"2");
        let s = PathScanner::with_options(
            dir.path(),
            IgnoreFilter::default(),
            ScanOptions {
                max_depth: 1,
                follow_symlinks: true,
            },
        );
        assert_eq!(s.raw_files(), set(&["a/one.txt", "top.txt"]));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subtree_counts_as_empty() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", b"a");
        write(dir.path(), "locked/inner.txt", b"secret");
        write(dir.path(), "z/last.txt", b"z");
        let locked = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permission bits do not bind this user (root).
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let files = scanner(dir.path()).raw_files();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(files, set(&["a.txt", "z/last.txt"]));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/file.txt", b"x");
        std::os::unix::fs::symlink(dir.path().join("a"), dir.path().join("a/loop")).unwrap();
        let s = scanner(dir.path());
        assert_eq!(s.raw_files(), set(&["a/file.txt"]));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_followed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "real.txt", b"content");
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt"))
            .unwrap();
        let s = scanner(dir.path());
        assert_eq!(s.raw_files(), set(&["link.txt", "real.txt"]));
        assert_eq!(
            s.hash_file("link.txt").unwrap().object_id,
            s.hash_file("real.txt").unwrap().object_id
        );
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_sets_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "run.sh", b"#!/bin/sh\n");
        fs::set_permissions(dir.path().join("run.sh"), fs::Permissions::from_mode(0o755)).unwrap();
        let s = scanner(dir.path());
        assert_eq!(s.file_mode("run.sh").unwrap(), EntryMode::Executable);
    }

    #[test]
    fn slash_paths() {
        assert_eq!(to_slash_path(Path::new("a/b/c.txt")).as_deref(), Some("a/b/c.txt"));
        assert_eq!(to_slash_path(Path::new("./a")).as_deref(), Some("a"));
        assert_eq!(to_slash_path(Path::new("../a")), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn trackable_is_raw_minus_ignored(
            names in proptest::collection::btree_set("[a-d]{1,3}(\\.log|\\.txt)?", 0..8),
            tracked in proptest::collection::btree_set("[a-d]{1,3}(\\.txt)?", 0..4),
        ) {
            let dir = tempfile::tempdir().unwrap();
            for name in &names {
                write(dir.path(), &format!("d/{name}"), name.as_bytes());
            }
            let s = scanner(dir.path());
            let raw = s.raw_files();
            let ignored = s.ignored_files();
            let trackable = s.trackable_files();
            let expected: BTreeSet<String> = raw.difference(&ignored).cloned().collect();
            prop_assert_eq!(&trackable, &expected);

            let tracked: BTreeSet<String> = tracked.into_iter().map(|t| format!("d/{t}")).collect();
            let untracked = s.untracked_files(&tracked);
            prop_assert!(untracked.is_subset(&trackable));
            prop_assert!(untracked.is_disjoint(&tracked));
        }
    }
}
