//! Ignore rules: shell globs compiled into a single path predicate.
//!
//! Globs follow `fnmatch` semantics: `*` matches any run of characters
//! (including `/`), `?` matches one character and `[...]` is a character
//! class, negated with a leading `!`. A path is ignored when it, or any of
//! its ancestor directories, matches a pattern.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use glob::Pattern;
use tracing::{debug, warn};

use crate::error::{IndexError, IndexResult};

/// Parse ignore-file text: one glob per line, `#` comments, blank lines
/// skipped, trailing `/` dropped.
pub fn parse_patterns(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.trim_end_matches('/').to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Immutable set of ignore patterns.
///
/// Built once from the built-in hidden paths plus the project ignore file;
/// construct a new filter to change the rules.
#[derive(Clone, Debug, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    /// Compile `patterns`. Globs that do not compile are dropped with a
    /// warning.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .filter_map(|pattern| {
                let glob = pattern.as_ref();
                Pattern::new(glob)
                    .map_err(|e| warn!(pattern = glob, error = %e, "dropping malformed ignore pattern"))
                    .ok()
            })
            .collect();
        Self { patterns }
    }

    /// Patterns that hide the control directory.
    pub fn builtin_patterns(control_dir: &str) -> Vec<String> {
        vec![control_dir.to_string(), format!("{control_dir}/*")]
    }

    /// Build the filter for a working root: built-ins, then `ignore_file`
    /// under `root` (missing means no patterns), then `extra`.
    pub fn load(
        root: &Path,
        control_dir: &str,
        ignore_file: &str,
        extra: &[String],
    ) -> IndexResult<Self> {
        let mut patterns = Self::builtin_patterns(control_dir);
        let path = root.join(ignore_file);
        match fs::read_to_string(&path) {
            Ok(text) => patterns.extend(parse_patterns(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = %path.display(), "no ignore file");
            }
            Err(source) => {
                return Err(IndexError::UnreadablePath {
                    path: ignore_file.to_string(),
                    source,
                })
            }
        }
        patterns.extend(extra.iter().cloned());
        Ok(Self::new(patterns))
    }

    /// Returns `true` if `path` (relative, `/`-separated) or any of its
    /// ancestor directories matches a pattern.
    pub fn is_ignored(&self, path: &str) -> bool {
        let matches = |candidate: &str| self.patterns.iter().any(|p| p.matches(candidate));
        matches(path) || path.match_indices('/').any(|(i, _)| matches(&path[..i]))
    }

    /// The patterns that compiled, in order.
    pub fn patterns(&self) -> Vec<&str> {
        self.patterns.iter().map(Pattern::as_str).collect()
    }
}
