//! Blob-level diff: line-by-line comparison of file contents.
//!
//! Uses the `similar` crate (Myers diff algorithm) to produce structured
//! hunks with context lines, and renders them in unified format.

use std::fmt::Write as _;

use similar::{ChangeTag, TextDiff};

/// Default number of bytes inspected for binary detection.
pub const DEFAULT_BINARY_PROBE: usize = 8000;

/// Default number of context lines around each hunk.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Marker printed after a line that ends the content without a newline.
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Returns `true` if `data` has a NUL byte within its first `probe_len`
/// bytes, or is not valid UTF-8.
pub fn is_binary(data: &[u8], probe_len: usize) -> bool {
    data.iter().take(probe_len).any(|b| *b == 0) || std::str::from_utf8(data).is_err()
}

/// The result of diffing two blobs (file contents).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobDiff {
    /// The diff hunks.
    pub hunks: Vec<DiffHunk>,
    /// Total number of lines in the old content.
    pub old_lines: usize,
    /// Total number of lines in the new content.
    pub new_lines: usize,
}

impl BlobDiff {
    /// Returns `true` if the two blobs are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Total number of lines added across all hunks.
    pub fn additions(&self) -> usize {
        self.lines().filter(|l| matches!(l, DiffLine::Added(_))).count()
    }

    /// Total number of lines removed across all hunks.
    pub fn deletions(&self) -> usize {
        self.lines().filter(|l| matches!(l, DiffLine::Removed(_))).count()
    }

    fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks.iter().flat_map(|h| &h.lines)
    }
}

/// A contiguous region of changes in a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old content where this hunk starts (1-based).
    pub old_start: usize,
    /// Number of lines from the old content in this hunk.
    pub old_count: usize,
    /// Line number in the new content where this hunk starts (1-based).
    pub new_start: usize,
    /// Number of lines from the new content in this hunk.
    pub new_count: usize,
    /// The individual diff lines in this hunk.
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// The `@@ -a,b +c,d @@` header. An empty side starts at the line
    /// before the hunk, as in `diff -u`.
    pub fn header(&self) -> String {
        let start = |start: usize, count: usize| if count == 0 { start - 1 } else { start };
        format!(
            "@@ -{},{} +{},{} @@",
            start(self.old_start, self.old_count),
            self.old_count,
            start(self.new_start, self.new_count),
            self.new_count
        )
    }
}

/// A single line in a diff hunk, without its line terminator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A line present in both old and new (context).
    Context(String),
    /// A line added in the new content.
    Added(String),
    /// A line removed from the old content.
    Removed(String),
    /// The preceding line is the last one and has no terminator.
    NoNewline,
}

/// Compute a line-by-line diff between two byte slices.
///
/// Content that is not valid UTF-8 is decoded lossily; callers screen out
/// binary content with [`is_binary`] first.
pub fn diff_blobs(old: &[u8], new: &[u8], context_lines: usize) -> BlobDiff {
    let old_str = String::from_utf8_lossy(old);
    let new_str = String::from_utf8_lossy(new);
    let old_lines = old_str.lines().count();
    let new_lines = new_str.lines().count();

    if old == new {
        return BlobDiff {
            hunks: Vec::new(),
            old_lines,
            new_lines,
        };
    }

    let text_diff = TextDiff::from_lines(old_str.as_ref(), new_str.as_ref());
    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(context_lines) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };

        for op in &group {
            for change in text_diff.iter_changes(op) {
                let value = change.value();
                let text = value.strip_suffix('\n').unwrap_or(value).to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
                if change.missing_newline() {
                    hunk.lines.push(DiffLine::NoNewline);
                }
            }
        }
        hunks.push(hunk);
    }

    BlobDiff {
        hunks,
        old_lines,
        new_lines,
    }
}

/// Render a diff in unified format. `None` labels print as `/dev/null`.
pub fn render_unified(old_label: Option<&str>, new_label: Option<&str>, diff: &BlobDiff) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- {}", old_label.map_or("/dev/null".to_string(), |l| format!("a/{l}")));
    let _ = writeln!(out, "+++ {}", new_label.map_or("/dev/null".to_string(), |l| format!("b/{l}")));
    for hunk in &diff.hunks {
        let _ = writeln!(out, "{}", hunk.header());
        for line in &hunk.lines {
            let _ = match line {
                DiffLine::Context(text) => writeln!(out, " {text}"),
                DiffLine::Added(text) => writeln!(out, "+{text}"),
                DiffLine::Removed(text) => writeln!(out, "-{text}"),
                DiffLine::NoNewline => writeln!(out, "{NO_NEWLINE_MARKER}"),
            };
        }
    }
    out
}
