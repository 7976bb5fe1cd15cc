//! Diff engine for worktally.
//!
//! Compares a recorded snapshot with another snapshot or with the working
//! directory and renders one record per differing path.
//!
//! # Key Types
//!
//! - [`DiffEngine`] / [`DiffRecord`] -- per-path records, text or binary
//! - [`TreeDiff`] / [`TreeChange`] -- path pairing of two flattened trees
//! - [`BlobDiff`] / [`DiffHunk`] / [`DiffLine`] -- line-level blob diff
//! - [`DiffOutput`] -- records, path map or one classic unified text

pub mod blob_diff;
pub mod engine;
pub mod error;
pub mod format;
pub mod tree_diff;

pub use blob_diff::{
    diff_blobs, is_binary, render_unified, BlobDiff, DiffHunk, DiffLine, DEFAULT_BINARY_PROBE,
    DEFAULT_CONTEXT_LINES, NO_NEWLINE_MARKER,
};
pub use engine::{DiffBody, DiffEngine, DiffMode, DiffOptions, DiffRecord, DiffTarget};
pub use error::{DiffError, DiffResult};
pub use format::{DiffFormat, DiffOutput};
pub use tree_diff::{diff_flat, diff_trees, TreeChange, TreeDiff};
