//! Working-directory state for worktally.
//!
//! This crate answers which files exist on disk, which are ignored, which
//! are tracked, and how the working directory differs from a recorded
//! snapshot.
//!
//! # Key Types
//!
//! - [`IgnoreFilter`]: glob patterns compiled into one path predicate
//! - [`PathScanner`]: walks the working root into raw, trackable,
//!   ignored and untracked path sets
//! - [`Index`]: the in-memory set of tracked paths; builds nested trees
//! - [`ChangeClassifier`]: added / removed / modified against a commit
//! - [`WorkdirStatus`]: classification plus untracked and ignored sets

pub mod classify;
pub mod entry;
pub mod error;
pub mod ignore;
pub mod index;
pub mod scan;
pub mod status;

pub use classify::{partition, ChangeClassifier, ChangeKind, ChangePattern, ChangeRecord, ChangeSet};
pub use entry::IndexEntry;
pub use error::{IndexError, IndexResult};
pub use ignore::{parse_patterns, IgnoreFilter};
pub use index::Index;
pub use scan::{PathScanner, ScanOptions, DEFAULT_MAX_DEPTH};
pub use status::{StatusEntry, WorkdirStatus};
