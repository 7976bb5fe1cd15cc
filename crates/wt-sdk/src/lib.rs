//! High-level SDK for worktally.
//!
//! [`Repository`] ties a working directory to its object store, refs and
//! index, and answers the everyday questions: what is on disk, what is
//! ignored or untracked, what changed since a snapshot, and what the diff
//! looks like.

pub mod commit;
pub mod config;
pub mod error;
pub mod repository;

pub use commit::{split_name_email, CommitInfo};
pub use config::{RepoConfig, CONFIG_FILE, DEFAULT_CONTROL_DIR};
pub use error::{ErrorCategory, SdkError, SdkResult};
pub use repository::{RepoSource, Repository, DEFAULT_BRANCH};

// Re-export key types
pub use wt_diff::{DiffBody, DiffFormat, DiffOutput, DiffRecord};
pub use wt_index::{ChangeKind, ChangeRecord, ChangeSet, StatusEntry, WorkdirStatus};
pub use wt_types::ObjectId;
