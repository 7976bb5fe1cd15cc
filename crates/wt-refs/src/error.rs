//! Error types for reference operations.

use thiserror::Error;
use wt_types::ObjectId;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// The branch name is invalid.
    #[error("invalid branch name: {name}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// A canonical ref name is malformed.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// A tag is immutable and cannot be moved.
    #[error("tag is immutable: {name}")]
    TagImmutable { name: String },

    /// Cannot delete the currently checked-out branch.
    #[error("cannot delete current branch: {name}")]
    DeleteCurrentBranch { name: String },

    /// Symbolic refs point at each other, or nest too deeply.
    #[error("symbolic ref loop at {name}")]
    SymbolicLoop { name: String },

    /// A reference expression matches no known snapshot or ref.
    #[error("unresolved reference: '{reference}'")]
    UnresolvedReference { reference: String },

    /// An id that looks valid is not present in the object store.
    #[error("snapshot {0} is missing from the object store")]
    MissingSnapshot(ObjectId),

    /// The resolved object exists but is not a commit.
    #[error("object {0} is not a commit")]
    NotACommit(ObjectId),

    /// A ref file could not be parsed.
    #[error("corrupt ref {name}: {reason}")]
    Corrupt { name: String, reason: String },

    /// Object store failure while walking history.
    #[error("store error: {0}")]
    Store(#[from] wt_store::StoreError),

    /// Lock poisoned or similar internal state failure.
    #[error("internal state error: {0}")]
    State(String),

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
