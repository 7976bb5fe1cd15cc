//! Error types for the diff crate.

use wt_store::StoreError;
use wt_types::ObjectId;

/// Errors that can occur during diff operations.
///
/// Any error aborts the whole diff; callers never see partial output.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A snapshot (commit) is not present in the object store.
    #[error("snapshot {0} is missing from the object store")]
    MissingSnapshot(ObjectId),

    /// The id names an object that is not a commit.
    #[error("object {0} is not a commit")]
    NotACommit(ObjectId),

    /// A tree or blob referenced by a snapshot is missing.
    #[error("object {0} referenced by a snapshot is missing")]
    MissingObject(ObjectId),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Working-directory access failed.
    #[error(transparent)]
    Index(#[from] wt_index::IndexError),
}

impl DiffError {
    /// Map a store error, turning absent objects into [`DiffError::MissingObject`].
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => DiffError::MissingObject(id),
            other => DiffError::Store(other),
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
