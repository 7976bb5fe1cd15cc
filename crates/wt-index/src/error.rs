//! Error types for the index crate.

use wt_types::ObjectId;

/// Errors that can occur during scanning, staging and classification.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The specified path was not found in the index.
    #[error("path not found in index: {0}")]
    PathNotFound(String),

    /// An invalid path was provided.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A file or directory could not be read.
    #[error("cannot read '{path}': {source}")]
    UnreadablePath {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The base snapshot is not present in the object store.
    #[error("snapshot {0} is missing from the object store")]
    MissingSnapshot(ObjectId),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] wt_store::StoreError),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
