use wt_types::ObjectId;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: computed {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// Attempted to write a null object ID.
    #[error("cannot store object with null ID")]
    NullObjectId,

    /// A path is used both as a file and as a directory.
    #[error("path conflict at '{0}'")]
    PathConflict(String),

    /// A tree nests deeper than the configured limit.
    #[error("tree nesting exceeds {max_depth} levels at '{path}'")]
    DepthExceeded { path: String, max_depth: usize },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
