use thiserror::Error;
use wt_diff::DiffError;
use wt_index::IndexError;
use wt_refs::RefError;
use wt_store::StoreError;

/// Broad classes of failure, for choosing a user-facing message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The repository has no commit to compare against.
    NothingToCompare,
    /// A reference, path or setting supplied by the caller is bad.
    InvalidInput,
    /// The stores disagree with themselves: missing or corrupt objects.
    StorageInconsistency,
    /// The filesystem refused a read or write.
    Io,
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("repository not initialized at {0}")]
    NotInitialized(String),

    #[error("repository already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("repository has no commits yet")]
    EmptyRepository,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref error: {0}")]
    Ref(#[from] RefError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdkError {
    /// Which class of failure this is.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SdkError::EmptyRepository => ErrorCategory::NothingToCompare,
            SdkError::NotInitialized(_) | SdkError::AlreadyInitialized(_) | SdkError::Config(_) => {
                ErrorCategory::InvalidInput
            }
            SdkError::Store(e) => store_category(e),
            SdkError::Ref(e) => ref_category(e),
            SdkError::Index(e) => index_category(e),
            SdkError::Diff(e) => match e {
                DiffError::MissingSnapshot(_) | DiffError::MissingObject(_) => {
                    ErrorCategory::StorageInconsistency
                }
                DiffError::NotACommit(_) => ErrorCategory::InvalidInput,
                DiffError::Store(e) => store_category(e),
                DiffError::Index(e) => index_category(e),
            },
            SdkError::Io(_) => ErrorCategory::Io,
        }
    }
}

fn store_category(err: &StoreError) -> ErrorCategory {
    match err {
        StoreError::Io(_) | StoreError::DepthExceeded { .. } => ErrorCategory::Io,
        StoreError::NullObjectId | StoreError::PathConflict(_) => ErrorCategory::InvalidInput,
        _ => ErrorCategory::StorageInconsistency,
    }
}

fn ref_category(err: &RefError) -> ErrorCategory {
    match err {
        RefError::MissingSnapshot(_) | RefError::Corrupt { .. } | RefError::State(_) => {
            ErrorCategory::StorageInconsistency
        }
        RefError::Store(e) => store_category(e),
        RefError::Io(_) => ErrorCategory::Io,
        _ => ErrorCategory::InvalidInput,
    }
}

fn index_category(err: &IndexError) -> ErrorCategory {
    match err {
        IndexError::PathNotFound(_) | IndexError::InvalidPath(_) => ErrorCategory::InvalidInput,
        IndexError::UnreadablePath { .. } => ErrorCategory::Io,
        IndexError::MissingSnapshot(_) => ErrorCategory::StorageInconsistency,
        IndexError::Store(e) => store_category(e),
    }
}

pub type SdkResult<T> = Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;
    use wt_types::ObjectId;

    #[test]
    fn categories_separate_empty_bad_input_and_corruption() {
        assert_eq!(SdkError::EmptyRepository.category(), ErrorCategory::NothingToCompare);

        let unresolved = RefError::UnresolvedReference {
            reference: "nope".into(),
        };
        assert_eq!(SdkError::from(unresolved).category(), ErrorCategory::InvalidInput);

        let missing = RefError::MissingSnapshot(ObjectId::null());
        assert_eq!(SdkError::from(missing).category(), ErrorCategory::StorageInconsistency);

        let lost = DiffError::MissingObject(ObjectId::null());
        assert_eq!(SdkError::from(lost).category(), ErrorCategory::StorageInconsistency);
    }

    #[test]
    fn nested_store_errors_keep_their_class() {
        let deep = DiffError::Store(StoreError::DepthExceeded {
            path: "a/b".into(),
            max_depth: 1,
        });
        assert_eq!(SdkError::from(deep).category(), ErrorCategory::Io);

        let unreadable = IndexError::UnreadablePath {
            path: "secret".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(SdkError::from(unreadable).category(), ErrorCategory::Io);
    }
}
