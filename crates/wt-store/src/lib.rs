//! Content-addressed object storage for worktally.
//!
//! Every piece of recorded state (file contents, directory listings and
//! commits) is stored as an immutable object identified by its BLAKE3 hash,
//! domain-separated by object kind.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file contents
//! - [`Tree`] -- directory listing mapping names to object references
//! - [`Commit`] -- a root tree plus parents, authorship and message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and scratch data
//! - [`FsObjectStore`] -- loose objects on disk under the control directory
//!
//! [`flatten_tree`] turns a root tree into a path-keyed map of file
//! [`Entry`] values, bounded by a maximum nesting depth.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;
pub mod walk;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, Entry, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
pub use walk::{build_tree, flatten_tree, FlatTree};
