//! Reference management for worktally.
//!
//! Named references (branches, tags, remote-tracking refs and HEAD) are the
//! human-readable entry points into commit history, analogous to git refs.
//!
//! # Architecture
//!
//! - **Branches** (`refs/heads/*`) are mutable pointers to commits.
//! - **Tags** (`refs/tags/*`) are immutable once created.
//! - **Remote refs** (`refs/remotes/<remote>/*`) mirror branches elsewhere;
//!   `refs/remotes/<remote>/HEAD` is usually symbolic.
//! - **HEAD** names the current branch, or is detached at a commit.
//!
//! # Modules
//!
//! - [`error`]: Error types for ref operations
//! - [`types`]: Core ref types: [`Ref`], [`RefKind`], [`Head`]
//! - [`traits`]: The [`RefStore`] trait defining the storage interface
//! - [`names`]: Ref name validation
//! - [`memory`]: In-memory [`InMemoryRefStore`] for tests
//! - [`fs`]: On-disk [`FsRefStore`]
//! - [`resolver`]: [`RefResolver`], turning expressions like `main~2` into
//!   commit ids

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod resolver;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::{validate_branch_name, validate_ref_name};
pub use resolver::RefResolver;
pub use traits::RefStore;
pub use types::{Head, Ref, RefKind};
