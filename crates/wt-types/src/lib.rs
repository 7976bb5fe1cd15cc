//! Foundation types for worktally.
//!
//! Every other `wt-*` crate depends on `wt-types` for the content-addressed
//! identifier shared by blobs, trees and commits.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Content-addressed identifier (BLAKE3 hash)
//! - [`TypeError`]: Parse failures for identifiers

pub mod error;
pub mod object;

pub use error::TypeError;
pub use object::ObjectId;
