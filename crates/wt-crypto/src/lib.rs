//! Content hashing for worktally.
//!
//! Provides domain-separated BLAKE3 hashing. The object store, the working
//! directory scanner and the diff engine all derive ids through
//! [`ContentHasher`], so a file on disk and the blob it was committed as
//! always agree on their id.

pub mod hasher;

pub use hasher::ContentHasher;
