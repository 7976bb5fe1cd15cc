//! Core reference types.

use serde::{Deserialize, Serialize};
use wt_types::ObjectId;

/// The value stored under a ref name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ref {
    /// Points straight at a commit.
    Direct(ObjectId),
    /// Names another ref by its canonical name.
    Symbolic(String),
}

impl Ref {
    /// The commit id, if this ref is direct.
    pub fn target_id(&self) -> Option<&ObjectId> {
        match self {
            Ref::Direct(id) => Some(id),
            Ref::Symbolic(_) => None,
        }
    }

    /// Returns `true` for a symbolic ref.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Ref::Symbolic(_))
    }
}

/// The namespace a canonical ref name lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// `refs/heads/*`
    Branch,
    /// `refs/tags/*`
    Tag,
    /// `refs/remotes/*`
    Remote,
    /// Anything else under `refs/`.
    Other,
}

impl RefKind {
    /// Classify a canonical name.
    pub fn of(name: &str) -> Self {
        if name.starts_with("refs/heads/") {
            RefKind::Branch
        } else if name.starts_with("refs/tags/") {
            RefKind::Tag
        } else if name.starts_with("refs/remotes/") {
            RefKind::Remote
        } else {
            RefKind::Other
        }
    }
}

/// Canonical name of a branch (`main` -> `refs/heads/main`).
pub fn branch_ref(branch: &str) -> String {
    format!("refs/heads/{branch}")
}

/// Strip the namespace prefix from a canonical name.
pub fn short_name(name: &str) -> &str {
    ["refs/heads/", "refs/tags/", "refs/remotes/", "refs/"]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}

/// The state of HEAD: either symbolic (pointing to a branch) or detached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Head {
    /// HEAD points to a branch by short name. The branch may not exist yet.
    Symbolic(String),
    /// HEAD is detached, pointing directly to a commit.
    Detached(ObjectId),
}
