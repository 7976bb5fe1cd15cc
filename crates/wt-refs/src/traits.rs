//! The [`RefStore`] trait defining the reference storage interface.

use wt_types::ObjectId;

use crate::error::{RefError, Result};
use crate::types::{branch_ref, Head, Ref};

/// How many symbolic hops are followed before giving up.
pub const MAX_SYMBOLIC_DEPTH: usize = 5;

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`). Names are canonical:
///
/// - `refs/heads/*` for branches
/// - `refs/tags/*` for tags
/// - `refs/remotes/{remote}/*` for remote tracking refs
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/main").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// Write (create or update) a ref at the given canonical name.
    ///
    /// Moving an existing tag to a different target fails with
    /// [`RefError::TagImmutable`].
    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()>;

    /// Delete a ref by canonical name. Returns `Ok(true)` if it existed.
    fn delete_ref(&self, name: &str) -> Result<bool>;

    /// List all refs whose canonical name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>>;

    /// Read the current HEAD state. `Ok(None)` if HEAD has not been set.
    fn head(&self) -> Result<Option<Head>>;

    /// Set HEAD to point at a branch (symbolic ref).
    fn set_head(&self, branch: &str) -> Result<()>;

    /// Set HEAD to a detached state pointing directly at a commit.
    fn set_head_detached(&self, id: ObjectId) -> Result<()>;

    // ------------------------------------------------------------------
    // Provided
    // ------------------------------------------------------------------

    /// List all branch refs.
    fn branches(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs("refs/heads/")
    }

    /// List all tag refs.
    fn tags(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs("refs/tags/")
    }

    /// List all known remote names.
    fn remotes(&self) -> Result<Vec<String>> {
        let refs = self.list_refs("refs/remotes/")?;
        let mut remotes: Vec<String> = refs
            .iter()
            .filter_map(|(name, _)| {
                let rest = name.strip_prefix("refs/remotes/")?;
                Some(rest.split('/').next()?.to_string())
            })
            .collect();
        remotes.sort();
        remotes.dedup();
        Ok(remotes)
    }

    /// Follow symbolic refs from `name` until a direct target is reached.
    ///
    /// Returns `Ok(None)` if `name`, or any ref it points through, does not
    /// exist.
    fn peel_ref(&self, name: &str) -> Result<Option<ObjectId>> {
        let mut current = name.to_string();
        for _ in 0..=MAX_SYMBOLIC_DEPTH {
            match self.read_ref(&current)? {
                None => return Ok(None),
                Some(Ref::Direct(id)) => return Ok(Some(id)),
                Some(Ref::Symbolic(next)) => current = next,
            }
        }
        Err(RefError::SymbolicLoop {
            name: name.to_string(),
        })
    }

    /// The commit HEAD currently points at.
    ///
    /// `Ok(None)` when HEAD is unset or names a branch with no commits yet.
    fn head_commit(&self) -> Result<Option<ObjectId>> {
        match self.head()? {
            None => Ok(None),
            Some(Head::Detached(id)) => Ok(Some(id)),
            Some(Head::Symbolic(branch)) => self.peel_ref(&branch_ref(&branch)),
        }
    }

    /// The branch HEAD names, if it is not detached.
    fn current_branch(&self) -> Result<Option<String>> {
        Ok(match self.head()? {
            Some(Head::Symbolic(branch)) => Some(branch),
            _ => None,
        })
    }

    /// Resolve one exact name to an id: `HEAD` or a canonical ref name.
    fn resolve_name(&self, name: &str) -> Result<Option<ObjectId>> {
        if name == "HEAD" {
            self.head_commit()
        } else {
            self.peel_ref(name)
        }
    }
}
