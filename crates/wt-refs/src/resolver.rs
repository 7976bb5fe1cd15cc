//! Reference-expression resolution.
//!
//! An expression is a base name optionally followed by `~N`:
//!
//! ```text
//! ref      := base ( '~' count? )?
//! base     := full-id | canonical-ref | short-name
//! ```
//!
//! The base is matched "do what I mean" style against a fixed list of
//! candidates, and `~N` then walks `N` steps along first-parent lineage.

use tracing::debug;
use wt_store::{Commit, ObjectKind, ObjectStore};
use wt_types::ObjectId;

use crate::error::{RefError, Result};
use crate::traits::RefStore;

/// Resolves reference expressions to commit ids.
///
/// Borrows both stores read-only; resolution never writes anything.
pub struct RefResolver<'a> {
    refs: &'a dyn RefStore,
    objects: &'a dyn ObjectStore,
}

impl<'a> RefResolver<'a> {
    /// Create a resolver over the given stores.
    pub fn new(refs: &'a dyn RefStore, objects: &'a dyn ObjectStore) -> Self {
        Self { refs, objects }
    }

    /// Canonical names tried for `name`, in priority order.
    pub fn candidates(name: &str) -> [String; 5] {
        [
            format!("refs/{name}"),
            format!("refs/tags/{name}"),
            format!("refs/heads/{name}"),
            format!("refs/remotes/{name}"),
            format!("refs/remotes/{name}/HEAD"),
        ]
    }

    /// Resolve `reference` to the id of a commit present in the object store.
    ///
    /// `~0` is a no-op and a bare `~` means `~1`. Walking past the root
    /// commit stops at the root.
    pub fn resolve(&self, reference: &str) -> Result<ObjectId> {
        let unresolved = || RefError::UnresolvedReference {
            reference: reference.to_string(),
        };

        let (base, count) = match reference.split_once('~') {
            None => (reference, 0),
            Some((base, "")) => (base, 1),
            Some((base, count)) => (base, count.parse::<usize>().map_err(|_| unresolved())?),
        };

        let start = self.resolve_base(base).map_err(|e| match e {
            RefError::UnresolvedReference { .. } => unresolved(),
            other => other,
        })?;
        let id = self.walk_first_parent(start, count)?;
        debug!(reference, id = %id.short_hex(), "resolved reference");
        Ok(id)
    }

    /// Resolve a base name without any ancestor suffix.
    pub fn resolve_base(&self, base: &str) -> Result<ObjectId> {
        if base.is_empty() {
            return Err(RefError::UnresolvedReference {
                reference: base.to_string(),
            });
        }

        let mut absent_id = None;
        if ObjectId::looks_like_id(base) {
            let id = ObjectId::from_hex(base).map_err(|_| RefError::UnresolvedReference {
                reference: base.to_string(),
            })?;
            if self.objects.exists(&id)? {
                return Ok(id);
            }
            absent_id = Some(id);
        }

        if let Some(id) = self.refs.resolve_name(base)? {
            return Ok(id);
        }
        for candidate in Self::candidates(base) {
            if let Some(id) = self.refs.resolve_name(&candidate)? {
                debug!(base, candidate = %candidate, "matched ref");
                return Ok(id);
            }
        }

        match absent_id {
            Some(id) => Err(RefError::MissingSnapshot(id)),
            None => Err(RefError::UnresolvedReference {
                reference: base.to_string(),
            }),
        }
    }

    /// Take up to `steps` first-parent steps from `start`.
    ///
    /// Stops early at a root commit and returns it.
    pub fn walk_first_parent(&self, start: ObjectId, steps: usize) -> Result<ObjectId> {
        let mut current = start;
        let mut commit = self.load_commit(&current)?;
        for taken in 0..steps {
            match commit.first_parent().copied() {
                Some(parent) => {
                    commit = self.load_commit(&parent)?;
                    current = parent;
                }
                None => {
                    debug!(
                        start = %start.short_hex(),
                        requested = steps,
                        taken,
                        "history exhausted, stopping at root commit"
                    );
                    break;
                }
            }
        }
        Ok(current)
    }

    /// Load a commit, distinguishing missing objects from non-commits.
    pub fn load_commit(&self, id: &ObjectId) -> Result<Commit> {
        let object = self
            .objects
            .read(id)?
            .ok_or(RefError::MissingSnapshot(*id))?;
        if object.kind != ObjectKind::Commit {
            return Err(RefError::NotACommit(*id));
        }
        Ok(Commit::from_stored_object(&object)?)
    }
}
