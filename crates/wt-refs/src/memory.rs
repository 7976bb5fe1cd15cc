//! In-memory reference store for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use wt_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::{validate_branch_name, validate_ref_name};
use crate::traits::RefStore;
use crate::types::{branch_ref, Head, Ref, RefKind};

/// An in-memory implementation of [`RefStore`].
///
/// All data lives in a `BTreeMap` behind a `RwLock` and is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, Ref>>,
    head: RwLock<Option<Head>>,
}

fn poisoned<E: std::fmt::Display>(e: E) -> RefError {
    RefError::State(format!("lock poisoned: {e}"))
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs.get(name).cloned())
    }

    fn write_ref(&self, name: &str, reference: &Ref) -> Result<()> {
        validate_ref_name(name)?;
        let mut refs = self.refs.write().map_err(poisoned)?;

        if RefKind::of(name) == RefKind::Tag {
            if let Some(existing) = refs.get(name) {
                if existing != reference {
                    return Err(RefError::TagImmutable {
                        name: name.to_string(),
                    });
                }
            }
        }

        refs.insert(name.to_string(), reference.clone());
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        if let Some(Head::Symbolic(current)) = self.head()? {
            if name == branch_ref(&current) {
                return Err(RefError::DeleteCurrentBranch { name: current });
            }
        }
        let mut refs = self.refs.write().map_err(poisoned)?;
        Ok(refs.remove(name).is_some())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn head(&self) -> Result<Option<Head>> {
        let head = self.head.read().map_err(poisoned)?;
        Ok(head.clone())
    }

    fn set_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        let mut head = self.head.write().map_err(poisoned)?;
        *head = Some(Head::Symbolic(branch.to_string()));
        Ok(())
    }

    fn set_head_detached(&self, id: ObjectId) -> Result<()> {
        let mut head = self.head.write().map_err(poisoned)?;
        *head = Some(Head::Detached(id));
        Ok(())
    }
}
