//! Volatile object store.
//!
//! Holds objects for tests and for the lifetime of one working-directory
//! diff, where file bytes need ids without touching the on-disk store.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;
use wt_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// An [`ObjectStore`] kept entirely in memory, ordered by id.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single insert or remove; poisoning is ignored.
    fn map(&self) -> RwLockReadGuard<'_, BTreeMap<ObjectId, StoredObject>> {
        self.objects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn map_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<ObjectId, StoredObject>> {
        self.objects.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Ids of every held object, ascending.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.map().keys().copied().collect()
    }

    /// Number of held objects of `kind`.
    pub fn count_of(&self, kind: ObjectKind) -> usize {
        self.map().values().filter(|o| o.kind == kind).count()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.map().get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let mut map = self.map_mut();
        if !map.contains_key(&id) {
            trace!(id = %id.short_hex(), kind = %object.kind, "holding object in memory");
            map.insert(id, object.clone());
        }
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.map().contains_key(id))
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.map_mut().remove(id).is_some())
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
