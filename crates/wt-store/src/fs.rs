use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use wt_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// Loose-object store on the local file system.
///
/// Each object lives at `<root>/<first two hex chars>/<remaining hex>` and
/// holds a one-line kind header followed by the raw object data. Writes go
/// through a temporary file in the same directory and are renamed into place.
/// Reads re-hash the content and reject anything whose id does not match.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened object store");
        Ok(Self { root })
    }

    /// Directory holding the objects.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    fn encode(object: &StoredObject) -> Vec<u8> {
        let mut buf = Vec::with_capacity(object.data.len() + 8);
        buf.extend_from_slice(object.kind.to_string().as_bytes());
        buf.push(b'\n');
        buf.extend_from_slice(&object.data);
        buf
    }

    fn decode(id: &ObjectId, raw: Vec<u8>) -> StoreResult<StoredObject> {
        let split = raw
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| StoreError::CorruptObject {
                id: *id,
                reason: "missing kind header".into(),
            })?;
        let header = std::str::from_utf8(&raw[..split]).unwrap_or_default();
        let kind = ObjectKind::from_name(header).ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: format!("unknown object kind '{header}'"),
        })?;
        Ok(StoredObject::new(kind, raw[split + 1..].to_vec()))
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        let raw = match fs::read(self.object_path(id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let object = Self::decode(id, raw)?;
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(Some(object))
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        if id.is_null() {
            return Err(StoreError::NullObjectId);
        }
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&Self::encode(object))?;
        tmp.persist(&path).map_err(|e| e.error)?;
        trace!(id = %id.short_hex(), kind = %object.kind, size = object.size, "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
        match fs::remove_file(self.object_path(id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
