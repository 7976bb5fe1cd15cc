use wt_types::ObjectId;

/// BLAKE3 hasher bound to one object kind.
///
/// Each kind hashes in BLAKE3's key-derivation mode under its own context
/// string, and the content length is mixed in ahead of the bytes. Identical
/// bytes stored as a blob and as a tree never share an id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    context: &'static str,
}

impl ContentHasher {
    pub const BLOB: Self = Self::new("worktally 2024 blob v1");
    pub const TREE: Self = Self::new("worktally 2024 tree v1");
    pub const COMMIT: Self = Self::new("worktally 2024 commit v1");

    /// A hasher for a custom context string.
    pub const fn new(context: &'static str) -> Self {
        Self { context }
    }

    /// Id of `data` under this hasher's context.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new_derive_key(self.context);
        hasher.update(&(data.len() as u64).to_le_bytes());
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Returns `true` if `data` hashes to `expected`.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    pub fn context(&self) -> &'static str {
        self.context
    }
}
