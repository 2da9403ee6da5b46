//! Tokenized-document persistence under freshly generated keys.
//!
//! Every stored artifact gets a new uuid key, so concurrent workers and
//! batch redeliveries never collide on a write. A duplicate store after
//! redelivery wastes space, nothing more.

use uuid::Uuid;

use crate::object_store::{ObjectStore, StoreError};

/// Write-once store for serialized tokenized documents.
pub struct DocumentStore<S> {
    store: S,
}

impl<S: ObjectStore> DocumentStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persist a serialized document under a fresh `{uuid}.json` key.
    /// Returns the key.
    pub fn store(&self, serialized: &[u8]) -> Result<String, StoreError> {
        let key = format!("{}.json", Uuid::new_v4());
        self.store.put(&key, serialized)?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::FsObjectStore;

    #[test]
    fn store_returns_readable_key() {
        let dir = tempfile::tempdir().unwrap();
        let docs = DocumentStore::new(FsObjectStore::new(dir.path()).unwrap());
        let key = docs.store(b"{\"chunks\":[]}").unwrap();
        assert!(key.ends_with(".json"));
        let fs = FsObjectStore::new(dir.path()).unwrap();
        assert_eq!(fs.get(&key).unwrap(), b"{\"chunks\":[]}");
    }

    #[test]
    fn keys_are_fresh_per_store() {
        let dir = tempfile::tempdir().unwrap();
        let docs = DocumentStore::new(FsObjectStore::new(dir.path()).unwrap());
        let a = docs.store(b"{}").unwrap();
        let b = docs.store(b"{}").unwrap();
        assert_ne!(a, b);
    }
}
