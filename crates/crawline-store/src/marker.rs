//! Processed-marker store: content-addressed dedup signals.
//!
//! A marker is a zero-length object whose existence at a derived key
//! means "this (url, timestamp) identity has been handled." Markers are
//! write-once and never deleted by this system.

use sha2::{Digest, Sha256};

use crate::object_store::{ObjectStore, StoreError};

/// Suffix for marker objects
const MARKER_SUFFIX: &str = ".marker";

/// Derive the marker key for a (url, timestamp) identity:
/// `hex(SHA-256(url + ":" + timestamp)) + ".marker"`.
///
/// Pure and deterministic. Empty inputs are rejected before any storage
/// call is made.
pub fn marker_key(url: &str, timestamp: &str) -> Result<String, StoreError> {
    if url.is_empty() {
        return Err(StoreError::InvalidKey("empty url"));
    }
    if timestamp.is_empty() {
        return Err(StoreError::InvalidKey("empty timestamp"));
    }
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b":");
    hasher.update(timestamp.as_bytes());
    let digest = hasher.finalize();
    let mut key = String::with_capacity(64 + MARKER_SUFFIX.len());
    for byte in digest {
        key.push_str(&format!("{byte:02x}"));
    }
    key.push_str(MARKER_SUFFIX);
    Ok(key)
}

/// Dedup tracker over any object store.
pub struct MarkerStore<S> {
    store: S,
}

impl<S: ObjectStore> MarkerStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Whether this identity already carries a marker.
    pub fn is_processed(&self, url: &str, timestamp: &str) -> Result<bool, StoreError> {
        let key = marker_key(url, timestamp)?;
        self.store.exists(&key)
    }

    /// Write the marker. Idempotent: a second write overwrites an
    /// equivalent empty object.
    pub fn mark_processed(&self, url: &str, timestamp: &str) -> Result<(), StoreError> {
        let key = marker_key(url, timestamp)?;
        self.store.put(&key, b"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::FsObjectStore;

    #[test]
    fn key_is_deterministic() {
        let a = marker_key("com,example)/", "20240722120756").unwrap();
        let b = marker_key("com,example)/", "20240722120756").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn key_depends_on_url() {
        let a = marker_key("com,example)/", "20240722120756").unwrap();
        let b = marker_key("com,example)/page", "20240722120756").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn key_depends_on_timestamp() {
        let a = marker_key("com,example)/", "20240722120756").unwrap();
        let b = marker_key("com,example)/", "20240722120757").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn key_shape() {
        let key = marker_key("com,example)/", "20240722120756").unwrap();
        assert!(key.ends_with(".marker"));
        // 64 hex chars + suffix
        assert_eq!(key.len(), 64 + ".marker".len());
        assert!(key[..64].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn empty_url_rejected() {
        assert!(matches!(
            marker_key("", "20240722120756").unwrap_err(),
            StoreError::InvalidKey(_)
        ));
    }

    #[test]
    fn empty_timestamp_rejected() {
        assert!(matches!(
            marker_key("com,example)/", "").unwrap_err(),
            StoreError::InvalidKey(_)
        ));
    }

    #[test]
    fn mark_then_exists() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = MarkerStore::new(FsObjectStore::new(dir.path()).unwrap());
        assert!(!tracker.is_processed("com,example)/", "20240722120756").unwrap());
        tracker.mark_processed("com,example)/", "20240722120756").unwrap();
        assert!(tracker.is_processed("com,example)/", "20240722120756").unwrap());
    }

    #[test]
    fn marking_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = MarkerStore::new(FsObjectStore::new(dir.path()).unwrap());
        tracker.mark_processed("com,example)/", "20240722120756").unwrap();
        tracker.mark_processed("com,example)/", "20240722120756").unwrap();
        assert!(tracker.is_processed("com,example)/", "20240722120756").unwrap());
        // a third check is unaffected by how many times mark ran
        assert!(tracker.is_processed("com,example)/", "20240722120756").unwrap());
    }
}
