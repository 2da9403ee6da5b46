//! Key/value object store contract and filesystem implementation

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

/// Storage retry budget — small and fixed, then the error surfaces typed
const STORE_ATTEMPTS: u32 = 3;

/// Delay between storage retries
const STORE_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Error from a storage operation, distinguishable from transport and
/// decode errors by construction.
#[derive(Debug)]
pub enum StoreError {
    /// Input validation failed before any storage call was made.
    InvalidKey(&'static str),
    /// Key does not exist (only from `get`).
    NotFound(String),
    /// Underlying storage error after the retry budget is exhausted.
    Io(io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(msg) => write!(f, "invalid key: {msg}"),
            Self::NotFound(key) => write!(f, "not found: {key}"),
            Self::Io(e) => write!(f, "storage: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Minimal object-store capability: each operation carries its own retry
/// policy and returns a typed storage error.
pub trait ObjectStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
    fn exists(&self, key: &str) -> Result<bool, StoreError>;
    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Filesystem-backed object store rooted at a base directory.
///
/// Writes go through a tmp file and an atomic rename so a crashed put
/// never leaves a half-written object under its final key.
pub struct FsObjectStore {
    base: PathBuf,
}

impl FsObjectStore {
    pub fn new(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("empty key"));
        }
        if key.contains('/') || key.contains("..") {
            return Err(StoreError::InvalidKey("key must be a flat name"));
        }
        Ok(self.base.join(key))
    }
}

/// Run a storage operation up to [`STORE_ATTEMPTS`] times.
fn with_retry<T>(label: &str, mut op: impl FnMut() -> io::Result<T>) -> Result<T, StoreError> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < STORE_ATTEMPTS => {
                log::debug!("{label}: storage attempt {attempt}/{STORE_ATTEMPTS} failed: {e}");
                attempt += 1;
                std::thread::sleep(STORE_RETRY_DELAY);
            }
            Err(e) => return Err(StoreError::Io(e)),
        }
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        let final_path = self.object_path(key)?;
        let tmp_path = self.base.join(format!("{key}.tmp"));
        with_retry(key, || {
            fs::write(&tmp_path, data)?;
            fs::rename(&tmp_path, &final_path)
        })
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.object_path(key)?;
        with_retry(key, || match fs::metadata(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        })
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(key.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get() {
        let (_dir, store) = store();
        store.put("a.json", b"payload").unwrap();
        assert_eq!(store.get("a.json").unwrap(), b"payload");
    }

    #[test]
    fn exists_reflects_put() {
        let (_dir, store) = store();
        assert!(!store.exists("m.marker").unwrap());
        store.put("m.marker", b"").unwrap();
        assert!(store.exists("m.marker").unwrap());
    }

    #[test]
    fn put_overwrites() {
        let (_dir, store) = store();
        store.put("k", b"one").unwrap();
        store.put("k", b"two").unwrap();
        assert_eq!(store.get("k").unwrap(), b"two");
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn empty_key_rejected() {
        let (_dir, store) = store();
        let err = store.put("", b"x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[test]
    fn path_traversal_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.exists("../escape").unwrap_err(),
            StoreError::InvalidKey(_)
        ));
    }

    #[test]
    fn no_tmp_file_left_behind() {
        let (dir, store) = store();
        store.put("doc.json", b"{}").unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
