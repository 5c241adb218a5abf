//! Secure storage abstraction for app-lock state.
//!
//! The PIN hash, lock-enabled flag, timer duration and auth-method
//! preference all live behind this trait. On a real device the backing
//! store must be at-rest protected by the OS keystore/keychain; the
//! sled implementation here covers desktop builds and the in-memory
//! implementation covers tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Storage key for the Argon2 PIN hash (PHC string).
pub const KEY_PIN_HASH: &str = "app_lock.pin_hash";
/// Storage key for the persisted [`AppLockConfig`](crate::config::AppLockConfig).
pub const KEY_LOCK_CONFIG: &str = "app_lock.config";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DbError(#[from] sled::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Key-value secure storage contract.
///
/// `get` returning `Ok(None)` means the key is absent, which is not an
/// error; callers treat absence as "not configured".
pub trait SecureStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// sled-backed secure storage.
pub struct SledStorage {
    db: sled::Db,
}

impl SledStorage {
    /// Open or create a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }
}

impl SecureStorage for SledStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.db.insert(key.as_bytes(), value)?;
        self.db.flush()?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

/// In-memory secure storage for tests and demos.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock".to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Backend("poisoned lock".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();

        assert!(storage.get("missing").unwrap().is_none());

        storage.set("key", b"value").unwrap();
        assert_eq!(storage.get("key").unwrap().unwrap(), b"value");

        storage.delete("key").unwrap();
        assert!(storage.get("key").unwrap().is_none());
    }

    #[test]
    fn test_memory_storage_overwrite() {
        let storage = MemoryStorage::new();
        storage.set("key", b"first").unwrap();
        storage.set("key", b"second").unwrap();
        assert_eq!(storage.get("key").unwrap().unwrap(), b"second");
    }

    #[test]
    fn test_sled_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = SledStorage::open(dir.path().join("store")).unwrap();

        storage.set(KEY_PIN_HASH, b"hash").unwrap();
        assert_eq!(storage.get(KEY_PIN_HASH).unwrap().unwrap(), b"hash");

        storage.delete(KEY_PIN_HASH).unwrap();
        assert!(storage.get(KEY_PIN_HASH).unwrap().is_none());
    }
}
