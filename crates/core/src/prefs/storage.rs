//! Synchronous key-value storage behind the preference stores.

use std::cell::RefCell;
use std::collections::HashMap;

/// Errors a [`KeyValueStorage`] may report.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Storage is disabled or inaccessible (private browsing, sandboxing).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// The write would exceed the storage quota.
    #[error("storage quota exceeded")]
    QuotaExceeded,
}

/// Persistent string storage keyed by string, in the shape of browser
/// `localStorage`.
///
/// Access is synchronous and single-threaded; implementations use interior
/// mutability so one handle can be shared by every store.
pub trait KeyValueStorage {
    /// Read the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read at all.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be stored.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process storage, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys plus values exceed `bytes`.
    #[must_use]
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: RefCell::default(),
            quota_bytes: Some(bytes),
        }
    }

    /// Seed a raw value, bypassing the quota.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes
            && self.used_bytes_without(key) + key.len() + value.len() > quota
        {
            return Err(StorageError::QuotaExceeded);
        }
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
