//! InMemoryStorage - HashMap-backed storage for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::Storage;
use crate::error::PersistError;

/// In-memory storage adapter backed by a HashMap.
///
/// Clone-friendly via Arc: clones share the same entries, so a handle can
/// be kept for inspection while another drives a binding.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStorage {
    /// Create a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| PersistError::Storage("lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PersistError::Storage("lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PersistError::Storage("lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let storage = InMemoryStorage::new();
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn get_missing_returns_none() {
        let storage = InMemoryStorage::new();
        assert_eq!(storage.get("missing").unwrap(), None);
    }

    #[test]
    fn set_overwrites() {
        let storage = InMemoryStorage::new();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("two".to_string()));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn remove_existing_and_missing() {
        let storage = InMemoryStorage::new();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);

        // Removing an absent key is not an error.
        storage.remove("k").unwrap();
    }

    #[test]
    fn clone_shares_entries() {
        let storage = InMemoryStorage::new();
        let clone = storage.clone();

        storage.set("k", "v").unwrap();
        assert_eq!(clone.get("k").unwrap(), Some("v".to_string()));
    }
}
