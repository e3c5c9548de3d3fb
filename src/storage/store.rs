//! Storage - abstract synchronous key-value storage.

use crate::error::PersistError;

/// Abstract synchronous key-value storage.
///
/// The engine never retries or falls back: an adapter error propagates to
/// the caller under the adapter's own contract. Implementations must be
/// safe for sequential same-thread use; no concurrent-access guarantees
/// are required beyond `Send + Sync`.
pub trait Storage: Send + Sync {
    /// Get the value stored under `key`. Returns None if absent.
    fn get(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Remove the value stored under `key`, if any.
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}
