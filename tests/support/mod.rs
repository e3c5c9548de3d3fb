//! Shared test doubles for the integration suite.
#![allow(dead_code)] // each test crate uses a different subset

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use form_persist::{
    InMemoryStorage, PersistError, SetValueOpts, Snapshot, Storage, ValueSource,
};
use serde_json::Value;

/// Storage wrapper that records every write and remove, with optional
/// one-shot write-failure injection.
#[derive(Clone, Default)]
pub struct CountingStorage {
    inner: InMemoryStorage,
    sets: Arc<Mutex<Vec<(String, String)>>>,
    removes: Arc<Mutex<Vec<String>>>,
    fail_next_set: Arc<AtomicBool>,
}

impl CountingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&self) -> usize {
        self.sets.lock().unwrap().len()
    }

    pub fn remove_count(&self) -> usize {
        self.removes.lock().unwrap().len()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.sets.lock().unwrap().clone()
    }

    pub fn removed_keys(&self) -> Vec<String> {
        self.removes.lock().unwrap().clone()
    }

    /// Make the next `set` fail with an adapter error.
    pub fn fail_next_set(&self) {
        self.fail_next_set.store(true, Ordering::SeqCst);
    }

    pub fn stored(&self, key: &str) -> Option<String> {
        self.inner.get(key).unwrap()
    }

    /// Seed a record directly, bypassing the counters.
    pub fn seed(&self, key: &str, value: &str) {
        self.inner.set(key, value).unwrap();
    }
}

impl Storage for CountingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistError> {
        if self.fail_next_set.swap(false, Ordering::SeqCst) {
            return Err(PersistError::Storage("quota exceeded".into()));
        }
        self.sets
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.removes.lock().unwrap().push(key.to_string());
        self.inner.remove(key)
    }
}

/// Value source that records every `set_value` call.
#[derive(Clone, Default)]
pub struct RecordingSource {
    calls: Arc<Mutex<Vec<(String, Value, SetValueOpts)>>>,
}

impl RecordingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, Value, SetValueOpts)> {
        self.calls.lock().unwrap().clone()
    }

    /// The recorded calls as a snapshot, for value-for-value comparison.
    pub fn as_snapshot(&self) -> Snapshot {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(field, value, _)| (field.clone(), value.clone()))
            .collect()
    }
}

impl ValueSource for RecordingSource {
    fn set_value(&self, field: &str, value: Value, opts: SetValueOpts) {
        self.calls
            .lock()
            .unwrap()
            .push((field.to_string(), value, opts));
    }
}

pub fn snapshot(value: Value) -> Snapshot {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}
