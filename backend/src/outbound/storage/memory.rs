//! In-memory [`DurableStorage`] adapter.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ports::{DurableStorage, DurableStorageError, validate_key};

use super::decode_entry;

/// Map-backed storage holding entries as raw JSON text.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under `key` without validation.
    ///
    /// Lets tests plant corrupt entries.
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.lock().insert(key.into(), raw.into());
    }

    /// Whether `key` currently holds anything.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DurableStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, DurableStorageError> {
        validate_key(key)?;
        Ok(self
            .lock()
            .get(key)
            .and_then(|raw| decode_entry(key, raw)))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), DurableStorageError> {
        validate_key(key)?;
        let raw = serde_json::to_string(value)
            .map_err(|err| DurableStorageError::encode(err.to_string()))?;
        self.lock().insert(key.to_owned(), raw);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DurableStorageError> {
        validate_key(key)?;
        self.lock().remove(key);
        Ok(())
    }
}
