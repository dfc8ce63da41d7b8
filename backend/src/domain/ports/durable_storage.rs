//! Port for small key/value documents that survive restarts.
//!
//! Clients cache the signed-in user and session token here. Values are JSON;
//! adapters report unreadable or corrupt entries as absent rather than as
//! errors.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;

define_port_error! {
    /// Errors raised by durable storage adapters.
    pub enum DurableStorageError {
        /// The key is not a safe storage name.
        InvalidKey { key: String } => "invalid storage key: {key}",
        /// Reading or writing the backing medium failed.
        Io { message: String } => "durable storage I/O failed: {message}",
        /// The value could not be encoded.
        Encode { message: String } => "durable storage encode failed: {message}",
    }
}

/// Key/value storage for JSON documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStorage: Send + Sync {
    /// Read a value; missing and corrupt entries are `None`.
    async fn get(&self, key: &str) -> Result<Option<Value>, DurableStorageError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &Value) -> Result<(), DurableStorageError>;

    /// Delete a value; deleting a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), DurableStorageError>;
}

/// Reject keys that could escape a storage namespace.
pub fn validate_key(key: &str) -> Result<(), DurableStorageError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(DurableStorageError::invalid_key(key))
    }
}
