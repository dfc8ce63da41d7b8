//! Durable key/value storage adapters.
//!
//! - **directory**: one JSON file per key inside a `cap_std` directory handle
//! - **memory**: process-local map for tests and ephemeral clients

mod directory;
mod memory;

pub use directory::DirectoryStorage;
pub use memory::MemoryStorage;

use serde_json::Value;
use tracing::warn;

/// Parse stored text, treating corrupt entries as absent.
fn decode_entry(key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(key, %error, "ignoring corrupt storage entry");
            None
        }
    }
}
