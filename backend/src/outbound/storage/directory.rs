//! Directory-backed [`DurableStorage`] adapter.
//!
//! Each key maps to `<key>.json` inside a directory opened once through
//! `cap_std`, so lookups cannot leave that directory. Writes go to a temporary
//! file first and are renamed into place.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use serde_json::Value;

use crate::domain::ports::{DurableStorage, DurableStorageError, validate_key};

use super::decode_entry;

/// JSON files in a capability-scoped directory.
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    dir: Arc<Dir>,
}

impl DirectoryStorage {
    /// Open (creating if needed) the storage directory at `path`.
    pub fn open(path: &Path) -> Result<Self, DurableStorageError> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .ok_or_else(|| DurableStorageError::io("storage path must name a directory"))?;
        let parent_dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(io_error)?;
        match parent_dir.create_dir(name) {
            Ok(()) => {}
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(io_error(error)),
        }
        let dir = parent_dir.open_dir(name).map_err(io_error)?;
        Ok(Self { dir: Arc::new(dir) })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, DurableStorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, DurableStorageError> + Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || op(&dir))
            .await
            .map_err(|err| DurableStorageError::io(err.to_string()))?
    }
}

fn io_error(error: io::Error) -> DurableStorageError {
    DurableStorageError::io(error.to_string())
}

fn file_name(key: &str) -> String {
    format!("{key}.json")
}

#[async_trait]
impl DurableStorage for DirectoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, DurableStorageError> {
        validate_key(key)?;
        let key = key.to_owned();
        self.blocking(move |dir| match dir.read_to_string(file_name(&key)) {
            Ok(raw) => Ok(decode_entry(&key, &raw)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) if error.kind() == io::ErrorKind::InvalidData => {
                Ok(decode_entry(&key, ""))
            }
            Err(error) => Err(io_error(error)),
        })
        .await
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), DurableStorageError> {
        validate_key(key)?;
        let raw = serde_json::to_vec(value)
            .map_err(|err| DurableStorageError::encode(err.to_string()))?;
        let key = key.to_owned();
        self.blocking(move |dir| {
            let target = file_name(&key);
            let staging = format!(".{target}.tmp");
            dir.write(&staging, &raw).map_err(io_error)?;
            dir.rename(&staging, dir, &target).map_err(io_error)
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), DurableStorageError> {
        validate_key(key)?;
        let key = key.to_owned();
        self.blocking(move |dir| match dir.remove_file(file_name(&key)) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(error)),
        })
        .await
    }
}
