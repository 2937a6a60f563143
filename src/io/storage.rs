//! Named JSON blob storage, the desktop stand-in for extension storage.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode stored data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no data directory available on this system")]
    NoDataDir,
}

/// Get/set of named JSON blobs.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The per-user data directory for the app.
    pub fn default_dir() -> Result<PathBuf, StoreError> {
        directories::ProjectDirs::from("", "", "StreamTimeline")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(StoreError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // Corrupt blobs read as empty; the next save replaces them.
                tracing::warn!(?path, error = %e, "ignoring unreadable stored blob");
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// In-memory storage. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, Value>>>,
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.entries.borrow_mut().insert(key.to_string(), value.clone());
        Ok(())
    }
}
