use std::path::{Path, PathBuf};

use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// A key-value store for JSON blobs.
pub trait Store {
    /// Raw contents stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn write(&mut self, key: &str, contents: &str) -> Result<(), StoreError>;

    /// Load and decode the value under `key`.
    ///
    /// A missing key, a read failure and a parse failure all come back as
    /// `None`; the failures are logged.
    fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        let contents = match self.read(key) {
            Ok(Some(contents)) => contents,
            Ok(None) => return None,
            Err(e) => {
                error!("store read failed: {}", e);
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("discarding unreadable value under `{}`: {}", key, e);
                None
            }
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.write(key, &json)
    }
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Store for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read { path, source }),
        }
    }

    fn write(&mut self, key: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, contents).map_err(|source| StoreError::Write { path, source })
    }
}

/// In-memory store shared between clones; counts writes.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: std::rc::Rc<std::cell::RefCell<MemoryInner>>,
}

#[cfg(test)]
#[derive(Debug, Default)]
struct MemoryInner {
    values: std::collections::HashMap<String, String>,
    writes: usize,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_value(key: &str, contents: &str) -> Self {
        let store = Self::default();
        store
            .inner
            .borrow_mut()
            .values
            .insert(key.to_string(), contents.to_string());
        store
    }

    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().values.get(key).cloned()
    }
}

#[cfg(test)]
impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn write(&mut self, key: &str, contents: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        inner.values.insert(key.to_string(), contents.to_string());
        inner.writes += 1;
        Ok(())
    }
}
