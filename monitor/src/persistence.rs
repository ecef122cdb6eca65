//! Key-value persistence for the template library.
//!
//! The template store never touches the disk itself. It reads and writes whole
//! values through a [`KeyValueStore`], which the embedding application
//! supplies.
//!
//! # Design
//!
//! - **Whole-value writes**: every `set` replaces the value stored under the
//!   key. There is no merge and no concurrent-writer protocol; the last write
//!   wins.
//!
//! - **Atomic replace on disk**: [`JsonFileStore`] writes each value to its
//!   own uniquely named temporary file in the same directory and persists it
//!   over the target. A crash mid-write leaves the previous value intact, and
//!   two processes saving at once never share a temporary file.
//!
//! # Example
//!
//! ```no_run
//! use cursor_helper::persistence::{JsonFileStore, KeyValueStore};
//! use serde_json::json;
//!
//! let mut store = JsonFileStore::new("/home/ann/.cursor-helper");
//! store.set("cursorHelper.templatesInitialized", json!(true))?;
//! assert_eq!(store.get("cursorHelper.templatesInitialized")?, Some(json!(true)));
//! # Ok::<(), cursor_helper::persistence::PersistenceError>(())
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that can occur while loading or saving persisted values.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File that was being accessed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },

    /// Stored data is not valid JSON, or a value could not be encoded.
    #[error("serialization error for key {key}: {source}")]
    Serialization {
        /// Key whose value failed to (de)serialize.
        key: String,
        /// Underlying failure.
        #[source]
        source: serde_json::Error,
    },

    /// The key contains characters that cannot be mapped to a file name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Storage for whole JSON values addressed by a fixed key.
pub trait KeyValueStore {
    /// Returns the value saved under `key`, or `None` if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or decoded.
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError>;

    /// Replaces the value saved under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the value files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            && !key.starts_with('.');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        let path = self.path_for(key)?;

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(key, "No stored value");
                return Ok(None);
            }
            Err(source) => return Err(PersistenceError::Io { path, source }),
        };

        let value = serde_json::from_str(&contents).map_err(|source| {
            PersistenceError::Serialization {
                key: key.to_string(),
                source,
            }
        })?;
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;

        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let encoded =
            serde_json::to_vec_pretty(&value).map_err(|source| PersistenceError::Serialization {
                key: key.to_string(),
                source,
            })?;

        let io_err = |source| PersistenceError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(&encoded).map_err(io_err)?;
        tmp.as_file().flush().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        debug!(key, path = %path.display(), "Saved value");
        Ok(())
    }
}

/// In-process store, for tests and for embedders with their own storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    #[test]
    fn missing_key_reads_as_none() {
        let temp_dir = create_test_dir();
        let store = JsonFileStore::new(temp_dir.path());
        assert_eq!(store.get("cursorHelper.promptTemplates").unwrap(), None);
    }

    #[test]
    fn set_then_get_returns_value() {
        let temp_dir = create_test_dir();
        let mut store = JsonFileStore::new(temp_dir.path().join("data"));

        store
            .set("cursorHelper.promptTemplates", json!([{"id": "tpl_1"}]))
            .unwrap();

        assert_eq!(
            store.get("cursorHelper.promptTemplates").unwrap(),
            Some(json!([{"id": "tpl_1"}]))
        );
        assert!(temp_dir
            .path()
            .join("data/cursorHelper.promptTemplates.json")
            .exists());
        let files: Vec<_> = fs::read_dir(temp_dir.path().join("data"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(files, vec!["cursorHelper.promptTemplates.json"]);
    }

    #[test]
    fn concurrent_writers_leave_a_valid_value() {
        let temp_dir = create_test_dir();
        let dir = temp_dir.path().to_path_buf();

        let writers: Vec<_> = (0..8)
            .map(|n| {
                let dir = dir.clone();
                std::thread::spawn(move || {
                    let mut store = JsonFileStore::new(dir);
                    let value = json!({"writer": n, "body": "x".repeat(64 * 1024)});
                    for _ in 0..10 {
                        store.set("k", value.clone()).unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let stored = JsonFileStore::new(&dir).get("k").unwrap().unwrap();
        let writer = stored["writer"].as_u64().unwrap();
        assert!(writer < 8);
        assert_eq!(stored["body"].as_str().unwrap().len(), 64 * 1024);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[test]
    fn set_replaces_whole_value() {
        let temp_dir = create_test_dir();
        let mut store = JsonFileStore::new(temp_dir.path());

        store.set("k", json!({"a": 1, "b": 2})).unwrap();
        store.set("k", json!({"c": 3})).unwrap();

        assert_eq!(store.get("k").unwrap(), Some(json!({"c": 3})));
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("k.json"), "{ not json").unwrap();
        let store = JsonFileStore::new(temp_dir.path());

        let err = store.get("k").unwrap_err();
        assert!(matches!(err, PersistenceError::Serialization { ref key, .. } if key == "k"));
    }

    #[test]
    fn keys_with_path_separators_are_rejected() {
        let temp_dir = create_test_dir();
        let mut store = JsonFileStore::new(temp_dir.path());

        for key in ["../escape", "a/b", "", ".hidden"] {
            assert!(
                matches!(store.set(key, json!(1)), Err(PersistenceError::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("flag").unwrap(), None);
        store.set("flag", json!(true)).unwrap();
        assert_eq!(store.get("flag").unwrap(), Some(json!(true)));
    }

    #[test]
    fn boxed_store_delegates() {
        let mut store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.set("x", json!("y")).unwrap();
        assert_eq!(store.get("x").unwrap(), Some(json!("y")));
    }
}
