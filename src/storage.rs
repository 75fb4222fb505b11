//! Key-value persistence for serialized state.
//!
//! The tracker only ever needs `get` and `set` of whole JSON documents under a
//! few well-known keys. `JsonFileStore` keeps one `<key>.json` file per key in a
//! data directory; `MemoryStore` keeps values in process.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::StoreError;

/// Key under which the full application state is stored.
pub const STATE_KEY: &str = "taskboard-state";

/// Key recording when the last export happened. Not part of the state.
pub const LAST_EXPORT_KEY: &str = "taskboard-last-export";

/// Durable get/set of JSON values.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError>;
}

/// Directory-backed store writing one JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io { key: dir.display().to_string(), source })?;
        Ok(JsonFileStore { dir: dir.to_path_buf() })
    }

    /// File holding the value for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let io = |source| StoreError::Io { key: key.to_string(), source };
        let mut buf = String::new();
        File::open(&path).and_then(|mut f| f.read_to_string(&mut buf)).map_err(io)?;
        let value = serde_json::from_str(&buf).map_err(|source| StoreError::Json { key: key.to_string(), source })?;
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let data = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Json { key: key.to_string(), source })?;
        let io = |source| StoreError::Io { key: key.to_string(), source };
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp).map_err(io)?;
        f.write_all(data.as_bytes()).map_err(io)?;
        f.flush().map_err(io)?;
        fs::rename(&tmp, &path).map_err(io)?;
        Ok(())
    }
}

/// In-process store. Writes can be made to fail for exercising error paths.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Rejected { key: key.to_string(), reason: "quota exceeded".into() });
        }
        self.values.insert(key.to_string(), value.clone());
        self.writes += 1;
        Ok(())
    }
}
