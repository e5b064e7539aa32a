use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Hard ceiling of a store, matching the usual 5 MiB browser local storage.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read key '{key}' at {path}: {source}")]
    Read {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write key '{key}' at {path}: {source}")]
    Write {
        key: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to list store at {path}: {source}")]
    List {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage quota exceeded writing '{key}': {required} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },
}

/// String key-value storage with whole-value reads and writes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// Size of a value the way local storage accounts for it: two bytes per
/// UTF-16 code unit.
pub fn stored_size(value: &str) -> usize {
    value.encode_utf16().count() * 2
}

/// One file per key inside a directory. Writes go through a temporary file
/// and a rename so a reader never sees half a value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota_bytes: usize,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_quota(dir, DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(dir: impl Into<PathBuf>, quota_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn used_bytes_excluding(&self, excluded: &str) -> Result<usize, StoreError> {
        let mut total = 0;
        for key in self.keys()? {
            if key == excluded {
                continue;
            }
            if let Some(value) = self.get(&key)? {
                total += stored_size(&value);
            }
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| StoreError::Read {
                key: key.to_string(),
                path,
                source,
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let required = self.used_bytes_excluding(key)? + stored_size(value);
        if required > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                required,
                quota: self.quota_bytes,
            });
        }

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            key: key.to_string(),
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value).map_err(|source| StoreError::Write {
            key: key.to_string(),
            path: temp_path.clone(),
            source,
        })?;

        fs::rename(&temp_path, &path).map_err(|source| StoreError::Write {
            key: key.to_string(),
            path: path.clone(),
            source,
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }

        fs::remove_file(&path).map_err(|source| StoreError::Write {
            key: key.to_string(),
            path,
            source,
        })
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let list_error = |source| StoreError::List {
            path: self.dir.clone(),
            source,
        };

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(list_error)? {
            let entry = entry.map_err(list_error)?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// In-process store with the same quota rules as [`FileStore`].
#[derive(Debug)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
    quota_bytes: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: Mutex::new(BTreeMap::new()),
            quota_bytes,
        }
    }

    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values();
        let others: usize = values
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(_, stored)| stored_size(stored))
            .sum();
        let required = others + stored_size(value);
        if required > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                key: key.to_string(),
                required,
                quota: self.quota_bytes,
            });
        }

        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.values().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_size_counts_utf16_units_twice() {
        assert_eq!(stored_size("abc"), 6);
        assert_eq!(stored_size("é"), 2);
        assert_eq!(stored_size("🎒"), 4);
    }

    #[test]
    fn file_store_round_trips_and_lists_keys() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(temp.path().join("store"));

        assert_eq!(store.get("missing").expect("get"), None);
        assert!(store.keys().expect("keys").is_empty());

        store.set("b", "two").expect("set b");
        store.set("a", "one").expect("set a");
        store.set("a", "uno").expect("overwrite a");

        assert_eq!(store.get("a").expect("get a").as_deref(), Some("uno"));
        assert_eq!(store.keys().expect("keys"), vec!["a", "b"]);

        store.remove("a").expect("remove a");
        store.remove("a").expect("remove twice");
        assert_eq!(store.keys().expect("keys"), vec!["b"]);
    }

    #[test]
    fn file_store_leaves_no_temporary_files() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = FileStore::new(temp.path());
        store.set("state", "{}").expect("set");

        let names: Vec<String> = fs::read_dir(temp.path())
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["state.json"]);
    }

    #[test]
    fn file_store_enforces_quota_across_keys() {
        let temp = tempfile::tempdir().expect("temp dir");
        let store = FileStore::with_quota(temp.path(), 20);

        store.set("a", "12345").expect("10 bytes");
        store.set("a", "1234567890").expect("overwrite within quota");
        let error = store.set("b", "x").expect_err("over quota");

        assert!(matches!(
            error,
            StoreError::QuotaExceeded {
                required: 22,
                quota: 20,
                ..
            }
        ));
        assert_eq!(store.get("b").expect("get b"), None);
    }

    #[test]
    fn memory_store_enforces_quota() {
        let store = MemoryStore::with_quota(8);
        store.set("a", "1234").expect("8 bytes");

        assert!(matches!(
            store.set("b", "1"),
            Err(StoreError::QuotaExceeded { .. })
        ));
        store.remove("a").expect("remove");
        store.set("b", "1").expect("fits after remove");
        assert_eq!(store.keys().expect("keys"), vec!["b"]);
    }
}
