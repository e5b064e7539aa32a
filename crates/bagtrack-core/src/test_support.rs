use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::store::{KeyValueStore, StoreError};

/// A store whose disk has gone away: every call fails and is recorded.
#[derive(Default)]
pub struct FailingStore {
    calls: Mutex<Vec<String>>,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

fn unavailable(key: &str) -> (String, PathBuf, io::Error) {
    (
        key.to_string(),
        PathBuf::from("/unavailable").join(key),
        io::Error::other("store unavailable"),
    )
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.record(format!("get {key}"));
        let (key, path, source) = unavailable(key);
        Err(StoreError::Read { key, path, source })
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StoreError> {
        self.record(format!("set {key}"));
        let (key, path, source) = unavailable(key);
        Err(StoreError::Write { key, path, source })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.record(format!("remove {key}"));
        let (key, path, source) = unavailable(key);
        Err(StoreError::Write { key, path, source })
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.record("keys".to_string());
        Err(StoreError::List {
            path: PathBuf::from("/unavailable"),
            source: io::Error::other("store unavailable"),
        })
    }
}
