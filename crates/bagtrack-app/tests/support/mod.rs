use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use bagtrack_core::persistence::STATE_KEY;
use bagtrack_core::store::{KeyValueStore, MemoryStore, StoreError};

/// Memory store whose writes can be switched off to simulate a full or
/// read-only disk.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing_writes: Mutex<bool>,
    writes: Mutex<Vec<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes(&self, failing: bool) {
        *self.failing_writes.lock().expect("flag lock") = failing;
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().expect("writes lock").clone()
    }

    fn write_error(&self, key: &str) -> Option<StoreError> {
        if !*self.failing_writes.lock().expect("flag lock") {
            return None;
        }

        Some(StoreError::Write {
            key: key.to_string(),
            path: PathBuf::from("/flaky").join(key),
            source: io::Error::other("disk full"),
        })
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.writes
            .lock()
            .expect("writes lock")
            .push(format!("set {key}"));
        if let Some(error) = self.write_error(key) {
            return Err(error);
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.writes
            .lock()
            .expect("writes lock")
            .push(format!("remove {key}"));
        if let Some(error) = self.write_error(key) {
            return Err(error);
        }
        self.inner.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }
}

pub fn seed_state(store: &dyn KeyValueStore, raw: &str) {
    store.set(STATE_KEY, raw).expect("seed bag state");
}
