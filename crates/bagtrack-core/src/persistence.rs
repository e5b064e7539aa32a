use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prefs::Preferences;
use crate::state::{BagState, StateParts};
use crate::store::{KeyValueStore, StoreError, stored_size};

const RECORD_VERSION: u32 = 1;

pub const STATE_KEY: &str = "bag-state";

/// Keys owned by the image, zoom, insurance, bounty and vintage features.
/// They share the storage budget with the bag state.
pub const SIBLING_KEYS: &[&str] = &[
    "prize-image",
    "zoom-state",
    "insurance-images",
    "insurance-marks",
    "bounties",
    "vintage-images",
    "vintage-bag-count",
    "stored-images",
];

/// Soft ceiling for everything the app keeps in the store (4.5 MiB).
pub const SOFT_BUDGET_BYTES: usize = 4_718_592;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write bag state: {0}")]
    Write(#[source] StoreError),
    #[error("failed to serialize bag state: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to read bag state: {0}")]
    Read(#[source] StoreError),
    #[error("stored bag state is corrupt: {message}")]
    Corrupt { message: String },
}

impl PersistenceError {
    /// Quota and serialization failures both surface as a failed write.
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::Write(_) | Self::Serialize(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedRecord {
    #[serde(default = "default_version")]
    version: u32,
    bag_count: u32,
    chase_count: u32,
    selected_numbers: Vec<u32>,
    chase_numbers: Vec<u32>,
    remaining_chases: i64,
    #[serde(default)]
    reserved_numbers: Vec<u32>,
    #[serde(default)]
    queue_count: u32,
    #[serde(default = "default_mark_size")]
    mark_size: u32,
    #[serde(default = "default_font_size_level")]
    font_size_level: u32,
    #[serde(default = "default_stats_font_size_level")]
    stats_font_size_level: u32,
    #[serde(default)]
    shimmer_level: u32,
    #[serde(default)]
    use_stone_style: bool,
}

fn default_version() -> u32 {
    RECORD_VERSION
}

fn default_mark_size() -> u32 {
    Preferences::default().mark_size
}

fn default_font_size_level() -> u32 {
    Preferences::default().font_size_level
}

fn default_stats_font_size_level() -> u32 {
    Preferences::default().stats_font_size_level
}

impl PersistedRecord {
    fn from_state(state: &BagState) -> Self {
        let preferences = state.preferences();
        Self {
            version: RECORD_VERSION,
            bag_count: state.bag_count(),
            chase_count: state.chase_count(),
            selected_numbers: state.selected_slots().iter().copied().collect(),
            chase_numbers: state.chase_slots().iter().copied().collect(),
            remaining_chases: state.remaining_chases() as i64,
            reserved_numbers: state.reserved_slots().iter().copied().collect(),
            queue_count: state.queue_count(),
            mark_size: preferences.mark_size,
            font_size_level: preferences.font_size_level,
            stats_font_size_level: preferences.stats_font_size_level,
            shimmer_level: preferences.shimmer_level,
            use_stone_style: preferences.use_stone_style,
        }
    }

    fn into_state(self) -> Result<BagState, PersistenceError> {
        if self.version != RECORD_VERSION {
            return Err(corrupt(format!(
                "unsupported version (expected {RECORD_VERSION}, found {})",
                self.version
            )));
        }

        let parts = StateParts {
            bag_count: self.bag_count,
            chase_count: self.chase_count,
            remaining_chases: self.remaining_chases,
            selected_slots: unique(self.selected_numbers, "selectedNumbers")?,
            chase_slots: unique(self.chase_numbers, "chaseNumbers")?,
            reserved_slots: unique(self.reserved_numbers, "reservedNumbers")?,
            queue_count: self.queue_count,
            preferences: Preferences {
                mark_size: self.mark_size,
                font_size_level: self.font_size_level,
                stats_font_size_level: self.stats_font_size_level,
                shimmer_level: self.shimmer_level,
                use_stone_style: self.use_stone_style,
            },
        };

        BagState::from_parts(parts).map_err(|violation| corrupt(violation.to_string()))
    }
}

fn unique(values: Vec<u32>, field: &str) -> Result<BTreeSet<u32>, PersistenceError> {
    let count = values.len();
    let set: BTreeSet<u32> = values.into_iter().collect();
    if set.len() != count {
        return Err(corrupt(format!("{field} contains duplicate slots")));
    }
    Ok(set)
}

fn corrupt(message: String) -> PersistenceError {
    PersistenceError::Corrupt { message }
}

/// Result of a startup load. The state is always usable; `recovered_from`
/// records why defaults were used instead of the stored record.
#[derive(Debug)]
pub struct LoadOutcome {
    pub state: BagState,
    pub recovered_from: Option<PersistenceError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUsage {
    pub key: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUsage {
    pub total_bytes: usize,
    pub budget_bytes: usize,
    pub breakdown: Vec<KeyUsage>,
}

impl StorageUsage {
    pub fn remaining_bytes(&self) -> usize {
        self.budget_bytes.saturating_sub(self.total_bytes)
    }

    /// Less than a tenth of the budget is left.
    pub fn near_limit(&self) -> bool {
        self.remaining_bytes() < self.budget_bytes / 10
    }

    /// Whether a new value of `additional_bytes` stays under the budget.
    pub fn fits(&self, additional_bytes: usize) -> bool {
        self.total_bytes + additional_bytes < self.budget_bytes
    }
}

/// Reads and writes the bag state record and accounts for the app's share
/// of the store.
pub struct PersistenceGateway<'a> {
    store: &'a dyn KeyValueStore,
    soft_budget_bytes: usize,
}

impl<'a> PersistenceGateway<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self::with_soft_budget(store, SOFT_BUDGET_BYTES)
    }

    pub fn with_soft_budget(store: &'a dyn KeyValueStore, soft_budget_bytes: usize) -> Self {
        Self {
            store,
            soft_budget_bytes,
        }
    }

    pub fn store(&self) -> &'a dyn KeyValueStore {
        self.store
    }

    pub fn save(&self, state: &BagState) -> Result<(), PersistenceError> {
        let record = PersistedRecord::from_state(state);
        let raw = serde_json::to_string(&record).map_err(PersistenceError::Serialize)?;
        self.store
            .set(STATE_KEY, &raw)
            .map_err(PersistenceError::Write)
    }

    /// Strict read: `Ok(None)` when nothing is stored, an error when the
    /// record cannot be read or does not describe a valid state.
    pub fn try_load(&self) -> Result<Option<BagState>, PersistenceError> {
        let Some(raw) = self.store.get(STATE_KEY).map_err(PersistenceError::Read)? else {
            return Ok(None);
        };

        let record: PersistedRecord =
            serde_json::from_str(&raw).map_err(|error| corrupt(error.to_string()))?;
        record.into_state().map(Some)
    }

    /// Startup read that never fails: anything wrong with the stored record
    /// is logged and replaced by defaults.
    pub fn load(&self) -> LoadOutcome {
        match self.try_load() {
            Ok(Some(state)) => LoadOutcome {
                state,
                recovered_from: None,
            },
            Ok(None) => LoadOutcome {
                state: BagState::default(),
                recovered_from: None,
            },
            Err(error) => {
                tracing::warn!(%error, "falling back to default bag state");
                LoadOutcome {
                    state: BagState::default(),
                    recovered_from: Some(error),
                }
            }
        }
    }

    pub fn clear(&self) -> Result<(), PersistenceError> {
        self.store
            .remove(STATE_KEY)
            .map_err(PersistenceError::Write)
    }

    /// Bytes used by the bag state and the sibling feature keys.
    pub fn usage(&self) -> Result<StorageUsage, StoreError> {
        let mut breakdown = Vec::new();
        for key in std::iter::once(STATE_KEY).chain(SIBLING_KEYS.iter().copied()) {
            if let Some(value) = self.store.get(key)? {
                breakdown.push(KeyUsage {
                    key: key.to_string(),
                    bytes: stored_size(&value),
                });
            }
        }

        Ok(StorageUsage {
            total_bytes: breakdown.iter().map(|entry| entry.bytes).sum(),
            budget_bytes: self.soft_budget_bytes,
            breakdown,
        })
    }
}
