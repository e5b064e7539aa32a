use bagtrack_core::persistence::SIBLING_KEYS;
use bagtrack_core::state::BagState;
use bagtrack_core::store::{KeyValueStore, StoreError};

use crate::Session;

/// An owner of persisted state outside the bag tracker (images, marks,
/// bounties) that must forget its data when the user resets.
pub trait DependentState {
    fn name(&self) -> &str;
    fn clear(&self, store: &dyn KeyValueStore) -> Result<(), StoreError>;
}

/// Clears the well-known keys of the image, zoom, insurance, bounty and
/// vintage features.
#[derive(Debug, Default, Clone, Copy)]
pub struct SiblingFeatureKeys;

impl DependentState for SiblingFeatureKeys {
    fn name(&self) -> &str {
        "feature keys"
    }

    fn clear(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        for key in SIBLING_KEYS {
            store.remove(key)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResetReport {
    pub cleared: Vec<String>,
    pub failures: Vec<String>,
}

impl ResetReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Session<'_> {
    /// Puts the session back to a fresh grid and asks every dependent owner
    /// to drop its stored data. The in-memory reset always happens; storage
    /// failures are collected in the report.
    pub fn reset_to_defaults(&mut self) -> ResetReport {
        self.state = BagState::default();

        let mut report = ResetReport::default();
        match self.gateway.clear() {
            Ok(()) => report.cleared.push("bag state".to_string()),
            Err(error) => {
                tracing::warn!(%error, "failed to clear stored bag state");
                report.failures.push(format!("bag state: {error}"));
            }
        }

        let store = self.gateway.store();
        for dependent in &self.dependents {
            match dependent.clear(store) {
                Ok(()) => report.cleared.push(dependent.name().to_string()),
                Err(error) => {
                    tracing::warn!(
                        %error,
                        owner = dependent.name(),
                        "failed to clear dependent state"
                    );
                    report
                        .failures
                        .push(format!("{}: {error}", dependent.name()));
                }
            }
        }

        tracing::info!(
            cleared = report.cleared.len(),
            failed = report.failures.len(),
            "reset to defaults"
        );
        report
    }
}
