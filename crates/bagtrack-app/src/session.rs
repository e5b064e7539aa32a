use anyhow::Result;
use bagtrack_core::mutator::QueueAdjustment;
use bagtrack_core::persistence::{PersistenceError, PersistenceGateway};
use bagtrack_core::prefs::{PreferenceChange, Preferences};
use bagtrack_core::ratio::{DerivedRatios, derive_ratios};
use bagtrack_core::state::{BagState, SlotMark};
use time::OffsetDateTime;

use crate::reset::DependentState;

/// Outcome of an accepted action. The in-memory change always stands;
/// `save_warning` carries a failed write for the caller to show as a notice.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub ratios: DerivedRatios,
    pub save_warning: Option<PersistenceError>,
}

pub struct Session<'a> {
    pub(crate) state: BagState,
    pub(crate) gateway: PersistenceGateway<'a>,
    pub(crate) dependents: Vec<&'a dyn DependentState>,
    startup_notice: Option<PersistenceError>,
}

impl<'a> Session<'a> {
    pub(crate) fn open(
        gateway: PersistenceGateway<'a>,
        dependents: Vec<&'a dyn DependentState>,
    ) -> Self {
        let outcome = gateway.load();
        Self {
            state: outcome.state,
            gateway,
            dependents,
            startup_notice: outcome.recovered_from,
        }
    }

    /// Why the stored state was discarded at startup, if it was.
    pub fn startup_notice(&self) -> Option<&PersistenceError> {
        self.startup_notice.as_ref()
    }

    pub fn state(&self) -> &BagState {
        &self.state
    }

    pub fn snapshot(&self) -> BagState {
        self.state.clone()
    }

    pub fn derived_ratios(&self) -> DerivedRatios {
        derive_ratios(&self.state)
    }

    pub fn active_flash(&self) -> Option<u32> {
        self.state.active_flash(bagtrack_core::time::now_utc())
    }

    pub fn toggle_slot(&mut self, slot: u32) -> Result<Applied<SlotMark>> {
        self.toggle_slot_at(slot, bagtrack_core::time::now_utc())
    }

    pub fn toggle_slot_at(&mut self, slot: u32, now: OffsetDateTime) -> Result<Applied<SlotMark>> {
        let mark = self.state.toggle_slot_at(slot, now)?;
        Ok(self.commit(mark))
    }

    pub fn change_bag_count(&mut self, delta: i32) -> Result<Applied<u32>> {
        let count = self.state.change_bag_count(delta)?;
        Ok(self.commit(count))
    }

    pub fn change_chase_count(&mut self, delta: i32) -> Result<Applied<u32>> {
        let count = self.state.change_chase_count(delta)?;
        Ok(self.commit(count))
    }

    pub fn change_queue(&mut self, adjustment: QueueAdjustment) -> Applied<u32> {
        let queue = self.state.change_queue(adjustment);
        self.commit(queue)
    }

    pub fn change_preferences(&mut self, change: PreferenceChange) -> Applied<Preferences> {
        self.state.change_preferences(change);
        let preferences = *self.state.preferences();
        self.commit(preferences)
    }

    /// Writes the current state; a failed write is logged and handed back
    /// instead of undoing the change.
    fn commit<T>(&self, value: T) -> Applied<T> {
        let save_warning = match self.gateway.save(&self.state) {
            Ok(()) => None,
            Err(error) => {
                tracing::warn!(%error, "bag state was not saved");
                Some(error)
            }
        };

        Applied {
            value,
            ratios: self.derived_ratios(),
            save_warning,
        }
    }
}
