use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::prefs::Preferences;

pub const MIN_BAG_COUNT: u32 = 1;
pub const MAX_BAG_COUNT: u32 = 100;
pub const MAX_CHASE_COUNT: u32 = 100;
pub const DEFAULT_BAG_COUNT: u32 = 50;
pub const DEFAULT_CHASE_COUNT: u32 = 8;

/// How long a touched slot stays highlighted.
pub const FLASH_DURATION: Duration = Duration::seconds(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMark {
    Open,
    Sold,
    Chase,
}

/// The most recently toggled slot. A newer toggle replaces the previous
/// flash, which is how a pending clear gets cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flash {
    pub slot: u32,
    pub touched_at: OffsetDateTime,
}

impl Flash {
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        now - self.touched_at < FLASH_DURATION
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("bag count {0} is outside {min}..={max}", min = MIN_BAG_COUNT, max = MAX_BAG_COUNT)]
    BagCountOutOfRange(u32),
    #[error("chase count {chase_count} exceeds bag count {bag_count}")]
    ChaseCountExceedsBags { chase_count: u32, bag_count: u32 },
    #[error("slot {slot} is outside 1..={bag_count}")]
    SlotOutOfRange { slot: u32, bag_count: u32 },
    #[error("chase slot {0} is not marked as sold")]
    ChaseNotSelected(u32),
    #[error("slot {0} holds a queued reservation but is not marked as sold")]
    ReservationNotSelected(u32),
    #[error("{marked} chase slots are marked but only {chase_count} chases exist")]
    TooManyChaseSlots { marked: u32, chase_count: u32 },
    #[error("remaining chases {remaining} does not match {chase_count} chases minus {marked} found")]
    RemainingMismatch {
        remaining: i64,
        chase_count: u32,
        marked: u32,
    },
}

/// Authoritative bookkeeping for one session: how many bags and chases
/// exist, which slots are sold or revealed as chases, and how many sales are
/// queued without a slot yet.
///
/// Fields are only writable through the mutation operations in
/// [`crate::mutator`]; a clone is a complete snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BagState {
    pub(crate) bag_count: u32,
    pub(crate) chase_count: u32,
    pub(crate) remaining_chases: u32,
    pub(crate) selected_slots: BTreeSet<u32>,
    pub(crate) chase_slots: BTreeSet<u32>,
    pub(crate) reserved_slots: BTreeSet<u32>,
    pub(crate) queue_count: u32,
    pub(crate) preferences: Preferences,
    pub(crate) flash: Option<Flash>,
}

impl Default for BagState {
    fn default() -> Self {
        Self {
            bag_count: DEFAULT_BAG_COUNT,
            chase_count: DEFAULT_CHASE_COUNT,
            remaining_chases: DEFAULT_CHASE_COUNT,
            selected_slots: BTreeSet::new(),
            chase_slots: BTreeSet::new(),
            reserved_slots: BTreeSet::new(),
            queue_count: 0,
            preferences: Preferences::default(),
            flash: None,
        }
    }
}

/// Raw field values, as read back from storage, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateParts {
    pub bag_count: u32,
    pub chase_count: u32,
    pub remaining_chases: i64,
    pub selected_slots: BTreeSet<u32>,
    pub chase_slots: BTreeSet<u32>,
    pub reserved_slots: BTreeSet<u32>,
    pub queue_count: u32,
    pub preferences: Preferences,
}

impl BagState {
    pub fn from_parts(parts: StateParts) -> Result<Self, InvariantViolation> {
        let marked = parts.chase_slots.len() as u32;
        let expected = parts.chase_count as i64 - marked as i64;
        if parts.remaining_chases != expected {
            return Err(InvariantViolation::RemainingMismatch {
                remaining: parts.remaining_chases,
                chase_count: parts.chase_count,
                marked,
            });
        }

        let state = Self {
            bag_count: parts.bag_count,
            chase_count: parts.chase_count,
            remaining_chases: expected.max(0) as u32,
            selected_slots: parts.selected_slots,
            chase_slots: parts.chase_slots,
            reserved_slots: parts.reserved_slots,
            queue_count: parts.queue_count,
            preferences: parts.preferences.normalized(),
            flash: None,
        };
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> Result<(), InvariantViolation> {
        if !(MIN_BAG_COUNT..=MAX_BAG_COUNT).contains(&self.bag_count) {
            return Err(InvariantViolation::BagCountOutOfRange(self.bag_count));
        }

        if self.chase_count > self.bag_count {
            return Err(InvariantViolation::ChaseCountExceedsBags {
                chase_count: self.chase_count,
                bag_count: self.bag_count,
            });
        }

        if let Some(slot) = self
            .selected_slots
            .iter()
            .copied()
            .find(|slot| !self.slot_in_range(*slot))
        {
            return Err(InvariantViolation::SlotOutOfRange {
                slot,
                bag_count: self.bag_count,
            });
        }

        if let Some(slot) = self
            .chase_slots
            .iter()
            .copied()
            .find(|slot| !self.selected_slots.contains(slot))
        {
            return Err(InvariantViolation::ChaseNotSelected(slot));
        }

        if let Some(slot) = self
            .reserved_slots
            .iter()
            .copied()
            .find(|slot| !self.selected_slots.contains(slot))
        {
            return Err(InvariantViolation::ReservationNotSelected(slot));
        }

        let marked = self.marked_chases();
        if marked > self.chase_count {
            return Err(InvariantViolation::TooManyChaseSlots {
                marked,
                chase_count: self.chase_count,
            });
        }

        if self.remaining_chases != self.chase_count - marked {
            return Err(InvariantViolation::RemainingMismatch {
                remaining: self.remaining_chases as i64,
                chase_count: self.chase_count,
                marked,
            });
        }

        Ok(())
    }

    pub fn bag_count(&self) -> u32 {
        self.bag_count
    }

    pub fn chase_count(&self) -> u32 {
        self.chase_count
    }

    pub fn remaining_chases(&self) -> u32 {
        self.remaining_chases
    }

    pub fn selected_slots(&self) -> &BTreeSet<u32> {
        &self.selected_slots
    }

    pub fn chase_slots(&self) -> &BTreeSet<u32> {
        &self.chase_slots
    }

    /// Sold slots whose marking took a reservation off the queue.
    pub fn reserved_slots(&self) -> &BTreeSet<u32> {
        &self.reserved_slots
    }

    pub fn queue_count(&self) -> u32 {
        self.queue_count
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Slot to highlight at `now`, if the last toggle is recent enough.
    pub fn active_flash(&self, now: OffsetDateTime) -> Option<u32> {
        self.flash
            .filter(|flash| flash.is_active_at(now))
            .map(|flash| flash.slot)
    }

    pub fn sold_count(&self) -> u32 {
        self.selected_slots.len() as u32
    }

    pub fn marked_chases(&self) -> u32 {
        self.chase_slots.len() as u32
    }

    /// The slot numbers of the grid, `1..=bag_count`.
    pub fn numbers(&self) -> RangeInclusive<u32> {
        1..=self.bag_count
    }

    pub fn slot_in_range(&self, slot: u32) -> bool {
        (1..=self.bag_count).contains(&slot)
    }

    pub fn mark_of(&self, slot: u32) -> SlotMark {
        if self.chase_slots.contains(&slot) {
            SlotMark::Chase
        } else if self.selected_slots.contains(&slot) {
            SlotMark::Sold
        } else {
            SlotMark::Open
        }
    }
}
