//! Every change to a [`BagState`] goes through the operations here. Each one
//! validates first and only then writes, so a rejected call leaves the state
//! exactly as it was.

use thiserror::Error;
use time::OffsetDateTime;

use crate::prefs::PreferenceChange;
use crate::state::{
    BagState, Flash, MAX_BAG_COUNT, MAX_CHASE_COUNT, MIN_BAG_COUNT, SlotMark,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("slot {slot} does not exist; valid slots are 1..={bag_count}")]
    InvalidSlot { slot: u32, bag_count: u32 },
    #[error(
        "cannot reduce bags to {target}: selected slot(s) {} would fall outside the grid",
        join_slots(.blocking)
    )]
    WouldOrphanSelection { target: u32, blocking: Vec<u32> },
    #[error(
        "cannot reduce chases to {target}: {marked} slot(s) are already marked as chases"
    )]
    WouldOrphanChases { target: u32, marked: u32 },
    #[error("cannot reduce bags to {target}: {chase_count} chases are configured")]
    ChaseCountExceedsBags { target: u32, chase_count: u32 },
    #[error("slot {slot} cannot become a chase: every chase has already been found")]
    ChasesExhausted { slot: u32 },
}

/// The two queue buttons: releasing hands a reservation back to the open
/// bags, reserving holds one more bag for a buyer without picking a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAdjustment {
    Release,
    Reserve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueueEffect {
    /// Take one reservation off the queue if any are waiting.
    Consume,
    Keep,
    /// Hand back the reservation this slot consumed, if it consumed one.
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Transition {
    next: SlotMark,
    queue: QueueEffect,
    remaining_delta: i32,
}

/// Open -> Sold -> Chase -> Open, with the queue and chase counter effects
/// of each step.
const fn transition(current: SlotMark) -> Transition {
    match current {
        SlotMark::Open => Transition {
            next: SlotMark::Sold,
            queue: QueueEffect::Consume,
            remaining_delta: 0,
        },
        SlotMark::Sold => Transition {
            next: SlotMark::Chase,
            queue: QueueEffect::Keep,
            remaining_delta: -1,
        },
        SlotMark::Chase => Transition {
            next: SlotMark::Open,
            queue: QueueEffect::Return,
            remaining_delta: 1,
        },
    }
}

impl BagState {
    /// Cycles `slot` to its next mark using the current wall clock for the
    /// flash timestamp.
    pub fn toggle_slot(&mut self, slot: u32) -> Result<SlotMark, MutationError> {
        self.toggle_slot_at(slot, crate::time::now_utc())
    }

    pub fn toggle_slot_at(
        &mut self,
        slot: u32,
        now: OffsetDateTime,
    ) -> Result<SlotMark, MutationError> {
        if !self.slot_in_range(slot) {
            return Err(MutationError::InvalidSlot {
                slot,
                bag_count: self.bag_count,
            });
        }

        let current = self.mark_of(slot);
        let step = transition(current);
        if step.remaining_delta < 0 && self.remaining_chases == 0 {
            return Err(MutationError::ChasesExhausted { slot });
        }

        match step.next {
            SlotMark::Sold => {
                self.selected_slots.insert(slot);
            }
            SlotMark::Chase => {
                self.chase_slots.insert(slot);
            }
            SlotMark::Open => {
                self.selected_slots.remove(&slot);
                self.chase_slots.remove(&slot);
            }
        }

        self.remaining_chases = self
            .remaining_chases
            .saturating_add_signed(step.remaining_delta);
        match step.queue {
            QueueEffect::Consume => {
                if self.queue_count > 0 {
                    self.queue_count -= 1;
                    self.reserved_slots.insert(slot);
                }
            }
            QueueEffect::Keep => {}
            QueueEffect::Return => {
                if self.reserved_slots.remove(&slot) {
                    self.queue_count += 1;
                }
            }
        }

        self.flash = Some(Flash {
            slot,
            touched_at: now,
        });

        tracing::debug!(slot, mark = ?step.next, "toggled slot");
        Ok(step.next)
    }

    /// Adds `delta` bags, clamped to the allowed range. Shrinking is refused
    /// when it would strand a sold slot or leave fewer bags than chases.
    pub fn change_bag_count(&mut self, delta: i32) -> Result<u32, MutationError> {
        let target = clamp_count(self.bag_count, delta, MIN_BAG_COUNT, MAX_BAG_COUNT);

        if target < self.bag_count {
            let blocking: Vec<u32> = self
                .selected_slots
                .iter()
                .copied()
                .filter(|slot| *slot > target)
                .collect();
            if !blocking.is_empty() {
                return Err(MutationError::WouldOrphanSelection { target, blocking });
            }

            if self.chase_count > target {
                return Err(MutationError::ChaseCountExceedsBags {
                    target,
                    chase_count: self.chase_count,
                });
            }
        }

        self.bag_count = target;
        tracing::debug!(bag_count = target, "changed bag count");
        Ok(target)
    }

    /// Adds `delta` chases, clamped to `0..=min(100, bag_count)`.
    /// `remaining_chases` is recomputed from the marked chase slots rather
    /// than adjusted by `delta`.
    pub fn change_chase_count(&mut self, delta: i32) -> Result<u32, MutationError> {
        let ceiling = MAX_CHASE_COUNT.min(self.bag_count);
        let target = clamp_count(self.chase_count, delta, 0, ceiling);
        let marked = self.marked_chases();

        if delta < 0 && target < marked {
            return Err(MutationError::WouldOrphanChases { target, marked });
        }

        self.chase_count = target;
        self.remaining_chases = target.saturating_sub(marked);
        tracing::debug!(
            chase_count = target,
            remaining = self.remaining_chases,
            "changed chase count"
        );
        Ok(target)
    }

    /// Moves the queue without touching any slot mark. Releasing an empty
    /// queue is a no-op.
    pub fn change_queue(&mut self, adjustment: QueueAdjustment) -> u32 {
        match adjustment {
            QueueAdjustment::Release => {
                self.queue_count = self.queue_count.saturating_sub(1);
            }
            QueueAdjustment::Reserve => self.queue_count += 1,
        }

        tracing::debug!(queue = self.queue_count, ?adjustment, "changed queue");
        self.queue_count
    }

    pub fn change_preferences(&mut self, change: PreferenceChange) {
        self.preferences.apply(change);
    }

    pub fn clear_flash(&mut self) {
        self.flash = None;
    }
}

fn clamp_count(current: u32, delta: i32, min: u32, max: u32) -> u32 {
    (current as i64 + delta as i64).clamp(min as i64, max as i64) as u32
}

fn join_slots(slots: &[u32]) -> String {
    slots
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
