use crate::state::BagState;

/// Display values recomputed from a state snapshot after every change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRatios {
    /// Bags neither sold nor promised to a queued buyer. Goes negative when
    /// more reservations are queued than bags remain unmarked.
    pub remaining_bags: i64,
    pub remaining_chases: u32,
    pub hit_ratio_percent: f64,
    /// Every chase has been found while unsold bags are still on the grid.
    pub cooked: bool,
}

impl DerivedRatios {
    pub fn hit_ratio_label(&self) -> String {
        format!("{:.1}", self.hit_ratio_percent)
    }
}

pub fn derive_ratios(state: &BagState) -> DerivedRatios {
    let unsold = state.bag_count() - state.sold_count();
    let remaining_bags = unsold as i64 - state.queue_count() as i64;

    // Queued reservations are deliberately left out of the denominator.
    let hit_ratio_percent = if unsold == 0 {
        0.0
    } else {
        state.remaining_chases() as f64 / unsold as f64 * 100.0
    };

    DerivedRatios {
        remaining_bags,
        remaining_chases: state.remaining_chases(),
        hit_ratio_percent,
        cooked: state.remaining_chases() == 0 && state.sold_count() < state.bag_count(),
    }
}
