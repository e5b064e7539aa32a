use std::ops::RangeInclusive;

pub const MARK_SIZE_RANGE: RangeInclusive<u32> = 4..=17;
pub const FONT_SIZE_LEVELS: RangeInclusive<u32> = 0..=8;
pub const STATS_FONT_SIZE_LEVELS: RangeInclusive<u32> = 0..=3;
pub const SHIMMER_LEVELS: RangeInclusive<u32> = 0..=3;

/// Cosmetic settings stored alongside the bag state. None of these affect
/// counting; they only travel with the persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub mark_size: u32,
    pub font_size_level: u32,
    pub stats_font_size_level: u32,
    pub shimmer_level: u32,
    pub use_stone_style: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            mark_size: 4,
            font_size_level: 2,
            stats_font_size_level: 1,
            shimmer_level: 0,
            use_stone_style: false,
        }
    }
}

/// A batch of relative adjustments; `None` leaves a field alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferenceChange {
    pub mark_size: Option<i32>,
    pub font_size_level: Option<i32>,
    pub stats_font_size_level: Option<i32>,
    pub shimmer_level: Option<i32>,
    pub use_stone_style: Option<bool>,
}

impl PreferenceChange {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Preferences {
    pub fn apply(&mut self, change: PreferenceChange) {
        if let Some(delta) = change.mark_size {
            self.mark_size = step_within(self.mark_size, delta, &MARK_SIZE_RANGE);
        }
        if let Some(delta) = change.font_size_level {
            self.font_size_level = step_within(self.font_size_level, delta, &FONT_SIZE_LEVELS);
        }
        if let Some(delta) = change.stats_font_size_level {
            self.stats_font_size_level =
                step_within(self.stats_font_size_level, delta, &STATS_FONT_SIZE_LEVELS);
        }
        if let Some(delta) = change.shimmer_level {
            self.shimmer_level = step_within(self.shimmer_level, delta, &SHIMMER_LEVELS);
        }
        if let Some(value) = change.use_stone_style {
            self.use_stone_style = value;
        }
    }

    /// Pulls every level back into its range. Stored values from older
    /// records may sit outside of it.
    pub fn normalized(self) -> Self {
        Self {
            mark_size: clamp_into(self.mark_size as i64, &MARK_SIZE_RANGE),
            font_size_level: clamp_into(self.font_size_level as i64, &FONT_SIZE_LEVELS),
            stats_font_size_level: clamp_into(
                self.stats_font_size_level as i64,
                &STATS_FONT_SIZE_LEVELS,
            ),
            shimmer_level: clamp_into(self.shimmer_level as i64, &SHIMMER_LEVELS),
            use_stone_style: self.use_stone_style,
        }
    }
}

pub(crate) fn step_within(current: u32, delta: i32, range: &RangeInclusive<u32>) -> u32 {
    clamp_into(current as i64 + delta as i64, range)
}

pub(crate) fn clamp_into(value: i64, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start() as i64, *range.end() as i64) as u32
}
