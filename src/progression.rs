use crate::models::{Category, Difficulty};

/// Flat amount added to the threshold on every level-up
const LEVEL_STEP_BONUS: u64 = 25;

impl Difficulty {
    /// Award multiplier as an exact fraction (numerator, denominator)
    pub fn multiplier(&self) -> (u64, u64) {
        match self {
            Difficulty::Easy => (1, 1),
            Difficulty::Medium => (3, 2),
            Difficulty::Hard => (2, 1),
        }
    }
}

/// XP granted for completing a quest: base times the difficulty multiplier,
/// floored once after the multiply
pub fn xp_award(base_xp: u32, difficulty: Difficulty) -> u64 {
    let (num, den) = difficulty.multiplier();
    u64::from(base_xp) * num / den
}

/// Threshold for the level after one with threshold `xp_to_next`:
/// `round(xp_to_next * 1.15 + 25)`, with halves rounding up
pub fn next_threshold(xp_to_next: u64) -> u64 {
    (xp_to_next.saturating_mul(115).saturating_add(50) / 100).saturating_add(LEVEL_STEP_BONUS)
}

/// Add `xp_delta` to a category and resolve every level-up it crosses.
///
/// The loop always ends: each pass removes at least `xp_to_next` from `xp`
/// and the next threshold is never below 25.
pub fn apply_xp(category: &Category, xp_delta: u64) -> Category {
    let mut level = category.level;
    let mut xp = category.xp.saturating_add(xp_delta);
    let mut xp_to_next = category.xp_to_next;

    while xp >= xp_to_next {
        xp -= xp_to_next;
        level = level.saturating_add(1);
        xp_to_next = next_threshold(xp_to_next);
    }

    Category {
        level,
        xp,
        xp_to_next,
        ..category.clone()
    }
}
