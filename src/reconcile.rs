use log::{debug, info};

use crate::date::{DateKey, day_gap};
use crate::models::{DrHistoryEntry, Snapshot};
use crate::policy::{JudgmentRules, MISSED_DAY_DELTA, format_signed_delta};

/// Number of judged days kept in the rolling history
pub const HISTORY_LIMIT: usize = 30;

/// Outcome of observing a new date: the updated snapshot and the days that
/// were judged on the way, oldest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub snapshot: Snapshot,
    pub judgments: Vec<DrHistoryEntry>,
}

impl Reconciliation {
    pub fn changed(&self) -> bool {
        !self.judgments.is_empty()
    }
}

/// Apply a rating delta, flooring at zero
pub fn apply_dr_delta(rating: u32, delta: i32) -> u32 {
    (i64::from(rating) + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32
}

/// Drop the oldest entries beyond [`HISTORY_LIMIT`]
pub fn trim_history(history: &mut Vec<DrHistoryEntry>) {
    if history.len() > HISTORY_LIMIT {
        let excess = history.len() - HISTORY_LIMIT;
        history.drain(..excess);
    }
}

/// Reconcile with the default judgment rules
pub fn reconcile(snapshot: &Snapshot, today: DateKey) -> Reconciliation {
    reconcile_with(snapshot, today, &JudgmentRules::default())
}

/// Judge every calendar day that ended since `last_reset_date`.
///
/// The last observed day is scored from the quests as they stand. Each day
/// after it up to (not including) `today` was never opened and costs a flat
/// [`MISSED_DAY_DELTA`]. Quest flags are cleared for the new day; category
/// progress is kept. A `today` that is not after `last_reset_date` leaves the
/// snapshot as it is.
pub fn reconcile_with(snapshot: &Snapshot, today: DateKey, rules: &JudgmentRules) -> Reconciliation {
    let gap = day_gap(snapshot.last_reset_date, today);
    if gap < 1 {
        return Reconciliation {
            snapshot: snapshot.clone(),
            judgments: Vec::new(),
        };
    }

    let mut next = snapshot.clone();
    let mut judgments = Vec::new();
    let mut rating = next.discipline_rating;

    let done = u32::try_from(next.done_count()).unwrap_or(u32::MAX);
    let total = u32::try_from(next.quests.len()).unwrap_or(u32::MAX);
    let score = rules.score(done, total);
    rating = apply_dr_delta(rating, score.delta);
    info!(
        "Judged {}: {}/{} done, {}% -> {} DR (now {})",
        next.last_reset_date,
        done,
        total,
        score.pct,
        format_signed_delta(score.delta),
        rating
    );
    judgments.push(DrHistoryEntry {
        date: next.last_reset_date,
        dr: rating,
        delta: score.delta,
        pct: score.pct,
    });

    // Only the newest missed days can survive the history window; older ones
    // are applied in one step, which gives the same rating since the floor
    // at zero is absorbing for a constant negative delta.
    let missed = gap - 1;
    let listed = missed.min(HISTORY_LIMIT as i64);
    let folded = missed - listed;
    if folded > 0 {
        let penalty = i64::from(MISSED_DAY_DELTA).saturating_mul(folded);
        rating = (i64::from(rating) + penalty).max(0) as u32;
        debug!("Folded {} missed days outside the history window", folded);
    }
    for offset in (folded + 1)..=missed {
        rating = apply_dr_delta(rating, MISSED_DAY_DELTA);
        judgments.push(DrHistoryEntry {
            date: next.last_reset_date.add_days(offset),
            dr: rating,
            delta: MISSED_DAY_DELTA,
            pct: 0,
        });
    }
    if missed > 0 {
        info!("Missed {} day(s), DR now {}", missed, rating);
    }

    next.dr_history.extend(judgments.iter().cloned());
    trim_history(&mut next.dr_history);

    for quest in &mut next.quests {
        quest.done = false;
    }

    next.discipline_rating = rating;
    if let Some(latest) = judgments.last() {
        next.last_dr_delta = latest.delta;
        next.last_completion_pct = latest.pct;
    }
    next.last_dr_update_date = Some(today);
    next.last_reset_date = today;

    Reconciliation {
        snapshot: next,
        judgments,
    }
}
