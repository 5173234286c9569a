use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Completed quests that count as a full day
pub const DAILY_STANDARD: u32 = 7;

/// Rating change for a day with nothing done, and for every missed day
pub const MISSED_DAY_DELTA: i32 = -8;

/// Result of judging one day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayScore {
    pub pct: u8,
    pub delta: i32,
}

/// How a day's completion percentage is derived.
///
/// `Standard` measures against a fixed daily standard and ignores completions
/// beyond it. `Ratio` is the older formula that divides by the number of
/// quests on the list. The two agree at 0% and 100% only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    #[default]
    Standard,
    Ratio,
}

/// Scoring parameters handed to the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgmentRules {
    pub daily_standard: u32,
    pub policy: ScoringPolicy,
}

impl Default for JudgmentRules {
    fn default() -> Self {
        Self {
            daily_standard: DAILY_STANDARD,
            policy: ScoringPolicy::Standard,
        }
    }
}

impl JudgmentRules {
    pub fn score(&self, done: u32, total: u32) -> DayScore {
        match self.policy {
            ScoringPolicy::Standard => score_day(done, total, self.daily_standard),
            ScoringPolicy::Ratio => score_day_by_ratio(done, total),
        }
    }
}

/// `round(part / whole * 100)` with halves rounding up, clamped to 0..=100
fn rounded_percent(part: u32, whole: u32) -> u8 {
    if whole == 0 || part == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    ((part * 200 + whole) / (whole * 2)).min(100) as u8
}

/// Share of the daily standard that was met. Completions past the standard
/// do not raise the percentage.
pub fn completion_percent(done: u32, daily_standard: u32) -> u8 {
    rounded_percent(done, daily_standard)
}

/// Rating change for a completion percentage. A day with no quests at all
/// counts as a failed day.
pub fn dr_delta(pct: u8, total: u32, daily_standard: u32) -> i32 {
    if total == 0 || daily_standard == 0 {
        return MISSED_DAY_DELTA;
    }
    match pct.min(100) {
        0 => MISSED_DAY_DELTA,
        100 => 10,
        85..=99 => 7,
        60..=84 => 4,
        30..=59 => 0,
        _ => -4,
    }
}

pub fn score_day(done: u32, total: u32, daily_standard: u32) -> DayScore {
    let pct = completion_percent(done, daily_standard);
    DayScore {
        pct,
        delta: dr_delta(pct, total, daily_standard),
    }
}

/// Alternate scoring: percentage of the quests on the list
pub fn score_day_by_ratio(done: u32, total: u32) -> DayScore {
    let pct = rounded_percent(done, total);
    DayScore {
        pct,
        // the list length stands in for the standard here
        delta: dr_delta(pct, total, total),
    }
}

pub fn format_signed_delta(delta: i32) -> String {
    if delta >= 0 {
        format!("+{}", delta)
    } else {
        delta.to_string()
    }
}

/// Time left before the current day is judged, as `HH:MM`
pub fn countdown_to_midnight(now: NaiveDateTime) -> String {
    let next_midnight = now
        .date()
        .succ_opt()
        .map(|d| d.and_time(NaiveTime::MIN))
        .unwrap_or(now);
    let remaining = (next_midnight - now).num_minutes().max(0);
    format!("{:02}:{:02}", remaining / 60, remaining % 60)
}
