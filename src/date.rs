use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Format used for every date key: ISO 8601 calendar date
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// One local calendar day, printed and stored as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today's key on the host clock's local calendar (not UTC)
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// The key `n` days after this one (negative `n` walks backwards).
    /// Saturates at the ends of the representable calendar.
    pub fn add_days(&self, n: i64) -> Self {
        let shifted = Duration::try_days(n).and_then(|delta| self.0.checked_add_signed(delta));
        match shifted {
            Some(date) => Self(date),
            None if n >= 0 => Self(NaiveDate::MAX),
            None => Self(NaiveDate::MIN),
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_KEY_FORMAT))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date(s.trim()).map(Self)
    }
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, DATE_KEY_FORMAT)
}

/// Signed number of calendar days from `a` to `b`.
///
/// Both keys are plain calendar dates with no offset attached, so the
/// difference is whole days regardless of daylight-saving transitions.
pub fn day_gap(a: DateKey, b: DateKey) -> i64 {
    (b.0 - a.0).num_days()
}

/// Free-function form of [`DateKey::add_days`]
pub fn add_days(key: DateKey, n: i64) -> DateKey {
    key.add_days(n)
}
