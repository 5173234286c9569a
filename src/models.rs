use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::date::DateKey;

/// Base XP used when a new quest's XP input is unusable
pub const DEFAULT_QUEST_XP: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub xp: u64,
    pub xp_to_next: u64, // always > xp after a level-up pass
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub category_id: String,
    pub xp: u32, // base award before the difficulty multiplier
    pub difficulty: Difficulty,
    pub done: bool,
    pub pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>, // free-text display hint
}

/// One judged day. `dr` is the rating after `delta` was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrHistoryEntry {
    pub date: DateKey,
    pub dr: u32,
    pub delta: i32,
    pub pct: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// The full persisted aggregate: the unit of load, reconcile and save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub categories: Vec<Category>,
    pub quests: Vec<Quest>,
    pub discipline_rating: u32,
    pub last_dr_delta: i32,
    pub last_completion_pct: u8,
    pub last_dr_update_date: Option<DateKey>,
    pub dr_history: Vec<DrHistoryEntry>,
    pub achievements: Vec<Achievement>,
    pub last_reset_date: DateKey,
    #[serde(default)]
    pub lifetime_completed: u64,
}

/// User input for a new quest, before validation
#[derive(Debug, Clone, Default)]
pub struct QuestDraft {
    pub title: String,
    pub category_id: String,
    pub xp: Option<f64>, // raw numeric input; None when the field was not a number
    pub difficulty: Difficulty,
    pub target: Option<String>,
}

/// Field changes for an existing quest. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct QuestEdit {
    pub title: Option<String>,
    pub category_id: Option<String>,
    pub xp: Option<f64>,
    pub difficulty: Option<Difficulty>,
    pub target: Option<String>,
}

impl Category {
    pub fn new(id: &str, name: &str, level: u32, xp: u64, xp_to_next: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level,
            xp,
            xp_to_next,
        }
    }
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Lenient mapping used only at the storage boundary: anything that is
    /// not exactly "medium" or "hard" is treated as easy
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw {
            Some("medium") => Difficulty::Medium,
            Some("hard") => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty: {}", other)),
        }
    }
}

impl Quest {
    pub fn new(id: &str, title: &str, category_id: &str, xp: u32, difficulty: Difficulty) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            category_id: category_id.to_string(),
            xp,
            difficulty,
            done: false,
            pinned: false,
            target: None,
        }
    }
}

impl Achievement {
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }
}

impl Snapshot {
    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn done_count(&self) -> usize {
        self.quests.iter().filter(|q| q.done).count()
    }
}

/// Turn raw numeric XP input into a usable award: finite and positive
/// values are floored, anything else yields `None`
pub fn sanitize_xp(raw: Option<f64>) -> Option<u32> {
    match raw {
        Some(v) if v.is_finite() && v >= 1.0 => Some(v.floor().min(u32::MAX as f64) as u32),
        _ => None,
    }
}
