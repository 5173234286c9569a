//! Storage boundary: turn whatever was persisted into a well-typed
//! [`Snapshot`], substituting defaults field by field. Nothing here fails;
//! bad input is logged and replaced.

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::{Map, Value};

use crate::achievements::{self, AchievementKind};
use crate::date::DateKey;
use crate::defaults;
use crate::models::{
    Achievement, Category, DEFAULT_QUEST_XP, Difficulty, DrHistoryEntry, Quest, Snapshot, sanitize_xp,
};
use crate::progression::apply_xp;
use crate::reconcile::trim_history;

/// Parse a persisted snapshot. Unreadable JSON yields the first-run state.
pub fn snapshot_from_json(raw: &str, today: DateKey) -> Snapshot {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => snapshot_from_value(&value, today),
        Err(e) => {
            warn!("Stored state is not valid JSON ({}), starting fresh", e);
            Snapshot::first_run(today)
        }
    }
}

pub fn snapshot_from_value(value: &Value, today: DateKey) -> Snapshot {
    let Some(obj) = value.as_object() else {
        warn!("Stored state is not an object, starting fresh");
        return Snapshot::first_run(today);
    };

    let categories = non_empty_list(obj, "categories", category_from_value)
        .unwrap_or_else(defaults::categories);
    let quests = non_empty_list(obj, "quests", quest_from_value).unwrap_or_else(defaults::quests);

    let last_reset_date = date_field(obj, "lastResetDate").unwrap_or_else(|| {
        warn!("Missing or invalid lastResetDate, using {}", today);
        today
    });

    let mut dr_history: Vec<DrHistoryEntry> = match obj.get("drHistory") {
        Some(Value::Array(items)) => items.iter().filter_map(history_entry_from_value).collect(),
        _ => Vec::new(),
    };
    trim_history(&mut dr_history);

    Snapshot {
        categories,
        quests,
        discipline_rating: obj
            .get("disciplineRating")
            .and_then(Value::as_f64)
            .map(rating_from_f64)
            .unwrap_or(0),
        last_dr_delta: obj
            .get("lastDrDelta")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .map(|v| v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
            .unwrap_or(0),
        last_completion_pct: obj
            .get("lastCompletionPct")
            .and_then(Value::as_f64)
            .map(pct_from_f64)
            .unwrap_or(0),
        last_dr_update_date: date_field(obj, "lastDrUpdateDate"),
        dr_history,
        achievements: achievements_from_value(obj.get("achievements")),
        last_reset_date,
        lifetime_completed: obj
            .get("lifetimeCompleted")
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v.floor() as u64)
            .unwrap_or(0),
    }
}

/// Items of a non-empty array field that pass `parse`; `None` when the
/// field is missing, not an array, or nothing in it is usable
fn non_empty_list<T>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&Value) -> Option<T>,
) -> Option<Vec<T>> {
    let Some(Value::Array(items)) = obj.get(field) else {
        warn!("Stored {} missing, using defaults", field);
        return None;
    };
    let parsed: Vec<T> = items.iter().filter_map(parse).collect();
    if parsed.len() < items.len() {
        warn!("Dropped {} malformed {} entries", items.len() - parsed.len(), field);
    }
    if parsed.is_empty() {
        warn!("Stored {} empty, using defaults", field);
        return None;
    }
    Some(parsed)
}

fn str_field<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    obj.get(field).and_then(Value::as_str)
}

fn date_field(obj: &Map<String, Value>, field: &str) -> Option<DateKey> {
    str_field(obj, field).and_then(|s| s.parse().ok())
}

fn rating_from_f64(v: f64) -> u32 {
    if v.is_finite() {
        v.floor().clamp(0.0, u32::MAX as f64) as u32
    } else {
        0
    }
}

fn pct_from_f64(v: f64) -> u8 {
    if v.is_finite() {
        v.round().clamp(0.0, 100.0) as u8
    } else {
        0
    }
}

fn category_from_value(value: &Value) -> Option<Category> {
    let obj = value.as_object()?;
    let id = str_field(obj, "id")?.to_string();
    let name = str_field(obj, "name").map(str::to_string).unwrap_or_else(|| id.clone());
    let number = |field: &str| {
        obj.get(field)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.floor() as u64)
    };
    let xp_to_next = number("xpToNext")
        .filter(|v| *v > 0)
        .unwrap_or(defaults::STARTING_XP_TO_NEXT);
    let category = Category {
        id,
        name,
        level: number("level").map(|v| v.min(u64::from(u32::MAX)) as u32).unwrap_or(0),
        xp: number("xp").unwrap_or(0),
        xp_to_next,
    };
    // restore the level invariant if storage broke it
    Some(apply_xp(&category, 0))
}

fn quest_from_value(value: &Value) -> Option<Quest> {
    let obj = value.as_object()?;
    let id = str_field(obj, "id")?.to_string();
    let title = str_field(obj, "title")?.to_string();
    let category_id = str_field(obj, "categoryId")?.to_string();
    let xp = sanitize_xp(obj.get("xp").and_then(Value::as_f64))
        .unwrap_or(DEFAULT_QUEST_XP);
    Some(Quest {
        id,
        title,
        category_id,
        xp,
        difficulty: Difficulty::normalize(str_field(obj, "difficulty")),
        done: obj.get("done").is_some_and(truthy),
        pinned: obj.get("pinned").is_some_and(truthy),
        target: str_field(obj, "target")
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string),
    })
}

/// Loose boolean coercion for flags written by older builds
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
    }
}

/// An entry is trusted only with a string date and numeric dr, delta and pct
fn history_entry_from_value(value: &Value) -> Option<DrHistoryEntry> {
    let obj = value.as_object()?;
    let date = date_field(obj, "date")?;
    let dr = obj.get("dr").and_then(Value::as_f64)?;
    let delta = obj.get("delta").and_then(Value::as_f64)?;
    let pct = obj.get("pct").and_then(Value::as_f64)?;
    if !delta.is_finite() {
        return None;
    }
    Some(DrHistoryEntry {
        date,
        dr: rating_from_f64(dr),
        delta: delta.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32,
        pct: pct_from_f64(pct),
    })
}

/// Stored achievements keep their unlock times; catalog entries missing from
/// storage are appended locked
fn achievements_from_value(value: Option<&Value>) -> Vec<Achievement> {
    let Some(Value::Array(items)) = value else {
        return achievements::catalog();
    };
    let mut list: Vec<Achievement> = items.iter().filter_map(achievement_from_value).collect();
    for kind in AchievementKind::ALL {
        if !list.iter().any(|a| a.id == kind.id()) {
            list.push(kind.template());
        }
    }
    list
}

fn achievement_from_value(value: &Value) -> Option<Achievement> {
    let obj = value.as_object()?;
    let id = str_field(obj, "id")?;
    let template = AchievementKind::from_id(id).map(|k| k.template());
    let text = |field: &str, fallback: Option<&String>| {
        str_field(obj, field)
            .map(str::to_string)
            .or_else(|| fallback.cloned())
            .unwrap_or_default()
    };
    Some(Achievement {
        id: id.to_string(),
        name: text("name", template.as_ref().map(|t| &t.name)),
        description: text("description", template.as_ref().map(|t| &t.description)),
        icon: text("icon", template.as_ref().map(|t| &t.icon)),
        unlocked_at: str_field(obj, "unlockedAt")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
    })
}
