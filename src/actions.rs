use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::achievements::{self, Progress};
use crate::date::DateKey;
use crate::models::{DEFAULT_QUEST_XP, Quest, QuestDraft, QuestEdit, Snapshot, sanitize_xp};
use crate::policy::JudgmentRules;
use crate::progression::{apply_xp, xp_award};

/// What a quest completion produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub quest_id: String,
    pub category_id: String,
    pub xp_awarded: u64,
    pub levels_gained: u32,
    pub unlocked: Vec<String>,
}

/// Live view of today's standing before it is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayProjection {
    pub done: u32,
    pub total: u32,
    pub counted: u32, // completions that count toward the standard
    pub pct: u8,
    pub projected_delta: i32,
}

fn clean_target(target: Option<String>) -> Option<String> {
    target
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

impl Snapshot {
    /// Mark a quest done, award its XP to its category and unlock any
    /// achievements that now hold. Unknown or already-done quests are ignored.
    pub fn complete_quest(&mut self, quest_id: &str, now: DateTime<Utc>) -> Option<Completion> {
        let quest = self.quests.iter_mut().find(|q| q.id == quest_id)?;
        if quest.done {
            debug!("Quest {} already done today", quest_id);
            return None;
        }
        quest.done = true;
        let award = xp_award(quest.xp, quest.difficulty);
        let category_id = quest.category_id.clone();
        self.lifetime_completed = self.lifetime_completed.saturating_add(1);

        let mut levels_gained = 0;
        if let Some(category) = self.categories.iter_mut().find(|c| c.id == category_id) {
            let leveled = apply_xp(category, award);
            levels_gained = leveled.level - category.level;
            *category = leveled;
        }

        let unlocked = self.refresh_achievements(now);
        info!(
            "Completed {} (+{} XP to {}, {} level(s))",
            quest_id, award, category_id, levels_gained
        );

        Some(Completion {
            quest_id: quest_id.to_string(),
            category_id,
            xp_awarded: award,
            levels_gained,
            unlocked,
        })
    }

    /// Run the achievement evaluator over the current state and return the
    /// ids it unlocked
    pub fn refresh_achievements(&mut self, now: DateTime<Utc>) -> Vec<String> {
        let progress = Progress {
            quests: &self.quests,
            categories: &self.categories,
            lifetime_completed: self.lifetime_completed,
        };
        let updated = achievements::evaluate(&self.achievements, &progress, now);
        let unlocked = achievements::newly_unlocked(&self.achievements, &updated);
        for id in &unlocked {
            info!("Achievement unlocked: {}", id);
        }
        self.achievements = updated;
        unlocked
    }

    /// Append a new quest and return its id. A blank title or an unknown
    /// category leaves the list unchanged.
    pub fn add_quest(&mut self, draft: QuestDraft, now: DateTime<Utc>) -> Option<String> {
        let title = draft.title.trim();
        if title.is_empty() {
            debug!("Ignoring quest with blank title");
            return None;
        }
        if self.category(&draft.category_id).is_none() {
            debug!("Ignoring quest for unknown category {}", draft.category_id);
            return None;
        }

        let id = self.next_quest_id(now);
        let mut quest = Quest::new(
            &id,
            title,
            &draft.category_id,
            sanitize_xp(draft.xp).unwrap_or(DEFAULT_QUEST_XP),
            draft.difficulty,
        );
        quest.target = clean_target(draft.target);
        self.quests.push(quest);
        Some(id)
    }

    fn next_quest_id(&self, now: DateTime<Utc>) -> String {
        let mut stamp = now.timestamp_millis();
        loop {
            let id = format!("q{}", stamp);
            if self.quest(&id).is_none() {
                return id;
            }
            stamp += 1;
        }
    }

    /// Apply field changes to a quest. Returns false when nothing was applied:
    /// unknown quest, blank title or unknown category. Unusable XP input keeps
    /// the previous value.
    pub fn edit_quest(&mut self, quest_id: &str, edit: QuestEdit) -> bool {
        let title = match edit.title.as_deref().map(str::trim) {
            Some("") => return false,
            other => other.map(str::to_string),
        };
        if let Some(category_id) = &edit.category_id {
            if self.category(category_id).is_none() {
                return false;
            }
        }
        let Some(quest) = self.quests.iter_mut().find(|q| q.id == quest_id) else {
            return false;
        };

        if let Some(title) = title {
            quest.title = title;
        }
        if let Some(category_id) = edit.category_id {
            quest.category_id = category_id;
        }
        if let Some(xp) = sanitize_xp(edit.xp) {
            quest.xp = xp;
        }
        if let Some(difficulty) = edit.difficulty {
            quest.difficulty = difficulty;
        }
        if edit.target.is_some() {
            quest.target = clean_target(edit.target);
        }
        true
    }

    /// Remove a quest, done or not
    pub fn delete_quest(&mut self, quest_id: &str) -> bool {
        let before = self.quests.len();
        self.quests.retain(|q| q.id != quest_id);
        self.quests.len() != before
    }

    /// Flip a quest's pin and return the new state
    pub fn toggle_pin(&mut self, quest_id: &str) -> Option<bool> {
        let quest = self.quests.iter_mut().find(|q| q.id == quest_id)?;
        quest.pinned = !quest.pinned;
        Some(quest.pinned)
    }

    /// Clear every done flag and start the day over without judging it
    pub fn reset_today(&mut self, today: DateKey) {
        for quest in &mut self.quests {
            quest.done = false;
        }
        self.last_reset_date = today;
    }

    /// Fresh factory snapshot
    pub fn reset_demo(today: DateKey) -> Self {
        Self::factory(today)
    }

    /// Quests in display order: pinned first, then open before done.
    /// Ties keep their list order.
    pub fn sorted_quests(&self) -> Vec<&Quest> {
        let mut sorted: Vec<&Quest> = self.quests.iter().collect();
        sorted.sort_by_key(|q| (!q.pinned, q.done));
        sorted
    }

    /// How today would be judged if it ended now
    pub fn projection(&self, rules: &JudgmentRules) -> DayProjection {
        let done = u32::try_from(self.done_count()).unwrap_or(u32::MAX);
        let total = u32::try_from(self.quests.len()).unwrap_or(u32::MAX);
        let score = rules.score(done, total);
        DayProjection {
            done,
            total,
            counted: done.min(rules.daily_standard),
            pct: score.pct,
            projected_delta: score.delta,
        }
    }
}
