use chrono::{DateTime, Utc};

use crate::models::{Achievement, Category, Difficulty, Quest};

/// Base XP that must be earned from one day's completed quests
const CENTURY_XP: u64 = 100;
const QUEST_MASTER_COUNT: u64 = 30;
const CLIMBING_LEVEL: u32 = 5;
const BALANCED_LEVEL: u32 = 3;

/// The fixed achievement catalog. Each kind owns its unlock predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    FirstQuest,
    Climbing,
    ChallengeAccepted,
    Century,
    BalancedLife,
    Perfectionist,
    QuestMaster,
}

impl AchievementKind {
    pub const ALL: [AchievementKind; 7] = [
        AchievementKind::FirstQuest,
        AchievementKind::Climbing,
        AchievementKind::ChallengeAccepted,
        AchievementKind::Century,
        AchievementKind::BalancedLife,
        AchievementKind::Perfectionist,
        AchievementKind::QuestMaster,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            AchievementKind::FirstQuest => "first_quest",
            AchievementKind::Climbing => "level_5",
            AchievementKind::ChallengeAccepted => "hard_mode",
            AchievementKind::Century => "100_xp",
            AchievementKind::BalancedLife => "all_categories",
            AchievementKind::Perfectionist => "perfect_day",
            AchievementKind::QuestMaster => "30_quests",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Locked catalog entry for this kind
    pub fn template(&self) -> Achievement {
        let (name, description, icon) = match self {
            AchievementKind::FirstQuest => ("First Step", "Complete your first quest", "🎯"),
            AchievementKind::Climbing => ("Climbing", "Reach level 5 in any category", "📈"),
            AchievementKind::ChallengeAccepted => {
                ("Challenge Accepted", "Complete a hard difficulty quest", "⚡")
            }
            AchievementKind::Century => ("Century", "Earn 100 XP in a single day", "💯"),
            AchievementKind::BalancedLife => {
                ("Balanced Life", "Reach level 3 in all categories", "⚖️")
            }
            AchievementKind::Perfectionist => {
                ("Perfectionist", "Complete all quests in one day", "✨")
            }
            AchievementKind::QuestMaster => ("Quest Master", "Complete 30 quests total", "👑"),
        };
        Achievement {
            id: self.id().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            unlocked_at: None,
        }
    }

    pub fn is_satisfied(&self, progress: &Progress<'_>) -> bool {
        match self {
            AchievementKind::FirstQuest => progress.completed_total() >= 1,
            AchievementKind::ChallengeAccepted => progress
                .done_quests()
                .any(|q| q.difficulty == Difficulty::Hard),
            AchievementKind::Century => {
                progress.done_quests().map(|q| u64::from(q.xp)).sum::<u64>() >= CENTURY_XP
            }
            AchievementKind::Perfectionist => {
                !progress.quests.is_empty() && progress.quests.iter().all(|q| q.done)
            }
            AchievementKind::Climbing => progress
                .categories
                .iter()
                .any(|c| c.level >= CLIMBING_LEVEL),
            AchievementKind::BalancedLife => {
                !progress.categories.is_empty()
                    && progress.categories.iter().all(|c| c.level >= BALANCED_LEVEL)
            }
            AchievementKind::QuestMaster => progress.completed_total() >= QUEST_MASTER_COUNT,
        }
    }
}

/// Read-only view of the state the predicates look at
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub quests: &'a [Quest],
    pub categories: &'a [Category],
    pub lifetime_completed: u64,
}

impl<'a> Progress<'a> {
    fn done_quests(&self) -> impl Iterator<Item = &'a Quest> + 'a {
        self.quests.iter().filter(|q| q.done)
    }

    /// Lifetime completions, never less than what is done today. Snapshots
    /// written before the lifetime counter existed start it at zero.
    pub fn completed_total(&self) -> u64 {
        let today = self.done_quests().count() as u64;
        self.lifetime_completed.max(today)
    }
}

/// The full catalog, all locked
pub fn catalog() -> Vec<Achievement> {
    AchievementKind::ALL.iter().map(|k| k.template()).collect()
}

/// Unlock every locked achievement whose predicate now holds.
///
/// Already-unlocked entries are returned untouched and unknown ids never
/// unlock, so a second call on the same inputs changes nothing.
pub fn evaluate(
    achievements: &[Achievement],
    progress: &Progress<'_>,
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    achievements
        .iter()
        .map(|achievement| {
            if achievement.is_unlocked() {
                return achievement.clone();
            }
            match AchievementKind::from_id(&achievement.id) {
                Some(kind) if kind.is_satisfied(progress) => Achievement {
                    unlocked_at: Some(now),
                    ..achievement.clone()
                },
                _ => achievement.clone(),
            }
        })
        .collect()
}

/// Ids that are unlocked in `after` but were locked in `before`
pub fn newly_unlocked(before: &[Achievement], after: &[Achievement]) -> Vec<String> {
    after
        .iter()
        .filter(|a| a.is_unlocked())
        .filter(|a| {
            !before
                .iter()
                .any(|b| b.id == a.id && b.is_unlocked())
        })
        .map(|a| a.id.clone())
        .collect()
}

/// Share of the catalog unlocked, in whole percent
pub fn unlocked_percent(achievements: &[Achievement]) -> u8 {
    if achievements.is_empty() {
        return 0;
    }
    let unlocked = achievements.iter().filter(|a| a.is_unlocked()).count();
    ((unlocked * 200 + achievements.len()) / (achievements.len() * 2)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn quest(id: &str, xp: u32, difficulty: Difficulty, done: bool) -> Quest {
        Quest {
            done,
            ..Quest::new(id, id, "health", xp, difficulty)
        }
    }

    fn unlocked_ids(achievements: &[Achievement]) -> Vec<&str> {
        achievements
            .iter()
            .filter(|a| a.is_unlocked())
            .map(|a| a.id.as_str())
            .collect()
    }

    #[test]
    fn catalog_has_seven_locked_entries() {
        let all = catalog();
        assert_eq!(all.len(), 7);
        assert!(all.iter().all(|a| !a.is_unlocked()));
        for kind in AchievementKind::ALL {
            assert_eq!(AchievementKind::from_id(kind.id()), Some(kind));
        }
    }

    #[test]
    fn nothing_unlocks_on_an_idle_day() {
        let quests = vec![quest("a", 10, Difficulty::Easy, false)];
        let categories = vec![Category::new("health", "Health", 0, 0, 90)];
        let progress = Progress { quests: &quests, categories: &categories, lifetime_completed: 0 };
        assert!(unlocked_ids(&evaluate(&catalog(), &progress, at(8))).is_empty());
    }

    #[test]
    fn first_hard_quest_unlocks_several() {
        let quests = vec![
            quest("a", 60, Difficulty::Hard, true),
            quest("b", 50, Difficulty::Easy, true),
        ];
        let categories = vec![Category::new("health", "Health", 5, 0, 200)];
        let progress = Progress { quests: &quests, categories: &categories, lifetime_completed: 2 };
        let out = evaluate(&catalog(), &progress, at(8));
        let ids = unlocked_ids(&out);
        for expected in ["first_quest", "hard_mode", "100_xp", "perfect_day", "level_5", "all_categories"] {
            assert!(ids.contains(&expected), "missing {}", expected);
        }
        assert!(!ids.contains(&"30_quests"));
    }

    #[test]
    fn century_uses_base_xp_not_multiplied() {
        // 60 base on hard would be 120 awarded, but only base counts
        let quests = vec![quest("a", 60, Difficulty::Hard, true)];
        let progress = Progress { quests: &quests, categories: &[], lifetime_completed: 1 };
        assert!(!AchievementKind::Century.is_satisfied(&progress));
    }

    #[test]
    fn balanced_life_needs_categories() {
        let progress = Progress { quests: &[], categories: &[], lifetime_completed: 0 };
        assert!(!AchievementKind::BalancedLife.is_satisfied(&progress));
        assert!(!AchievementKind::Perfectionist.is_satisfied(&progress));
    }

    #[test]
    fn quest_master_reads_the_lifetime_counter() {
        let quests = vec![quest("a", 10, Difficulty::Easy, true)];
        let progress = Progress { quests: &quests, categories: &[], lifetime_completed: 30 };
        assert!(AchievementKind::QuestMaster.is_satisfied(&progress));
        let progress = Progress { lifetime_completed: 29, ..progress };
        assert!(!AchievementKind::QuestMaster.is_satisfied(&progress));
    }

    #[test]
    fn unlocks_are_monotonic_and_idempotent() {
        let quests = vec![quest("a", 10, Difficulty::Easy, true)];
        let categories = vec![Category::new("health", "Health", 1, 0, 90)];
        let progress = Progress { quests: &quests, categories: &categories, lifetime_completed: 1 };

        let first = evaluate(&catalog(), &progress, at(8));
        let second = evaluate(&first, &progress, at(9));
        assert_eq!(first, second);

        // state regresses (new day, nothing done) but the unlock stays
        let reset = vec![quest("a", 10, Difficulty::Easy, false)];
        let idle = Progress { quests: &reset, categories: &categories, lifetime_completed: 0 };
        let third = evaluate(&second, &idle, at(10));
        let first_quest = third.iter().find(|a| a.id == "first_quest").unwrap();
        assert_eq!(first_quest.unlocked_at, Some(at(8)));
    }

    #[test]
    fn unknown_ids_stay_locked() {
        let mut list = catalog();
        list.push(Achievement {
            id: "mystery".to_string(),
            name: "?".to_string(),
            description: String::new(),
            icon: String::new(),
            unlocked_at: None,
        });
        let quests = vec![quest("a", 10, Difficulty::Easy, true)];
        let progress = Progress { quests: &quests, categories: &[], lifetime_completed: 1 };
        let out = evaluate(&list, &progress, at(8));
        assert!(!out.iter().find(|a| a.id == "mystery").unwrap().is_unlocked());
    }

    #[test]
    fn reports_new_unlocks_and_percentage() {
        let quests = vec![quest("a", 10, Difficulty::Easy, true)];
        let progress = Progress { quests: &quests, categories: &[], lifetime_completed: 1 };
        let before = catalog();
        let after = evaluate(&before, &progress, at(8));
        let mut fresh = newly_unlocked(&before, &after);
        fresh.sort();
        assert_eq!(fresh, vec!["first_quest".to_string(), "perfect_day".to_string()]);
        assert!(newly_unlocked(&after, &after).is_empty());
        assert_eq!(unlocked_percent(&after), 29);
        assert_eq!(unlocked_percent(&[]), 0);
    }
}
