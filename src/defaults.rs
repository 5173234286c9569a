use crate::achievements;
use crate::date::DateKey;
use crate::models::{Category, Difficulty, Quest, Snapshot};

/// Threshold every category starts from after a demo reset
pub const STARTING_XP_TO_NEXT: u64 = 90;

pub fn categories() -> Vec<Category> {
    vec![
        Category::new("health", "Health", 3, 40, 120),
        Category::new("money", "Money", 2, 75, 110),
        Category::new("career", "Career", 4, 10, 140),
        Category::new("social", "Social", 1, 25, 90),
        Category::new("home", "Home", 2, 15, 110),
        Category::new("fun", "Fun", 5, 60, 160),
    ]
}

pub fn quests() -> Vec<Quest> {
    vec![
        Quest::new("q1", "Workout (20 min)", "health", 25, Difficulty::Medium),
        Quest::new("q2", "Drink water (8 cups)", "health", 10, Difficulty::Easy),
        Quest::new("q3", "No impulse buys today", "money", 20, Difficulty::Easy),
        Quest::new("q4", "Apply to 1 job", "career", 30, Difficulty::Hard),
        Quest::new("q5", "Clean for 10 minutes", "home", 15, Difficulty::Easy),
        Quest::new("q6", "Text/call someone you care about", "social", 15, Difficulty::Medium),
        Quest::new("q7", "Relax guilt-free (30 min)", "fun", 10, Difficulty::Easy),
    ]
}

impl Snapshot {
    /// State for a first launch with nothing persisted
    pub fn first_run(today: DateKey) -> Self {
        Self {
            categories: categories(),
            quests: quests(),
            discipline_rating: 0,
            last_dr_delta: 0,
            last_completion_pct: 0,
            last_dr_update_date: None,
            dr_history: Vec::new(),
            achievements: achievements::catalog(),
            last_reset_date: today,
            lifetime_completed: 0,
        }
    }

    /// Factory state with every category back at level 0
    pub fn factory(today: DateKey) -> Self {
        let categories = categories()
            .into_iter()
            .map(|c| Category {
                level: 0,
                xp: 0,
                xp_to_next: STARTING_XP_TO_NEXT,
                ..c
            })
            .collect();
        Self {
            categories,
            ..Self::first_run(today)
        }
    }
}
