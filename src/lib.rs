pub mod achievements;
pub mod actions;
pub mod cli;
pub mod config;
pub mod database;
pub mod date;
pub mod defaults;
pub mod models;
pub mod normalize;
pub mod policy;
pub mod progression;
pub mod rank;
pub mod reconcile;
pub mod session;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use date::DateKey;
pub use models::{Achievement, Category, Difficulty, DrHistoryEntry, Quest, Snapshot};
pub use policy::{JudgmentRules, ScoringPolicy};
pub use rank::{Rank, next_rank, rank_of};
pub use reconcile::{Reconciliation, reconcile, reconcile_with};
pub use session::{Command, Outcome, Session};
pub use utils::Profile;
