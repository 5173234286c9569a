use std::fmt::Write as _;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::achievements::unlocked_percent;
use crate::models::{Difficulty, DrHistoryEntry, QuestDraft, QuestEdit, Snapshot};
use crate::policy::{JudgmentRules, countdown_to_midnight, format_signed_delta};
use crate::rank::{next_rank, rank_of};
use crate::session::{Command, Outcome, Session, SessionError};

#[derive(Parser)]
#[command(name = "questlog")]
#[command(about = "Daily quests, category levels and a Discipline Rating judged at midnight")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, hide = true)]
    pub today: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show rating, today's progress and the quest list (default)
    Status,
    /// Mark a quest done
    Complete {
        /// Quest id
        id: String,
    },
    /// Add a new quest
    Add {
        /// Quest title
        title: String,
        /// Category id (health, money, career, ...)
        #[arg(long)]
        category: String,
        /// Base XP (defaults to 10)
        #[arg(long)]
        xp: Option<String>,
        /// easy, medium or hard
        #[arg(long, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,
        /// Free-form target, e.g. "20 min"
        #[arg(long)]
        target: Option<String>,
    },
    /// Change fields of an existing quest
    Edit {
        /// Quest id
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        xp: Option<String>,
        #[arg(long, value_parser = parse_difficulty)]
        difficulty: Option<Difficulty>,
        /// Empty string clears the target
        #[arg(long)]
        target: Option<String>,
    },
    /// Delete a quest
    Delete {
        /// Quest id
        id: String,
    },
    /// Pin or unpin a quest
    Pin {
        /// Quest id
        id: String,
    },
    /// Show judged days, newest first
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List achievements
    Achievements,
    /// Show the current rank and the next one
    Rank,
    /// Clear today's completions without judging the day
    ResetToday,
    /// Wipe all progress back to the factory state
    ResetDemo,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Session error: {0}")]
    SessionError(#[from] SessionError),
    #[error("Failed to parse date: {0}")]
    DateParseError(String),
    #[error("{0}")]
    NotApplied(String),
}

fn parse_difficulty(raw: &str) -> Result<Difficulty, String> {
    raw.parse()
}

fn parse_xp(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

/// Dispatch one subcommand against an open session
pub fn run(
    command: Commands,
    session: &mut Session,
    now: DateTime<Utc>,
    local_now: NaiveDateTime,
) -> Result<(), CliError> {
    match command {
        Commands::Status => print!("{}", render_status(session.snapshot(), session.rules(), local_now)),
        Commands::Complete { id } => handle_complete(id, session, now)?,
        Commands::Add {
            title,
            category,
            xp,
            difficulty,
            target,
        } => {
            let draft = QuestDraft {
                title,
                category_id: category,
                xp: parse_xp(xp),
                difficulty: difficulty.unwrap_or_default(),
                target,
            };
            handle_add(draft, session, now)?;
        }
        Commands::Edit {
            id,
            title,
            category,
            xp,
            difficulty,
            target,
        } => {
            let edit = QuestEdit {
                title,
                category_id: category,
                xp: parse_xp(xp),
                difficulty,
                target,
            };
            expect_applied(
                session.apply(Command::Edit { quest_id: id.clone(), edit }, now)?,
                &format!("Could not edit quest '{}'", id),
            )?;
            println!("Quest {} updated", id);
        }
        Commands::Delete { id } => {
            expect_applied(
                session.apply(Command::Delete { quest_id: id.clone() }, now)?,
                &format!("No quest with id '{}'", id),
            )?;
            println!("Quest {} deleted", id);
        }
        Commands::Pin { id } => {
            match session.apply(Command::TogglePin { quest_id: id.clone() }, now)? {
                Outcome::Pinned(true) => println!("Quest {} pinned", id),
                Outcome::Pinned(false) => println!("Quest {} unpinned", id),
                _ => return Err(CliError::NotApplied(format!("No quest with id '{}'", id))),
            }
        }
        Commands::History { limit } => print!("{}", render_history(&session.snapshot().dr_history, limit)),
        Commands::Achievements => print!("{}", render_achievements(session.snapshot())),
        Commands::Rank => print!("{}", render_rank(session.snapshot().discipline_rating)),
        Commands::ResetToday => {
            session.apply(Command::ResetToday, now)?;
            println!("Today's quests cleared");
        }
        Commands::ResetDemo => {
            session.apply(Command::ResetDemo, now)?;
            println!("All progress reset");
        }
    }
    Ok(())
}

fn expect_applied(outcome: Outcome, message: &str) -> Result<Outcome, CliError> {
    if outcome == Outcome::Ignored {
        Err(CliError::NotApplied(message.to_string()))
    } else {
        Ok(outcome)
    }
}

/// Handle the complete command
pub fn handle_complete(id: String, session: &mut Session, now: DateTime<Utc>) -> Result<(), CliError> {
    let outcome = session.apply(Command::Complete { quest_id: id.clone() }, now)?;
    let Outcome::Completed(completion) = outcome else {
        return Err(CliError::NotApplied(format!(
            "Quest '{}' does not exist or is already done",
            id
        )));
    };

    println!("+{} XP to {}", completion.xp_awarded, completion.category_id);
    if completion.levels_gained > 0 {
        if let Some(category) = session.snapshot().category(&completion.category_id) {
            println!("{} reached level {}", category.name, category.level);
        }
    }
    for unlocked in &completion.unlocked {
        if let Some(a) = session.snapshot().achievements.iter().find(|a| &a.id == unlocked) {
            println!("Achievement unlocked: {} {}", a.icon, a.name);
        }
    }
    Ok(())
}

/// Handle the add command
pub fn handle_add(draft: QuestDraft, session: &mut Session, now: DateTime<Utc>) -> Result<(), CliError> {
    let category = draft.category_id.clone();
    match session.apply(Command::Add(draft), now)? {
        Outcome::Added(id) => {
            println!("Quest created successfully (ID: {})", id);
            Ok(())
        }
        _ => Err(CliError::NotApplied(format!(
            "Quest needs a title and a known category (got '{}')",
            category
        ))),
    }
}

/// Lines announcing days judged while the session opened
pub fn render_judgments(judged: &[DrHistoryEntry]) -> String {
    let mut out = String::new();
    for entry in judged {
        let _ = writeln!(
            out,
            "{}: {}% -> {} DR (now {})",
            entry.date,
            entry.pct,
            format_signed_delta(entry.delta),
            entry.dr
        );
    }
    out
}

pub fn render_status(snapshot: &Snapshot, rules: &JudgmentRules, local_now: NaiveDateTime) -> String {
    let mut out = String::new();
    let rank = rank_of(i64::from(snapshot.discipline_rating));
    let _ = writeln!(
        out,
        "Discipline Rating {} ({}) | last {} at {}%",
        snapshot.discipline_rating,
        rank,
        format_signed_delta(snapshot.last_dr_delta),
        snapshot.last_completion_pct
    );

    let projection = snapshot.projection(rules);
    let _ = writeln!(
        out,
        "Today: {}/{} done, {} of {} counted, {}% -> {} | judged in {}",
        projection.done,
        projection.total,
        projection.counted,
        rules.daily_standard,
        projection.pct,
        format_signed_delta(projection.projected_delta),
        countdown_to_midnight(local_now)
    );
    out.push('\n');

    for quest in snapshot.sorted_quests() {
        let mark = if quest.done { "x" } else { " " };
        let pin = if quest.pinned { "*" } else { " " };
        let target = quest
            .target
            .as_deref()
            .map(|t| format!(" [{}]", t))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "[{}]{} {:<16} {}{} ({} xp, {}, {})",
            mark, pin, quest.id, quest.title, target, quest.xp, quest.difficulty, quest.category_id
        );
    }
    out.push('\n');

    for c in &snapshot.categories {
        let _ = writeln!(out, "{:<8} lvl {:>3}  {}/{}", c.name, c.level, c.xp, c.xp_to_next);
    }
    out
}

pub fn render_history(history: &[DrHistoryEntry], limit: usize) -> String {
    if history.is_empty() {
        return "No days judged yet\n".to_string();
    }
    let mut out = String::new();
    for entry in history.iter().rev().take(limit) {
        let _ = writeln!(
            out,
            "{}  {:>3}%  {:>4}  DR {}",
            entry.date,
            entry.pct,
            format_signed_delta(entry.delta),
            entry.dr
        );
    }
    out
}

pub fn render_achievements(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}% unlocked", unlocked_percent(&snapshot.achievements));
    for a in &snapshot.achievements {
        let state = match a.unlocked_at {
            Some(at) => format!("unlocked {}", at.format("%Y-%m-%d")),
            None => "locked".to_string(),
        };
        let _ = writeln!(out, "{} {:<16} {} ({})", a.icon, a.name, a.description, state);
    }
    out
}

pub fn render_rank(discipline_rating: u32) -> String {
    let dr = i64::from(discipline_rating);
    let current = rank_of(dr).meta();
    let mut out = format!("{} (tier {}) at {} DR\n", current.rank, current.tier, dr);
    match next_rank(dr) {
        Some(next) => {
            let _ = writeln!(out, "{} DR to {}", next.remaining_dr, next.rank);
        }
        None => out.push_str("Top rank reached\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::DateKey;
    use chrono::NaiveDate;

    fn snap() -> Snapshot {
        Snapshot::first_run(DateKey::from_ymd(2024, 5, 1).unwrap())
    }

    #[test]
    fn cli_parses_add_with_flags() {
        let cli = Cli::try_parse_from([
            "questlog", "add", "Read", "--category", "career", "--xp", "12.7", "--difficulty", "hard",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Add { title, category, xp, difficulty, target }) => {
                assert_eq!(title, "Read");
                assert_eq!(category, "career");
                assert_eq!(parse_xp(xp), Some(12.7));
                assert_eq!(difficulty, Some(Difficulty::Hard));
                assert_eq!(target, None);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn difficulty_flag_ignores_case() {
        let cli = Cli::try_parse_from([
            "questlog", "add", "Run", "--category", "health", "--difficulty", "Hard",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Add { difficulty: Some(Difficulty::Hard), .. })
        ));

        let cli = Cli::try_parse_from(["questlog", "edit", "q1", "--difficulty", "MEDIUM"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Edit { difficulty: Some(Difficulty::Medium), .. })
        ));
    }

    #[test]
    fn unknown_difficulty_is_rejected() {
        let result = Cli::try_parse_from([
            "questlog", "add", "Run", "--category", "health", "--difficulty", "hrad",
        ]);
        assert!(result.is_err());
        assert!(Cli::try_parse_from(["questlog", "edit", "q1", "--difficulty", ""]).is_err());
    }

    #[test]
    fn no_subcommand_means_status() {
        let cli = Cli::try_parse_from(["questlog", "--dev"]).unwrap();
        assert!(cli.dev);
        assert!(cli.command.is_none());
    }

    #[test]
    fn garbage_xp_is_dropped() {
        assert_eq!(parse_xp(Some("lots".to_string())), None);
        assert_eq!(parse_xp(None), None);
    }

    #[test]
    fn status_shows_rank_and_countdown() {
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(22, 15, 0)
            .unwrap();
        let out = render_status(&snap(), &JudgmentRules::default(), now);
        assert!(out.starts_with("Discipline Rating 0 (Foundation)"));
        assert!(out.contains("0/7 done"));
        assert!(out.contains("judged in 01:45"));
        assert!(out.contains("Workout (20 min)"));
    }

    #[test]
    fn history_is_newest_first() {
        let entry = |d: u32, dr: u32| DrHistoryEntry {
            date: DateKey::from_ymd(2024, 5, d).unwrap(),
            dr,
            delta: -8,
            pct: 0,
        };
        let out = render_history(&[entry(1, 92), entry(2, 84)], 10);
        let first = out.lines().next().unwrap();
        assert!(first.starts_with("2024-05-02"));
        assert!(first.contains("-8"));
        assert_eq!(render_history(&[], 5), "No days judged yet\n");
    }

    #[test]
    fn rank_reports_distance_to_next() {
        assert_eq!(render_rank(90), "Foundation (tier 1) at 90 DR\n10 DR to Consistent\n");
        assert!(render_rank(1700).ends_with("Top rank reached\n"));
    }
}
