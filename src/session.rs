use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::actions::Completion;
use crate::database::{Database, DatabaseError};
use crate::date::DateKey;
use crate::models::{DrHistoryEntry, QuestDraft, QuestEdit, Snapshot};
use crate::policy::JudgmentRules;
use crate::reconcile::reconcile_with;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
}

/// Every way the host can change the snapshot
#[derive(Debug, Clone)]
pub enum Command {
    Complete { quest_id: String },
    Add(QuestDraft),
    Edit { quest_id: String, edit: QuestEdit },
    Delete { quest_id: String },
    TogglePin { quest_id: String },
    Reconcile,
    ResetToday,
    ResetDemo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(Completion),
    Added(String),
    Edited,
    Deleted,
    Pinned(bool),
    Reconciled(Vec<DrHistoryEntry>),
    ResetToday,
    ResetDemo,
    /// The command did not apply (unknown id, blank title, ...)
    Ignored,
}

/// Sole owner of the snapshot for one user. Every change goes through
/// [`Session::apply`] and is persisted before it returns.
pub struct Session {
    db: Database,
    rules: JudgmentRules,
    today: DateKey,
    snapshot: Snapshot,
    judged_on_open: Vec<DrHistoryEntry>,
}

impl Session {
    /// Load the stored state and bring it up to `today`
    pub fn open(db: Database, rules: JudgmentRules, today: DateKey) -> Result<Self, SessionError> {
        let loaded = db.load_snapshot(today)?;
        let reconciled = reconcile_with(&loaded, today, &rules);
        db.save_snapshot(&reconciled.snapshot)?;

        Ok(Self {
            db,
            rules,
            today,
            snapshot: reconciled.snapshot,
            judged_on_open: reconciled.judgments,
        })
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn rules(&self) -> &JudgmentRules {
        &self.rules
    }

    pub fn today(&self) -> DateKey {
        self.today
    }

    /// Days judged while opening the session
    pub fn judged_on_open(&self) -> &[DrHistoryEntry] {
        &self.judged_on_open
    }

    /// Move the session's notion of today, e.g. after midnight passes
    pub fn set_today(&mut self, today: DateKey) {
        self.today = today;
    }

    pub fn apply(&mut self, command: Command, now: DateTime<Utc>) -> Result<Outcome, SessionError> {
        let snap = &mut self.snapshot;
        let outcome = match command {
            Command::Complete { quest_id } => snap
                .complete_quest(&quest_id, now)
                .map(Outcome::Completed)
                .unwrap_or(Outcome::Ignored),
            Command::Add(draft) => snap
                .add_quest(draft, now)
                .map(Outcome::Added)
                .unwrap_or(Outcome::Ignored),
            Command::Edit { quest_id, edit } => {
                if snap.edit_quest(&quest_id, edit) {
                    Outcome::Edited
                } else {
                    Outcome::Ignored
                }
            }
            Command::Delete { quest_id } => {
                if snap.delete_quest(&quest_id) {
                    Outcome::Deleted
                } else {
                    Outcome::Ignored
                }
            }
            Command::TogglePin { quest_id } => snap
                .toggle_pin(&quest_id)
                .map(Outcome::Pinned)
                .unwrap_or(Outcome::Ignored),
            Command::Reconcile => {
                let reconciled = reconcile_with(snap, self.today, &self.rules);
                *snap = reconciled.snapshot;
                Outcome::Reconciled(reconciled.judgments)
            }
            Command::ResetToday => {
                snap.reset_today(self.today);
                Outcome::ResetToday
            }
            Command::ResetDemo => {
                *snap = Snapshot::reset_demo(self.today);
                Outcome::ResetDemo
            }
        };

        if outcome != Outcome::Ignored {
            self.db.save_snapshot(&self.snapshot)?;
        } else {
            log::debug!("Command had no effect, nothing saved");
        }
        Ok(outcome)
    }

    pub fn into_database(self) -> Database {
        self.db
    }
}
