use chrono::{TimeZone, Utc};
use questlog::database::STORAGE_KEY;
use questlog::models::QuestDraft;
use questlog::{Command, Database, DateKey, Difficulty, JudgmentRules, Outcome, Session, Snapshot};

fn key(s: &str) -> DateKey {
    s.parse().expect("valid date key")
}

fn open(path: &std::path::Path, today: &str) -> Session {
    let db = Database::new(path.to_str().unwrap()).unwrap();
    Session::open(db, JudgmentRules::default(), key(today)).unwrap()
}

#[test]
fn a_week_away_is_judged_on_return() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questlog.db");
    let now = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();

    let mut session = open(&path, "2024-09-01");
    for id in ["q1", "q2", "q3", "q4", "q5", "q6"] {
        session
            .apply(Command::Complete { quest_id: id.to_string() }, now)
            .unwrap();
    }
    drop(session);

    let session = open(&path, "2024-09-08");
    let judged = session.judged_on_open();
    assert_eq!(judged.len(), 7);
    assert_eq!((judged[0].pct, judged[0].delta, judged[0].dr), (86, 7, 7));
    // 7 - 8 floors at zero and stays there
    assert!(judged[1..].iter().all(|e| e.delta == -8 && e.dr == 0));
    assert_eq!(session.snapshot().discipline_rating, 0);
    assert_eq!(session.snapshot().done_count(), 0);
}

#[test]
fn added_quests_survive_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questlog.db");
    let now = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();

    let mut session = open(&path, "2024-09-01");
    let draft = QuestDraft {
        title: "  Stretch  ".to_string(),
        category_id: "health".to_string(),
        xp: Some(12.9),
        difficulty: Difficulty::Hard,
        target: Some("10 min".to_string()),
    };
    let Outcome::Added(id) = session.apply(Command::Add(draft), now).unwrap() else {
        panic!("quest should be added");
    };
    drop(session);

    let session = open(&path, "2024-09-01");
    let quest = session.snapshot().quest(&id).expect("persisted quest");
    assert_eq!(quest.title, "Stretch");
    assert_eq!(quest.xp, 12);
    assert_eq!(quest.difficulty, Difficulty::Hard);
    assert_eq!(quest.target.as_deref(), Some("10 min"));
}

#[test]
fn partial_legacy_blob_is_filled_in() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questlog.db");
    {
        let db = Database::new(path.to_str().unwrap()).unwrap();
        db.put(
            STORAGE_KEY,
            r#"{"disciplineRating": 250, "lastResetDate": "2024-09-01",
                "quests": [{"id": "a", "title": "Walk", "categoryId": "health", "xp": 5,
                            "difficulty": "brutal", "done": "yes"}]}"#,
        )
        .unwrap();
    }

    let session = open(&path, "2024-09-01");
    let snap = session.snapshot();
    assert_eq!(snap.discipline_rating, 250);
    assert_eq!(snap.quests.len(), 1);
    assert_eq!(snap.quests[0].difficulty, Difficulty::Easy);
    assert!(snap.quests[0].done);
    assert_eq!(snap.categories.len(), 6);
    assert_eq!(snap.achievements.len(), 7);
    assert_eq!(questlog::rank_of(i64::from(snap.discipline_rating)).name(), "Focused");
}

#[test]
fn reset_demo_persists_factory_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questlog.db");
    let now = Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap();

    let mut session = open(&path, "2024-09-01");
    session
        .apply(Command::Complete { quest_id: "q1".to_string() }, now)
        .unwrap();
    session.apply(Command::ResetDemo, now).unwrap();
    drop(session);

    let session = open(&path, "2024-09-01");
    assert_eq!(session.snapshot(), &Snapshot::factory(key("2024-09-01")));
}
