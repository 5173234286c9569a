use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

use crate::date::DateKey;
use crate::models::Snapshot;
use crate::normalize;

/// Key the snapshot blob is stored under
pub const STORAGE_KEY: &str = "lifeRpg:v1";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Failed to encode snapshot: {0}")]
    EncodeError(#[from] serde_json::Error),
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        log::debug!("Opened database at {}", db_path.display());

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Database {
            conn: Connection::open_in_memory()?,
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        // One namespaced blob per key
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key             TEXT PRIMARY KEY,
                value           TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Read the raw value stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    /// Insert or replace the value stored under `key`
    pub fn put(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, now],
        )?;
        Ok(())
    }

    /// Remove `key`; returns whether anything was stored
    pub fn delete(&self, key: &str) -> Result<bool, DatabaseError> {
        let removed = self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    /// Load the persisted snapshot, normalized for use. Nothing stored yet
    /// gives the first-run state.
    pub fn load_snapshot(&self, today: DateKey) -> Result<Snapshot, DatabaseError> {
        match self.get(STORAGE_KEY)? {
            Some(raw) => Ok(normalize::snapshot_from_json(&raw, today)),
            None => {
                log::info!("No stored state, starting with defaults");
                Ok(Snapshot::first_run(today))
            }
        }
    }

    pub fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), DatabaseError> {
        let raw = serde_json::to_string(snapshot)?;
        self.put(STORAGE_KEY, &raw)?;
        log::debug!("Saved snapshot ({} bytes)", raw.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> DateKey {
        DateKey::from_ymd(2024, 7, 1).unwrap()
    }

    #[test]
    fn kv_put_get_delete() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.get("a").unwrap(), None);
        db.put("a", "1").unwrap();
        db.put("a", "2").unwrap();
        assert_eq!(db.get("a").unwrap().as_deref(), Some("2"));
        assert!(db.delete("a").unwrap());
        assert!(!db.delete("a").unwrap());
    }

    #[test]
    fn empty_store_loads_first_run_state() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.load_snapshot(today()).unwrap(), Snapshot::first_run(today()));
    }

    #[test]
    fn snapshot_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let mut snap = Snapshot::factory(today());
        snap.discipline_rating = 77;
        snap.quests[2].pinned = true;
        db.save_snapshot(&snap).unwrap();
        assert_eq!(db.load_snapshot(today()).unwrap(), snap);
    }

    #[test]
    fn corrupt_blob_recovers() {
        let db = Database::open_in_memory().unwrap();
        db.put(STORAGE_KEY, "\u{0}garbage").unwrap();
        assert_eq!(db.load_snapshot(today()).unwrap(), Snapshot::first_run(today()));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("questlog.db");
        let db = Database::new(path.to_str().unwrap()).unwrap();
        db.save_snapshot(&Snapshot::factory(today())).unwrap();
        drop(db);

        let reopened = Database::new(path.to_str().unwrap()).unwrap();
        assert_eq!(reopened.load_snapshot(today()).unwrap(), Snapshot::factory(today()));
    }
}
