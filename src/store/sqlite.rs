//! SQLite-backed measurement store.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::data::{MeasurementRecord, StoredProfile, UserProfile};
use crate::error::Result;
use crate::store::PersistenceGateway;

/// SQLite-backed [`PersistenceGateway`].
///
/// The connection sits behind a mutex so the store can be shared as an
/// `Arc<dyn PersistenceGateway>` across the application.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening measurement database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        Self::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT NOT NULL,
                height        INTEGER NOT NULL,
                target_weight REAL
            );
            CREATE TABLE IF NOT EXISTS measurements (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id    INTEGER NOT NULL REFERENCES users(id),
                weight     REAL NOT NULL,
                bmi        REAL NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_measurements_recent
                ON measurements(user_id, created_at DESC);",
        )?;
        debug!("Measurement schema initialized");
        Ok(())
    }
}

impl PersistenceGateway for SqliteStore {
    fn insert_measurement(
        &self,
        user_id: i64,
        weight_kg: f64,
        bmi: f64,
    ) -> Result<MeasurementRecord> {
        let created_at: DateTime<Utc> = Utc::now();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO measurements (user_id, weight, bmi, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![user_id, weight_kg, bmi, created_at],
        )?;
        let id = conn.last_insert_rowid();

        debug!("Recorded measurement {id}: {weight_kg} kg, BMI {bmi}");

        Ok(MeasurementRecord {
            id,
            user_id,
            weight_kg,
            bmi,
            created_at,
        })
    }

    fn recent_measurements(&self, user_id: i64, limit: usize) -> Result<Vec<MeasurementRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, user_id, weight, bmi, created_at
             FROM measurements
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(rusqlite::params![user_id, limit as i64], |row| {
            Ok(MeasurementRecord {
                id: row.get(0)?,
                user_id: row.get(1)?,
                weight_kg: row.get(2)?,
                bmi: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn delete_measurement(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM measurements WHERE id = ?1", [id])?;
        Ok(())
    }

    fn profile(&self) -> Result<Option<StoredProfile>> {
        let conn = self.conn.lock();
        let stored = conn
            .query_row(
                "SELECT id, name, height, target_weight FROM users LIMIT 1",
                [],
                |row| {
                    Ok(StoredProfile {
                        id: row.get(0)?,
                        profile: UserProfile {
                            name: row.get(1)?,
                            height_cm: row.get::<_, i64>(2)? as u16,
                            target_weight_kg: row.get(3)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(stored)
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<i64> {
        let conn = self.conn.lock();

        let existing: Option<i64> = conn
            .query_row("SELECT id FROM users LIMIT 1", [], |row| row.get(0))
            .optional()?;

        match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE users SET name = ?2, height = ?3, target_weight = ?4 WHERE id = ?1",
                    rusqlite::params![
                        id,
                        profile.name,
                        profile.height_cm as i64,
                        profile.target_weight_kg
                    ],
                )?;
                Ok(id)
            }
            None => {
                conn.execute(
                    "INSERT INTO users (name, height, target_weight) VALUES (?1, ?2, ?3)",
                    rusqlite::params![
                        profile.name,
                        profile.height_cm as i64,
                        profile.target_weight_kg
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            }
        }
    }
}
