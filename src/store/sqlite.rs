//! SQLite-backed store
//!
//! Same shape as the rest of the device stack: blocking rusqlite work runs
//! on `spawn_blocking`, each call opens a connection, runs one statement or
//! transaction, and returns. There is exactly one writer per device, so
//! atomicity only has to hold between quick successive flows; a busy
//! timeout covers the overlap window.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task;
use tracing::debug;

use super::{IdentityLedger, StatsRepository, SurveyQueue};
use crate::error::{SurveyError, SurveyResult};
use crate::gamification::EnumeratorStats;
use crate::record::{SurveyRecord, SyncStatus};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

fn open_conn(path: &Path) -> SurveyResult<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

impl SqliteStore {
    /// Open (creating if needed) the device store at `db_path`.
    pub async fn open(db_path: impl AsRef<Path>) -> SurveyResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path_clone = path.clone();
        task::spawn_blocking(move || -> SurveyResult<()> {
            let conn = open_conn(&path_clone)?;

            conn.execute(
                r#"
                CREATE TABLE IF NOT EXISTS pending_surveys (
                    position INTEGER PRIMARY KEY AUTOINCREMENT,
                    survey_id TEXT NOT NULL UNIQUE,
                    record TEXT NOT NULL,
                    sync_status TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );
                "#,
                [],
            )?;
            conn.execute(
                r#"
                CREATE TABLE IF NOT EXISTS surveyed_identities (
                    identity_number TEXT PRIMARY KEY,
                    claimed_at TEXT NOT NULL
                );
                "#,
                [],
            )?;
            conn.execute(
                r#"
                CREATE TABLE IF NOT EXISTS enumerator_stats (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    points INTEGER NOT NULL,
                    streak INTEGER NOT NULL,
                    last_survey_date TEXT
                );
                "#,
                [],
            )?;
            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_sync_status ON pending_surveys(sync_status);",
                [],
            )?;

            Ok(())
        })
        .await??;

        debug!(path = %path.display(), "survey store opened");
        Ok(Self { db_path: path })
    }
}

fn row_to_record(record_json: &str, status: &str) -> SurveyResult<SurveyRecord> {
    let mut record: SurveyRecord = serde_json::from_str(record_json)?;
    // The column is authoritative: mark_synced updates it, not the JSON.
    record.sync_status = SyncStatus::from(status);
    Ok(record)
}

fn select_records(conn: &Connection, where_clause: &str) -> SurveyResult<Vec<SurveyRecord>> {
    let sql = format!(
        "SELECT record, sync_status FROM pending_surveys {where_clause} ORDER BY position ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (json, status) = row?;
        records.push(row_to_record(&json, &status)?);
    }
    Ok(records)
}

#[async_trait]
impl SurveyQueue for SqliteStore {
    async fn enqueue(&self, record: &SurveyRecord) -> SurveyResult<u64> {
        let json = serde_json::to_string(record)?;
        let survey_id = record.survey_id.clone();
        let status = record.sync_status.as_str();
        let created_at = record.created_at.to_rfc3339();
        let path = self.db_path.clone();

        let position = task::spawn_blocking(move || -> SurveyResult<u64> {
            let conn = open_conn(&path)?;
            conn.execute(
                "INSERT INTO pending_surveys (survey_id, record, sync_status, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![&survey_id, &json, status, &created_at],
            )?;
            Ok(conn.last_insert_rowid() as u64)
        })
        .await??;

        debug!(position, "survey enqueued");
        Ok(position)
    }

    async fn all(&self) -> SurveyResult<Vec<SurveyRecord>> {
        let path = self.db_path.clone();
        task::spawn_blocking(move || {
            let conn = open_conn(&path)?;
            select_records(&conn, "")
        })
        .await?
    }

    async fn pending(&self) -> SurveyResult<Vec<SurveyRecord>> {
        let path = self.db_path.clone();
        task::spawn_blocking(move || {
            let conn = open_conn(&path)?;
            select_records(&conn, "WHERE sync_status = 'PENDING'")
        })
        .await?
    }

    async fn mark_synced(&self, survey_id: &str) -> SurveyResult<()> {
        let path = self.db_path.clone();
        let id = survey_id.to_string();
        task::spawn_blocking(move || -> SurveyResult<()> {
            let conn = open_conn(&path)?;
            conn.execute(
                "UPDATE pending_surveys SET sync_status = 'SYNCED' \
                 WHERE survey_id = ?1 AND sync_status = 'PENDING'",
                params![&id],
            )?;
            Ok(())
        })
        .await?
    }

    async fn count(&self, status: SyncStatus) -> SurveyResult<u64> {
        let path = self.db_path.clone();
        task::spawn_blocking(move || -> SurveyResult<u64> {
            let conn = open_conn(&path)?;
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM pending_surveys WHERE sync_status = ?1",
                params![status.as_str()],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await?
    }
}

#[async_trait]
impl IdentityLedger for SqliteStore {
    async fn claim(&self, number: &str) -> SurveyResult<bool> {
        let path = self.db_path.clone();
        let number = number.to_string();
        let claimed_at = chrono::Utc::now().to_rfc3339();
        task::spawn_blocking(move || -> SurveyResult<bool> {
            let conn = open_conn(&path)?;
            // Single statement: the primary key makes check-and-append atomic.
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO surveyed_identities (identity_number, claimed_at) \
                 VALUES (?1, ?2)",
                params![&number, &claimed_at],
            )?;
            Ok(inserted > 0)
        })
        .await?
    }

    async fn contains(&self, number: &str) -> SurveyResult<bool> {
        let path = self.db_path.clone();
        let number = number.to_string();
        task::spawn_blocking(move || -> SurveyResult<bool> {
            let conn = open_conn(&path)?;
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM surveyed_identities WHERE identity_number = ?1",
                    params![&number],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await?
    }
}

fn read_stats_conn(conn: &Connection) -> SurveyResult<EnumeratorStats> {
    let row: Option<(i64, i64, Option<String>)> = conn
        .query_row(
            "SELECT points, streak, last_survey_date FROM enumerator_stats WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((points, streak, last)) = row else {
        return Ok(EnumeratorStats::default());
    };

    let last_survey_date = last
        .map(|s| {
            NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map_err(|e| SurveyError::Storage(format!("bad last_survey_date: {e}")))
        })
        .transpose()?;

    Ok(EnumeratorStats {
        points: points as u64,
        streak: streak as u32,
        last_survey_date,
    })
}

#[async_trait]
impl StatsRepository for SqliteStore {
    async fn read(&self) -> SurveyResult<EnumeratorStats> {
        let path = self.db_path.clone();
        task::spawn_blocking(move || {
            let conn = open_conn(&path)?;
            read_stats_conn(&conn)
        })
        .await?
    }

    async fn compare_and_swap(
        &self,
        expected: &EnumeratorStats,
        next: &EnumeratorStats,
    ) -> SurveyResult<bool> {
        let path = self.db_path.clone();
        let expected = expected.clone();
        let next = next.clone();
        task::spawn_blocking(move || -> SurveyResult<bool> {
            let mut conn = open_conn(&path)?;
            let tx = conn.transaction()?;

            if read_stats_conn(&tx)? != expected {
                return Ok(false);
            }

            let last = next
                .last_survey_date
                .map(|d| d.format(DATE_FORMAT).to_string());
            tx.execute(
                "INSERT OR REPLACE INTO enumerator_stats (id, points, streak, last_survey_date) \
                 VALUES (1, ?1, ?2, ?3)",
                params![next.points as i64, next.streak as i64, last],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await?
    }
}
